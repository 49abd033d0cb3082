//! Extension to content-type lookup.

/// Returns the content type for a URI, keyed on everything after the first
/// `.` in it. `/a/b.tar.gz` looks up `tar.gz`; a URI without a dot, or with
/// an unknown extension, yields `None`.
pub fn content_type_for(uri: &str) -> Option<&'static str> {
    let (_, ext) = uri.split_once('.')?;
    from_extension(ext)
}

/// Case-insensitive lookup in the `mime_guess` table.
pub fn from_extension(ext: &str) -> Option<&'static str> {
    mime_guess::from_ext(ext).first_raw()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions() {
        assert_eq!(content_type_for("/index.html"), Some("text/html"));
        assert_eq!(content_type_for("/img/logo.PNG"), Some("image/png"));
        assert_eq!(content_type_for("/docs/a.txt"), Some("text/plain"));
    }

    #[test]
    fn everything_after_first_dot_is_the_extension() {
        assert_eq!(content_type_for("/dist/app.min.js"), None);
        assert_eq!(content_type_for("/v1.2/logo.png"), None);
    }

    #[test]
    fn missing_or_unknown_extension() {
        assert_eq!(content_type_for("/README"), None);
        assert_eq!(content_type_for("/blob.qqqzz"), None);
    }
}
