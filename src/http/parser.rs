use crate::error::ParseError;
use crate::http::request::{Method, Request};

/// Parses a request from its head lines: the request line first, then
/// header lines. Parsing stops at the first empty line.
///
/// The request line must hold at least a method and a URI. The version
/// token is optional and unchecked.
pub fn parse_request_lines<S: AsRef<str>>(lines: &[S]) -> Result<Request, ParseError> {
    let mut lines = lines
        .iter()
        .map(AsRef::as_ref)
        .take_while(|line| !line.is_empty());

    let request_line = lines.next().ok_or(ParseError::Empty)?;
    let mut parts = request_line.split_whitespace();

    let (method, uri) = match (parts.next(), parts.next()) {
        (Some(method), Some(uri)) => (method, uri),
        _ => return Err(ParseError::MalformedRequestLine(request_line.to_string())),
    };
    let version = parts.next().unwrap_or_default();

    Ok(Request {
        method: Method::from_token(method),
        uri: uri.to_string(),
        version: version.to_string(),
        headers: lines.map(str::to_string).collect(),
    })
}

/// Parses request-head text. Lines may end in CRLF or a bare LF.
pub fn parse_request_head(text: &str) -> Result<Request, ParseError> {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    parse_request_lines(&lines)
}

/// Decodes and parses a raw head buffer.
pub fn parse_request_bytes(buf: &[u8]) -> Result<Request, ParseError> {
    let text = std::str::from_utf8(buf).map_err(|_| ParseError::Encoding)?;
    parse_request_head(text)
}

/// Returns the length of the head including its terminating blank line,
/// if the terminator is present in `buf`.
pub fn find_head_end(buf: &[u8]) -> Option<usize> {
    let crlf = buf.windows(4).position(|w| w == b"\r\n\r\n").map(|pos| pos + 4);
    let lf = buf.windows(2).position(|w| w == b"\n\n").map(|pos| pos + 2);
    match (crlf, lf) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = parse_request_head("GET / HTTP/1.0\r\nHost: example.com\r\n\r\n").unwrap();

        assert_eq!(req.method, Method::Get);
        assert_eq!(req.uri, "/");
        assert_eq!(req.headers, vec!["Host: example.com".to_string()]);
    }

    #[test]
    fn head_end_accepts_bare_newlines() {
        assert_eq!(find_head_end(b"GET / HTTP/1.0\r\n\r\nrest"), Some(18));
        assert_eq!(find_head_end(b"GET / HTTP/1.0\n\n"), Some(16));
        assert_eq!(find_head_end(b"GET / HTTP/1.0\r\n"), None);
    }
}
