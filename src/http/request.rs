/// HTTP request methods.
///
/// Only GET and HEAD are served. Every other token, including lowercase
/// spellings of the supported ones, is folded into `Other` and answered
/// with 400 Bad Request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    Get,
    /// HEAD - Status and headers only
    Head,
    /// Anything else
    Other,
}

impl Method {
    /// Maps a request-line token onto a method.
    ///
    /// # Example
    ///
    /// ```
    /// # use liteserve::http::request::Method;
    /// assert_eq!(Method::from_token("GET"), Method::Get);
    /// assert_eq!(Method::from_token("get"), Method::Other);
    /// ```
    pub fn from_token(s: &str) -> Self {
        match s {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            _ => Method::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Other => "OTHER",
        }
    }
}

/// A parsed request head.
///
/// Header lines are kept exactly as received, in order. Nothing in the
/// serving path interprets them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The HTTP method
    pub method: Method,
    /// The request target as sent on the wire (e.g., "/index.html")
    pub uri: String,
    /// HTTP version token, empty if the client omitted it
    pub version: String,
    /// Header lines following the request line
    pub headers: Vec<String>,
}

impl Request {
    /// Stand-in for a request that could not be read or parsed. Its method
    /// is `Other`, so it is answered with 400.
    pub fn malformed() -> Self {
        Self {
            method: Method::Other,
            uri: String::new(),
            version: String::new(),
            headers: Vec::new(),
        }
    }

    /// Retrieves a header value by name, ignoring ASCII case.
    ///
    /// Lines without a colon are skipped.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim())
        })
    }

    /// The URI with any query string or fragment removed.
    pub fn path(&self) -> &str {
        let end = self.uri.find(['?', '#']).unwrap_or(self.uri.len());
        &self.uri[..end]
    }
}
