use crate::http::headers::Headers;

/// The first line of a request: `METHOD SP TARGET SP HTTP/1.1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// Upper-case method token, e.g. `GET`.
    pub method: String,
    /// Request target, always starting with `/`.
    pub target: String,
    /// Version number without the `HTTP/` prefix. Always `"1.1"`.
    pub http_version: String,
}

/// Represents a parsed HTTP request from a client.
///
/// Produced by [`RequestParser`](crate::http::parser::RequestParser) once it reaches the
/// `Done` state and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub request_line: RequestLine,
    pub headers: Headers,
    /// Exactly `Content-Length` bytes, or empty when the header is absent.
    pub body: Vec<u8>,
}

impl Request {
    pub fn method(&self) -> &str {
        &self.request_line.method
    }

    pub fn target(&self) -> &str {
        &self.request_line.target
    }

    /// Retrieves a header value by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Declared `Content-Length`, or 0 when the header is missing.
    ///
    /// The parser has already rejected unparsable values, so this never fails on a request
    /// it produced.
    pub fn content_length(&self) -> usize {
        self.header("Content-Length")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
}
