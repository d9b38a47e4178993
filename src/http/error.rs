//! Error types shared by the request parser and the header map.

use crate::http::response::StatusCode;
use thiserror::Error;

/// Errors produced while turning a byte stream into a [`Request`](crate::http::request::Request).
///
/// Every variant is terminal for the connection: a malformed stream cannot be resynchronized.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Request line is not `METHOD SP TARGET SP HTTP/1.1`.
    #[error("malformed request line")]
    MalformedRequestLine,

    /// A field line is malformed or the stream ended inside the header block.
    #[error("malformed request headers")]
    MalformedHeaders,

    /// `Content-Length` is present but not a non-negative integer.
    #[error("malformed request headers: invalid content-length")]
    InvalidContentLength,

    /// Body length does not match the declared `Content-Length`.
    #[error("malformed request body")]
    MalformedBody,

    /// The stream ended but the parser did not reach a terminal state.
    #[error("stream ended before the request was complete")]
    Incomplete,

    /// More unparsed bytes were buffered than the configured limit allows.
    #[error("request exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// Status code of the best-effort response for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::Incomplete | ParseError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Rejected input to [`Headers::set`](crate::http::headers::Headers::set) and friends.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    #[error("invalid header name: {0:?}")]
    InvalidName(String),

    #[error("invalid value for header {0:?}")]
    InvalidValue(String),
}
