//! The application-facing side of the server.

use std::future::Future;

use thiserror::Error;
use tokio::io::AsyncWrite;

use crate::http::error::HeaderError;
use crate::http::request::Request;
use crate::http::response::StatusCode;
use crate::http::writer::ResponseWriter;

/// Application logic invoked once per parsed request.
///
/// A handler either writes a complete response (status line, headers and body) through the
/// writer and returns `Ok(())`, or returns a [`HandlerError`] without writing anything, in
/// which case the server writes a plain-text error response for it.
pub trait Handler: Send + Sync + 'static {
    fn handle<W>(
        &self,
        w: &mut ResponseWriter<W>,
        req: &Request,
    ) -> impl Future<Output = Result<(), HandlerError>> + Send
    where
        W: AsyncWrite + Unpin + Send;
}

/// A status code and message used to short-circuit a normal response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("status code: {status}, message = {message}")]
pub struct HandlerError {
    pub status: StatusCode,
    pub message: String,
}

impl HandlerError {
    pub fn new(status: impl Into<StatusCode>, message: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<HeaderError> for HandlerError {
    fn from(e: HeaderError) -> Self {
        HandlerError::internal(e.to_string())
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(e: std::io::Error) -> Self {
        HandlerError::internal(e.to_string())
    }
}
