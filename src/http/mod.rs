//! HTTP/1.1 protocol implementation on top of a raw byte stream.
//!
//! # Architecture
//!
//! - **`headers`**: case-insensitive header map with an incremental block parser
//! - **`parser`**: resumable request state machine and the read loop that drives it
//! - **`request`**: the parsed request
//! - **`response`**: status codes and default response headers
//! - **`writer`**: status line, headers, fixed-length and chunked bodies, trailers
//! - **`connection`**: one request/response exchange on an accepted socket
//! - **`error`**: parse and header errors
//!
//! # Parser State Machine
//!
//! ```text
//!        ┌─────────────────────┐
//!        │    Initialized      │
//!        └──────────┬──────────┘
//!                   ▼
//!        ┌─────────────────────┐
//!        │ ParsingRequestLine  │ ← wait for a full CRLF line
//!        └──────────┬──────────┘
//!                   ▼
//!        ┌─────────────────────┐
//!        │   ParsingHeaders    │ ← wait for the blank line
//!        └──────────┬──────────┘
//!                   ▼
//!        ┌─────────────────────┐
//!        │    ParsingBody      │ ← wait for Content-Length bytes
//!        └──────────┬──────────┘
//!                   ▼
//!                 Done            (any malformed input → Error)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use rawhttp::http::parser::request_from_reader;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:42069").await?;
//!     let (mut socket, _addr) = listener.accept().await?;
//!     let request = request_from_reader(&mut socket).await?;
//!     println!("{} {}", request.method(), request.target());
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod error;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
