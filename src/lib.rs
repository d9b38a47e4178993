//! rawhttp - HTTP/1.1 from a raw TCP stream
//!
//! Incremental request parsing, response framing (fixed-length and chunked with trailers)
//! and a one-request-per-connection server, without an HTTP library underneath.

pub mod config;
pub mod handlers;
pub mod http;
pub mod server;
