//! Connection-accepting server.
//!
//! [`serve`] binds a listener and spawns an accept loop; every accepted socket gets its own
//! task running a [`Connection`](crate::http::connection::Connection).

pub mod handler;
pub mod listener;

pub use handler::{Handler, HandlerError};
pub use listener::{Server, ServerOptions, serve, serve_with};
