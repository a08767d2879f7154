//! Redraft command-line client
//!
//! Talks to a running Redraft server over its SSE endpoints and drives the
//! analyze then rewrite flow with the shared phase controller.

pub mod client;
pub mod render;
pub mod session;

pub use client::ServerClient;
pub use session::Session;
