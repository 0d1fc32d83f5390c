//! Infrastructure layer for portshell-devserver.
//!
//! All I/O lives here: binding the listener, serving files, forwarding
//! requests to the backend.
//!
//! # What does NOT belong here?
//!
//! - Proxy matching and config schema (domain layer)
//! - Header rewriting rules and build staging (application layer)
//! - CLI parsing (done in `main.rs`)

pub mod bind;
pub mod http_server;

pub use bind::{bind_listener, DevServerError};
pub use http_server::{build_router, run_server, serve};
