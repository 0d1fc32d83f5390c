//! Application layer for portshell-devserver.
//!
//! # Responsibilities
//!
//! - Deciding which headers a forwarded request and its response carry
//! - Staging the production build into `build.out_dir`
//!
//! # What does NOT belong here?
//!
//! - Opening sockets or serving HTTP (that is infrastructure)
//! - Parsing the config file (that is the domain layer)

pub mod build;
pub mod forward;

pub use build::{run_build, BuildError, BuildReport};
pub use forward::{downstream_headers, upstream_headers, HOP_BY_HOP_HEADERS};
