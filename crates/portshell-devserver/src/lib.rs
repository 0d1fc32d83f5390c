//! portshell-devserver library crate.
//!
//! Serves the single-page application during development and stages its
//! production build, driven by a declarative `portshell.toml`.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Browser
//!    ↕  http://127.0.0.1:3001
//! [portshell-devserver]
//!   ├── domain/           ShellConfig (TOML schema), ProxyTable (path → backend)
//!   ├── application/      Header rewriting for forwarded requests, build staging
//!   └── infrastructure/
//!         ├── bind/        Strict-port listener binding
//!         └── http_server/ axum router: proxy forwarding + local files
//!    ↕  /oauth2/*, /query/*
//! Backend (http://localhost:3000)
//! ```
//!
//! # Layer rules
//!
//! - `domain` does no network I/O and has no async code.
//! - `application` depends on `domain` only (plus `http` header types).
//! - `infrastructure` depends on all other layers plus `tokio`, `axum`, and
//!   `reqwest`.

/// Domain layer: configuration and proxy routing.
pub mod domain;

/// Application layer: forwarding rules and build staging.
pub mod application;

/// Infrastructure layer: listener binding and the HTTP server.
pub mod infrastructure;
