//! Domain layer for portshell-devserver.
//!
//! Pure types: the project configuration and the proxy routing table.  No
//! sockets, no async runtime; file reads happen only in
//! [`ShellConfig::load`].

pub mod config;
pub mod proxy;

pub use config::{BuildConfig, ConfigError, ProxyRuleConfig, ServerConfig, ShellConfig};
pub use proxy::{PathPattern, ProxyRoute, ProxyRule, ProxyTable};
