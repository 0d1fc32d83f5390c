//! Project configuration (`portshell.toml`).
//!
//! [`ShellConfig`] declares how the single-page application is served during
//! development and where the production build is staged.  It is read once at
//! startup and never mutated afterwards.
//!
//! # Example
//!
//! ```toml
//! root = "."
//!
//! [entries]
//! index = "index.html"
//!
//! [server]
//! port = 3001
//! strict_port = true
//!
//! [[server.proxy]]
//! pattern = "^(/oauth2|/query)"
//! target = "http://localhost:3000"
//! change_origin = true
//!
//! [build]
//! out_dir = "dist"
//! ```
//!
//! Every key is optional.  A missing key takes the value shown above, so an
//! absent file and an empty file both describe the same project.  Set
//! `proxy = []` under `[server]` to disable proxying entirely.

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::domain::proxy::ProxyTable;

/// Errors loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// `[entries]` is empty; there is nothing to serve or build.
    #[error("at least one entry point is required")]
    NoEntries,

    /// An entry path is absolute or escapes `root`.
    #[error("entry '{name}' must be a relative path inside root: {path}")]
    InvalidEntry { name: String, path: PathBuf },

    /// `server.port` is 0.
    #[error("server.port must be between 1 and 65535")]
    InvalidPort,

    /// A proxy pattern starting with `^` is not a valid regular expression.
    #[error("invalid proxy pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A proxy target is not a bare `http`/`https` origin.
    #[error("invalid proxy target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    /// `build.out_dir` would resolve to the project root itself.
    #[error("build.out_dir must not be the project root ({0})")]
    OutDirIsRoot(PathBuf),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level project configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShellConfig {
    /// Base directory that entry pages and `build` paths are resolved from.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Logical build target name → page file, relative to `root`.
    #[serde(default = "default_entries")]
    pub entries: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub build: BuildConfig,
}

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Address the server binds to.
    #[serde(default = "default_host")]
    pub host: IpAddr,
    /// TCP port the server binds to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Fail at startup instead of trying the next port when `port` is taken.
    #[serde(default = "default_true")]
    pub strict_port: bool,
    /// Answer extension-less `GET` requests that match no file with the
    /// `index` entry page, so client-side routes survive a reload.
    #[serde(default = "default_true")]
    pub spa_fallback: bool,
    /// Forwarding rules, checked in order; the first match wins.
    #[serde(default = "default_proxy")]
    pub proxy: Vec<ProxyRuleConfig>,
}

/// One `[[server.proxy]]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProxyRuleConfig {
    /// Path pattern: a regular expression when it starts with `^`, otherwise
    /// a plain prefix.
    pub pattern: String,
    /// Backend origin, e.g. `http://localhost:3000`.
    pub target: String,
    /// Rewrite the `Host` header to the target's authority.
    #[serde(default)]
    pub change_origin: bool,
}

/// Production build settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildConfig {
    /// Output directory, relative to `root`.
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
    /// Static assets copied verbatim into `out_dir` and served at `/`.
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
    /// Remove the previous contents of `out_dir` before building.
    #[serde(default = "default_true")]
    pub empty_out_dir: bool,
}

// ── Default helpers ───────────────────────────────────────────────────────────

/// Name of the entry served at `/` and used for the SPA fallback.
pub const INDEX_ENTRY: &str = "index";

fn default_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_entries() -> BTreeMap<String, PathBuf> {
    BTreeMap::from([(INDEX_ENTRY.to_string(), PathBuf::from("index.html"))])
}
fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}
fn default_port() -> u16 {
    3001
}
fn default_true() -> bool {
    true
}
fn default_proxy() -> Vec<ProxyRuleConfig> {
    vec![ProxyRuleConfig {
        pattern: "^(/oauth2|/query)".to_string(),
        target: "http://localhost:3000".to_string(),
        change_origin: true,
    }]
}
fn default_out_dir() -> PathBuf {
    PathBuf::from("dist")
}
fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            entries: default_entries(),
            server: ServerConfig::default(),
            build: BuildConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            strict_port: true,
            spa_fallback: true,
            proxy: default_proxy(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            public_dir: default_public_dir(),
            empty_out_dir: true,
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl ShellConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML, or any validation error.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ShellConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates the file at `path`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`ShellConfig::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Like [`ShellConfig::load`], but returns the defaults when `path` does
    /// not exist.
    ///
    /// # Errors
    ///
    /// As [`ShellConfig::load`] for an existing file.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            info!("loading config from {}", path.display());
            Self::load(path)
        } else {
            info!("no config at {}; using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Checks the invariants the server and build rely on.
    ///
    /// # Errors
    ///
    /// The first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entries.is_empty() {
            return Err(ConfigError::NoEntries);
        }
        for (name, path) in &self.entries {
            if !is_inside_root(path) {
                return Err(ConfigError::InvalidEntry {
                    name: name.clone(),
                    path: path.clone(),
                });
            }
        }
        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        ProxyTable::from_config(&self.server.proxy)?;
        if normalize(&self.out_dir()) == normalize(&self.root) {
            return Err(ConfigError::OutDirIsRoot(self.out_dir()));
        }
        Ok(())
    }

    // ── Resolved paths ────────────────────────────────────────────────────────

    /// `build.out_dir` resolved against `root`.
    pub fn out_dir(&self) -> PathBuf {
        self.root.join(&self.build.out_dir)
    }

    /// `build.public_dir` resolved against `root`.
    pub fn public_dir(&self) -> PathBuf {
        self.root.join(&self.build.public_dir)
    }

    /// Entry page `name` resolved against `root`.
    pub fn entry_path(&self, name: &str) -> Option<PathBuf> {
        self.entries.get(name).map(|p| self.root.join(p))
    }

    /// The page served for `/` and for SPA fallback: the `index` entry, or
    /// the first entry by name when there is none.
    pub fn index_page(&self) -> Option<PathBuf> {
        self.entry_path(INDEX_ENTRY).or_else(|| {
            self.entries
                .values()
                .next()
                .map(|p| self.root.join(p))
        })
    }

    /// Address the development server binds to first.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }
}

/// `true` for a relative path with no `..` or root components.
fn is_inside_root(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Lexically drops `.` components so `./dist/.` and `dist` compare equal.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port_is_3001_and_strict() {
        let cfg = ShellConfig::default();
        assert_eq!(cfg.server.port, 3001);
        assert!(cfg.server.strict_port);
    }

    #[test]
    fn test_default_proxy_forwards_oauth2_and_query_with_change_origin() {
        let cfg = ShellConfig::default();
        assert_eq!(cfg.server.proxy.len(), 1);
        let rule = &cfg.server.proxy[0];
        assert_eq!(rule.pattern, "^(/oauth2|/query)");
        assert_eq!(rule.target, "http://localhost:3000");
        assert!(rule.change_origin);
    }

    #[test]
    fn test_default_entry_and_out_dir() {
        let cfg = ShellConfig::default();
        assert_eq!(cfg.entries.get("index"), Some(&PathBuf::from("index.html")));
        assert_eq!(cfg.build.out_dir, PathBuf::from("dist"));
        assert_eq!(cfg.out_dir(), PathBuf::from("./dist"));
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(ShellConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_document_equals_defaults() {
        // Arrange / Act
        let cfg = ShellConfig::from_toml_str("").unwrap();
        // Assert
        assert_eq!(cfg, ShellConfig::default());
    }

    #[test]
    fn test_partial_server_table_keeps_other_defaults() {
        let cfg = ShellConfig::from_toml_str("[server]\nport = 4000\n").unwrap();
        assert_eq!(cfg.server.port, 4000);
        assert!(cfg.server.strict_port);
        assert_eq!(cfg.server.proxy, default_proxy());
    }

    #[test]
    fn test_empty_proxy_list_disables_proxying() {
        let cfg = ShellConfig::from_toml_str("[server]\nproxy = []\n").unwrap();
        assert!(cfg.server.proxy.is_empty());
    }

    #[test]
    fn test_full_document_parses() {
        // Arrange
        let text = r#"
            root = "web"

            [entries]
            index = "index.html"
            admin = "admin/index.html"

            [server]
            host = "0.0.0.0"
            port = 8080
            strict_port = false

            [[server.proxy]]
            pattern = "/api"
            target = "http://127.0.0.1:9000"

            [[server.proxy]]
            pattern = "^/auth/.*"
            target = "https://auth.example.test"
            change_origin = true

            [build]
            out_dir = "../dist"
            empty_out_dir = false
        "#;

        // Act
        let cfg = ShellConfig::from_toml_str(text).unwrap();

        // Assert
        assert_eq!(cfg.root, PathBuf::from("web"));
        assert_eq!(cfg.entries.len(), 2);
        assert_eq!(cfg.bind_addr().to_string(), "0.0.0.0:8080");
        assert!(!cfg.server.strict_port);
        assert_eq!(cfg.server.proxy.len(), 2);
        assert!(!cfg.server.proxy[0].change_origin);
        assert_eq!(cfg.out_dir(), PathBuf::from("web/../dist"));
        assert!(!cfg.build.empty_out_dir);
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let result = ShellConfig::from_toml_str("[server\nport = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let result = ShellConfig::from_toml_str("[server]\nport = \"three thousand\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_port_zero_is_rejected() {
        let result = ShellConfig::from_toml_str("[server]\nport = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidPort)));
    }

    #[test]
    fn test_empty_entries_are_rejected() {
        let result = ShellConfig::from_toml_str("[entries]\n");
        assert!(matches!(result, Err(ConfigError::NoEntries)));
    }

    #[test]
    fn test_entry_escaping_root_is_rejected() {
        let result = ShellConfig::from_toml_str("[entries]\nindex = \"../outside.html\"\n");
        assert!(matches!(result, Err(ConfigError::InvalidEntry { .. })));
    }

    #[test]
    fn test_invalid_proxy_regex_is_rejected() {
        let text = "[[server.proxy]]\npattern = \"^(/unclosed\"\ntarget = \"http://localhost:3000\"\n";
        let result = ShellConfig::from_toml_str(text);
        assert!(matches!(result, Err(ConfigError::InvalidPattern { .. })));
    }

    #[test]
    fn test_out_dir_equal_to_root_is_rejected() {
        let result = ShellConfig::from_toml_str("[build]\nout_dir = \".\"\n");
        assert!(matches!(result, Err(ConfigError::OutDirIsRoot(_))));
    }

    #[test]
    fn test_index_page_falls_back_to_first_entry() {
        let cfg = ShellConfig::from_toml_str("[entries]\nmain = \"main.html\"\n").unwrap();
        assert_eq!(cfg.index_page(), Some(PathBuf::from("./main.html")));
    }

    #[test]
    fn test_load_or_default_without_file_returns_defaults() {
        let cfg = ShellConfig::load_or_default(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(cfg, ShellConfig::default());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = ShellConfig::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
