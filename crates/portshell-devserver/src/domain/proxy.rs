//! Reverse-proxy routing table.
//!
//! Decides, from the request path alone, whether a request is forwarded to a
//! backend and where.  No I/O happens here; the HTTP server calls
//! [`ProxyTable::route`] and does the forwarding itself.
//!
//! # Pattern syntax
//!
//! | Pattern              | Kind   | Matches                              |
//! |----------------------|--------|--------------------------------------|
//! | `^(/oauth2\|/query)` | regex  | `/query/x`, `/oauth2/callback?c=1`   |
//! | `/api`               | prefix | `/api`, `/api/users`, `/apis`        |
//!
//! Patterns are matched against the path *and* query string, as received.

use regex::Regex;
use url::Url;

use crate::domain::config::{ConfigError, ProxyRuleConfig};

/// How a rule selects requests.
#[derive(Debug, Clone)]
pub enum PathPattern {
    /// Plain `starts_with` match.
    Prefix(String),
    /// Regular expression (the pattern began with `^`).
    Regex(Regex),
}

impl PathPattern {
    /// Parses a configured pattern.
    ///
    /// # Errors
    ///
    /// The regex compile error for a `^` pattern that is not a valid regex.
    pub fn parse(pattern: &str) -> Result<Self, regex::Error> {
        if pattern.starts_with('^') {
            Ok(PathPattern::Regex(Regex::new(pattern)?))
        } else {
            Ok(PathPattern::Prefix(pattern.to_string()))
        }
    }

    /// Whether `path_and_query` is selected by this pattern.
    pub fn matches(&self, path_and_query: &str) -> bool {
        match self {
            PathPattern::Prefix(prefix) => path_and_query.starts_with(prefix.as_str()),
            PathPattern::Regex(re) => re.is_match(path_and_query),
        }
    }
}

/// A compiled `[[server.proxy]]` rule.
#[derive(Debug, Clone)]
pub struct ProxyRule {
    source: String,
    pattern: PathPattern,
    target: Url,
    change_origin: bool,
}

impl ProxyRule {
    /// Compiles a configured rule.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidPattern`] or [`ConfigError::InvalidTarget`].
    pub fn compile(config: &ProxyRuleConfig) -> Result<Self, ConfigError> {
        let pattern =
            PathPattern::parse(&config.pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: config.pattern.clone(),
                source,
            })?;
        let target = parse_target(&config.target)?;
        Ok(Self {
            source: config.pattern.clone(),
            pattern,
            target,
            change_origin: config.change_origin,
        })
    }

    /// The pattern as written in the config.
    pub fn pattern(&self) -> &str {
        &self.source
    }

    /// The backend origin.
    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Whether the `Host` header is rewritten to the target's authority.
    pub fn change_origin(&self) -> bool {
        self.change_origin
    }
}

/// Where a matching request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRoute {
    /// Full upstream URL: target origin + original path and query.
    pub upstream: Url,
    /// `Some(authority)` when the `Host` header must be replaced.
    pub host_override: Option<String>,
    /// Pattern of the rule that matched, for logging.
    pub rule: String,
}

/// Ordered set of proxy rules.
#[derive(Debug, Clone, Default)]
pub struct ProxyTable {
    rules: Vec<ProxyRule>,
}

impl ProxyTable {
    /// Compiles every configured rule, keeping their order.
    ///
    /// # Errors
    ///
    /// The first rule that fails to compile.
    pub fn from_config(rules: &[ProxyRuleConfig]) -> Result<Self, ConfigError> {
        let rules = rules
            .iter()
            .map(ProxyRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// The compiled rules in match order.
    pub fn rules(&self) -> &[ProxyRule] {
        &self.rules
    }

    /// `true` when nothing is ever forwarded.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Finds the first rule matching `path_and_query` and builds its route.
    ///
    /// Returns `None` for requests that are served locally.
    pub fn route(&self, path_and_query: &str) -> Option<ProxyRoute> {
        let rule = self
            .rules
            .iter()
            .find(|r| r.pattern.matches(path_and_query))?;

        // Concatenate rather than `Url::join`, which would let a request for
        // `//other-host/...` switch hosts.
        let origin = rule.target.origin().ascii_serialization();
        let upstream = Url::parse(&format!("{origin}{path_and_query}")).ok()?;
        let host_override = rule.change_origin.then(|| authority(&rule.target));

        Some(ProxyRoute {
            upstream,
            host_override,
            rule: rule.source.clone(),
        })
    }
}

/// Validates that `target` is a bare `http`/`https` origin.
fn parse_target(target: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidTarget {
        target: target.to_string(),
        reason: reason.to_string(),
    };
    let url = Url::parse(target).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("must be an origin without path, query or fragment"));
    }
    Ok(url)
}

/// `host[:port]`, omitting the scheme's default port.
fn authority(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str, target: &str, change_origin: bool) -> ProxyRuleConfig {
        ProxyRuleConfig {
            pattern: pattern.to_string(),
            target: target.to_string(),
            change_origin,
        }
    }

    fn default_table() -> ProxyTable {
        ProxyTable::from_config(&[rule("^(/oauth2|/query)", "http://localhost:3000", true)])
            .unwrap()
    }

    #[test]
    fn test_query_path_is_forwarded_with_host_rewrite() {
        // Arrange
        let table = default_table();

        // Act
        let route = table.route("/query/anything").expect("must be proxied");

        // Assert
        assert_eq!(route.upstream.as_str(), "http://localhost:3000/query/anything");
        assert_eq!(route.host_override.as_deref(), Some("localhost:3000"));
        assert_eq!(route.rule, "^(/oauth2|/query)");
    }

    #[test]
    fn test_oauth2_path_keeps_query_string() {
        let route = default_table()
            .route("/oauth2/callback?code=abc&state=x%20y")
            .unwrap();
        assert_eq!(
            route.upstream.as_str(),
            "http://localhost:3000/oauth2/callback?code=abc&state=x%20y"
        );
    }

    #[test]
    fn test_asset_path_is_served_locally() {
        assert!(default_table().route("/assets/app.js").is_none());
    }

    #[test]
    fn test_anchored_regex_does_not_match_mid_path() {
        assert!(default_table().route("/static/query/x").is_none());
    }

    #[test]
    fn test_regex_without_trailing_anchor_matches_longer_segment() {
        // `^(/query)` is a prefix regex, so `/queryable` matches too.
        assert!(default_table().route("/queryable").is_some());
    }

    #[test]
    fn test_prefix_pattern() {
        let table = ProxyTable::from_config(&[rule("/api", "http://127.0.0.1:9000", false)]).unwrap();

        let route = table.route("/api/users").unwrap();

        assert_eq!(route.upstream.as_str(), "http://127.0.0.1:9000/api/users");
        assert_eq!(route.host_override, None);
        assert!(table.route("/app").is_none());
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let table = ProxyTable::from_config(&[
            rule("/api/v2", "http://v2.local:8002", false),
            rule("/api", "http://v1.local:8001", false),
        ])
        .unwrap();

        assert_eq!(
            table.route("/api/v2/items").unwrap().upstream.host_str(),
            Some("v2.local")
        );
        assert_eq!(
            table.route("/api/items").unwrap().upstream.host_str(),
            Some("v1.local")
        );
    }

    #[test]
    fn test_default_port_is_omitted_from_host_override() {
        let table = ProxyTable::from_config(&[rule("/x", "https://backend.example.test", true)])
            .unwrap();
        let route = table.route("/x").unwrap();
        assert_eq!(route.host_override.as_deref(), Some("backend.example.test"));
    }

    #[test]
    fn test_target_with_path_is_rejected() {
        let result = ProxyTable::from_config(&[rule("/x", "http://localhost:3000/base", false)]);
        assert!(matches!(result, Err(ConfigError::InvalidTarget { .. })));
    }

    #[test]
    fn test_non_http_target_is_rejected() {
        let result = ProxyTable::from_config(&[rule("/x", "ftp://localhost", false)]);
        assert!(matches!(result, Err(ConfigError::InvalidTarget { .. })));
    }

    #[test]
    fn test_unparseable_target_is_rejected() {
        let result = ProxyTable::from_config(&[rule("/x", "localhost:3000", false)]);
        assert!(matches!(result, Err(ConfigError::InvalidTarget { .. })));
    }

    #[test]
    fn test_protocol_relative_path_stays_on_target_host() {
        let table = ProxyTable::from_config(&[rule("/", "http://localhost:3000", false)]).unwrap();

        let route = table.route("//elsewhere.test/x").unwrap();

        assert_eq!(route.upstream.host_str(), Some("localhost"));
        assert_eq!(route.upstream.path(), "//elsewhere.test/x");
    }

    #[test]
    fn test_empty_table_routes_nothing() {
        let table = ProxyTable::default();
        assert!(table.is_empty());
        assert!(table.route("/query").is_none());
    }
}
