//! Header rewriting for forwarded requests.
//!
//! Pure functions: given the headers of the incoming request (or of the
//! backend's response) and the matched [`ProxyRoute`], produce the headers
//! to send on.  The HTTP server does the actual I/O.
//!
//! # What changes
//!
//! - Hop-by-hop headers (RFC 9110 §7.6.1) are connection-scoped and never
//!   forwarded, in either direction.  Neither are headers that the
//!   `Connection` header itself lists.
//! - With `change_origin`, `Host` becomes the target's authority.  Without
//!   it, the client's `Host` goes through untouched.

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

use crate::domain::proxy::ProxyRoute;

/// Connection-scoped headers stripped from both directions.
pub const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Headers to send to the backend for a request routed by `route`.
pub fn upstream_headers(incoming: &HeaderMap, route: &ProxyRoute) -> HeaderMap {
    let mut headers = strip_hop_by_hop(incoming);
    if let Some(authority) = &route.host_override {
        match HeaderValue::from_str(authority) {
            Ok(value) => {
                headers.insert(header::HOST, value);
            }
            // Authorities come from a parsed Url, so this is unreachable in
            // practice; let the client set Host from the URL instead.
            Err(_) => {
                headers.remove(header::HOST);
            }
        }
    }
    headers
}

/// Headers to return to the browser from a backend response.
pub fn downstream_headers(upstream: &HeaderMap) -> HeaderMap {
    strip_hop_by_hop(upstream)
}

fn strip_hop_by_hop(source: &HeaderMap) -> HeaderMap {
    // Extra names listed in `Connection: close, x-session-hop`.
    let listed: Vec<HeaderName> = source
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    let mut headers = source.clone();
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
    for name in listed {
        headers.remove(name);
    }
    headers
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn route(host_override: Option<&str>) -> ProxyRoute {
        ProxyRoute {
            upstream: Url::parse("http://localhost:3000/query").unwrap(),
            host_override: host_override.map(str::to_string),
            rule: "^(/oauth2|/query)".to_string(),
        }
    }

    fn incoming() -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::HOST, HeaderValue::from_static("localhost:3001"));
        h.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        h.insert(header::COOKIE, HeaderValue::from_static("session=1"));
        h.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-hop"));
        h.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        h.insert("x-hop", HeaderValue::from_static("1"));
        h
    }

    #[test]
    fn test_change_origin_rewrites_host() {
        let headers = upstream_headers(&incoming(), &route(Some("localhost:3000")));
        assert_eq!(headers.get(header::HOST).unwrap(), "localhost:3000");
    }

    #[test]
    fn test_without_change_origin_host_passes_through() {
        let headers = upstream_headers(&incoming(), &route(None));
        assert_eq!(headers.get(header::HOST).unwrap(), "localhost:3001");
    }

    #[test]
    fn test_end_to_end_headers_are_kept() {
        let headers = upstream_headers(&incoming(), &route(None));
        assert_eq!(headers.get(header::ACCEPT).unwrap(), "application/json");
        assert_eq!(headers.get(header::COOKIE).unwrap(), "session=1");
    }

    #[test]
    fn test_hop_by_hop_and_connection_listed_headers_are_stripped() {
        let headers = upstream_headers(&incoming(), &route(None));
        assert!(headers.get(header::CONNECTION).is_none());
        assert!(headers.get("keep-alive").is_none());
        assert!(headers.get("x-hop").is_none());
    }

    #[test]
    fn test_downstream_strips_transfer_encoding() {
        let mut upstream = HeaderMap::new();
        upstream.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        upstream.insert(header::SET_COOKIE, HeaderValue::from_static("a=b"));

        let headers = downstream_headers(&upstream);

        assert!(headers.get(header::TRANSFER_ENCODING).is_none());
        assert_eq!(headers.get(header::SET_COOKIE).unwrap(), "a=b");
    }
}
