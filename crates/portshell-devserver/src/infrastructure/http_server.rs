//! Development HTTP server: proxy forwarding and local files.
//!
//! Every request goes through one handler:
//!
//! 1. If a proxy rule matches the path, the request is forwarded to the
//!    backend and the backend's response is returned as-is (minus
//!    hop-by-hop headers).  Redirects are not followed.
//! 2. Otherwise the file is served from `root`, then from the public
//!    directory.
//! 3. Otherwise, for an extension-less `GET`/`HEAD` and with `spa_fallback`,
//!    the index entry page is served so client-side routes survive a reload.
//! 4. Otherwise `404`.
//!
//! # Concurrency
//!
//! axum runs each connection in its own Tokio task.  The state is read-only
//! and shared through `Arc`; the `reqwest::Client` inside it pools upstream
//! connections across all of them.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::application::forward::{downstream_headers, upstream_headers};
use crate::domain::config::{ConfigError, ShellConfig};
use crate::domain::proxy::{ProxyRoute, ProxyTable};
use crate::infrastructure::bind::bind_listener;

/// Largest request body buffered for forwarding.
pub const MAX_FORWARD_BODY_BYTES: usize = 32 * 1024 * 1024;

// ── State ─────────────────────────────────────────────────────────────────────

struct DevServerState {
    proxy: ProxyTable,
    static_files: ServeDir<ServeDir>,
    index_page: Option<PathBuf>,
    spa_fallback: bool,
    client: reqwest::Client,
}

type SharedState = Arc<DevServerState>;

// ── Public API ────────────────────────────────────────────────────────────────

/// Builds the router for `config`.
///
/// # Errors
///
/// [`ConfigError`] if the proxy rules do not compile.
pub fn build_router(config: &ShellConfig) -> Result<Router, ConfigError> {
    let proxy = ProxyTable::from_config(&config.server.proxy)?;

    let static_files = ServeDir::new(&config.root)
        .append_index_html_on_directories(true)
        .fallback(ServeDir::new(config.public_dir()));

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap_or_else(|e| {
            warn!("falling back to default HTTP client: {e}");
            reqwest::Client::new()
        });

    let state = Arc::new(DevServerState {
        proxy,
        static_files,
        index_page: config.index_page(),
        spa_fallback: config.server.spa_fallback,
        client,
    });

    Ok(Router::new()
        .fallback(handle_request)
        .with_state(state)
        .layer(TraceLayer::new_for_http()))
}

/// Binds the configured address and serves until `shutdown` completes.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound (including a taken port
/// under `strict_port`), the proxy rules are invalid, or the server fails.
pub async fn run_server(
    config: ShellConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = bind_listener(config.bind_addr(), config.server.strict_port)
        .await
        .context("development server could not start")?;
    serve(listener, &config, shutdown).await
}

/// Serves on an already-bound `listener` until `shutdown` completes.
///
/// # Errors
///
/// As [`run_server`], minus binding.
pub async fn serve(
    listener: TcpListener,
    config: &ShellConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let router = build_router(config).context("invalid proxy configuration")?;
    let local_addr = listener
        .local_addr()
        .context("listener has no local address")?;

    info!("dev server ready at http://{local_addr}/ (root: {})", config.root.display());
    for rule in &config.server.proxy {
        info!(
            "proxy {} → {}{}",
            rule.pattern,
            rule.target,
            if rule.change_origin { " (change origin)" } else { "" }
        );
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("dev server failed")?;

    info!("dev server stopped");
    Ok(())
}

// ── Handlers ──────────────────────────────────────────────────────────────────

async fn handle_request(State(state): State<SharedState>, request: Request) -> Response {
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    match state.proxy.route(&path_and_query) {
        Some(route) => forward(&state, route, request).await,
        None => serve_local(&state, request).await,
    }
}

async fn forward(state: &DevServerState, route: ProxyRoute, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    debug!("proxy {} {} → {} [{}]", parts.method, parts.uri, route.upstream, route.rule);

    let body = match axum::body::to_bytes(body, MAX_FORWARD_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("proxy: could not read request body for {}: {e}", parts.uri);
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
        }
    };

    let upstream = state
        .client
        .request(parts.method.clone(), route.upstream.clone())
        .headers(upstream_headers(&parts.headers, &route))
        .body(body)
        .send()
        .await;

    let upstream = match upstream {
        Ok(response) => response,
        Err(e) => {
            warn!("proxy error: {} {} → {}: {e}", parts.method, parts.uri, route.upstream);
            return bad_gateway(&route);
        }
    };

    let status = upstream.status();
    let headers = downstream_headers(upstream.headers());
    match upstream.bytes().await {
        Ok(bytes) => {
            let mut response = Response::new(Body::from(bytes));
            *response.status_mut() = status;
            *response.headers_mut() = headers;
            response
        }
        Err(e) => {
            warn!("proxy error reading response from {}: {e}", route.upstream);
            bad_gateway(&route)
        }
    }
}

fn bad_gateway(route: &ProxyRoute) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        format!("proxy target unreachable: {}", route.upstream.origin().ascii_serialization()),
    )
        .into_response()
}

async fn serve_local(state: &DevServerState, request: Request) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = match state.static_files.clone().oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    if response.status() == StatusCode::NOT_FOUND && state.spa_fallback && is_history_route(&method, &path) {
        if let Some(index) = &state.index_page {
            debug!("SPA fallback: {path} → {}", index.display());
            let mut fallback = Request::new(Body::empty());
            *fallback.method_mut() = method;
            return match ServeFile::new(index).oneshot(fallback).await {
                Ok(response) => response.into_response(),
                Err(never) => match never {},
            };
        }
    }

    response.into_response()
}

/// `GET`/`HEAD` for a path whose last segment has no file extension.
fn is_history_route(method: &Method, path: &str) -> bool {
    if method != Method::GET && method != Method::HEAD {
        return false;
    }
    let last_segment = path.rsplit('/').next().unwrap_or_default();
    !last_segment.contains('.')
}

// ── Tests ─────────────────────────────────────────────────────────────────────
