//! HTTP surface — routing, admission control, and usage recording
//!
//! Every probe request follows the same pipeline: resolve the caller
//! address, check the per-caller window for known tools, dispatch to the
//! executor, then record the outcome. Rate-limited requests are answered
//! directly and never reach the executor or the usage log.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::audit::UsageLog;
use crate::config::Config;
use crate::executor::Executor;
use crate::lookup::HttpLookupClient;
use crate::probes;
use crate::rate_limit::RateLimiter;
use crate::registry::Registry;

pub struct AppState {
    pub registry: Registry,
    pub limiter: RateLimiter,
    pub executor: Executor,
    pub usage: Mutex<UsageLog>,
}

impl AppState {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let registry = Registry::with_limits(&config.limits);
        let limiter = RateLimiter::new();

        let resolver = Arc::new(probes::dns::system_resolver());
        let lookups = Arc::new(HttpLookupClient::new(&config.lookup));
        let executor = Executor::new(resolver, lookups.clone(), lookups.clone(), lookups);

        let usage = Mutex::new(UsageLog::new(&config.audit.db_path)?);

        Ok(Self {
            registry,
            limiter,
            executor,
            usage,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health-check", get(health_check))
        .route("/api/tools", get(list_tools))
        .route("/api/statistics", get(usage_statistics))
        .route("/api/:tool", post(run_tool))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>, bind: &str) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("netprobe listening on http://{bind}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

async fn run_tool(
    State(state): State<Arc<AppState>>,
    Path(tool): Path<String>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(params): Json<Value>,
) -> Response {
    let tool = tool.replace('-', "_");
    let caller = caller_address(&headers, connect_info.map(|ConnectInfo(addr)| addr));

    // Unknown tools skip admission and fall through to the executor, which
    // answers them in the standard envelope.
    if let Some(def) = state.registry.get_tool(&tool) {
        if !state
            .limiter
            .check(caller, &tool, def.max_requests, def.window_seconds)
        {
            let remaining =
                state
                    .limiter
                    .remaining(caller, &tool, def.max_requests, def.window_seconds);
            warn!("Rate limit hit: tool={tool} ip={caller}");
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({
                    "success": false,
                    "error": "Rate limit exceeded. Please try again later.",
                    "remaining_requests": remaining,
                })),
            )
                .into_response();
        }
    }

    let report = state.executor.run(&tool, params.clone()).await;
    state.usage.lock().await.record(&tool, caller, &params, &report);

    Json(report).into_response()
}

async fn usage_statistics(State(state): State<Arc<AppState>>) -> Response {
    let usage = state.usage.lock().await;
    match usage.statistics() {
        Ok(stats) => Json(json!({
            "success": true,
            "statistics": stats,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("Failed to read statistics: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": "Failed to read statistics",
                })),
            )
                .into_response()
        }
    }
}

async fn list_tools(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "success": true,
        "tools": state.registry.list_tools(),
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Caller address for rate limiting: first X-Forwarded-For entry when
/// present, otherwise the peer address.
fn caller_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> IpAddr {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse::<IpAddr>().ok())
        .or_else(|| peer.map(|addr| addr.ip()))
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<SocketAddr> {
        Some("203.0.113.9:55000".parse().unwrap())
    }

    #[test]
    fn test_caller_address_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("198.51.100.7, 10.0.0.1"),
        );
        assert_eq!(
            caller_address(&headers, peer()),
            "198.51.100.7".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_caller_address_falls_back_to_peer() {
        let headers = HeaderMap::new();
        assert_eq!(
            caller_address(&headers, peer()),
            "203.0.113.9".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_caller_address_ignores_garbage_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        assert_eq!(
            caller_address(&headers, peer()),
            "203.0.113.9".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_caller_address_unspecified_when_unknown() {
        let headers = HeaderMap::new();
        assert_eq!(
            caller_address(&headers, None),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );
    }
}
