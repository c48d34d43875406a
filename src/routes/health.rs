use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/info", get(info))
        .route("/live", get(live))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    store: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    store_latency_ms: Option<u64>,
    timestamp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthInfoResponse {
    service: &'static str,
    version: &'static str,
    store: &'static str,
    generator: &'static str,
    start_time: String,
    uptime: u64,
}

#[derive(Serialize)]
struct LivenessResponse {
    status: &'static str,
    timestamp: String,
    uptime: u64,
}

async fn root(State(state): State<AppState>) -> Response {
    let store = state.store();
    let started = Instant::now();
    let result = store.ping().await;

    let (status, status_code, latency) = match result {
        Ok(()) => (
            "ok",
            StatusCode::OK,
            Some(started.elapsed().as_millis() as u64),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "store health check failed");
            ("degraded", StatusCode::SERVICE_UNAVAILABLE, None)
        }
    };

    let response = HealthResponse {
        status,
        store: store.backend(),
        store_latency_ms: latency,
        timestamp: now_iso(),
    };
    (status_code, Json(response)).into_response()
}

async fn info(State(state): State<AppState>) -> Response {
    let response = HealthInfoResponse {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        store: state.store().backend(),
        generator: state.resolver().generator_name(),
        start_time: system_time_iso(state.started_at_system()),
        uptime: state.uptime_seconds(),
    };

    Json(response).into_response()
}

async fn live(State(state): State<AppState>) -> Response {
    Json(LivenessResponse {
        status: "healthy",
        timestamp: now_iso(),
        uptime: state.uptime_seconds(),
    })
    .into_response()
}

fn system_time_iso(time: std::time::SystemTime) -> String {
    let datetime: chrono::DateTime<chrono::Utc> = time.into();
    datetime.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
