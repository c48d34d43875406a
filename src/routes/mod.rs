mod contact;
mod health;
mod words;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let healthcheck_endpoint = normalize_healthcheck_endpoint(
        std::env::var("HEALTHCHECK_ENDPOINT")
            .ok()
            .as_deref()
            .unwrap_or("/health"),
    );

    let mut app = Router::new()
        .route(
            "/api/today-word",
            get(words::today_word).fallback(fallback_handler),
        )
        .route(
            "/api/word/today",
            get(words::today_word).fallback(fallback_handler),
        )
        .route(
            "/api/word/date/:date",
            get(words::word_by_date).fallback(fallback_handler),
        )
        .route(
            "/api/word/:id/quiz",
            get(words::word_quiz).fallback(fallback_handler),
        )
        .route(
            "/api/words/archive",
            get(words::archive).fallback(fallback_handler),
        )
        .route(
            "/api/contact",
            post(contact::submit).fallback(fallback_handler),
        );

    let mut health_paths = vec!["/health".to_string()];
    if healthcheck_endpoint != "/health" && healthcheck_endpoint != "/" {
        health_paths.push(healthcheck_endpoint);
    }
    for path in &health_paths {
        app = app.nest(path.as_str(), health::router());
    }

    app.fallback(fallback_handler).with_state(state)
}

fn normalize_healthcheck_endpoint(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "/health".to_string();
    }

    let with_slash = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    };

    if with_slash != "/" {
        with_slash.trim_end_matches('/').to_string()
    } else {
        "/".to_string()
    }
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Endpoint not found").into_response()
}
