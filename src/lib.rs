pub mod config;
pub mod logging;
pub mod models;
pub mod progress;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::state::AppState;
use crate::store::StoreError;

pub async fn create_app(config: &Config) -> Result<axum::Router, StoreError> {
    let state = AppState::from_config(config).await?;
    Ok(app_with_state(state))
}

pub fn app_with_state(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
