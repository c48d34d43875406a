use std::net::SocketAddr;

use daily_word_backend::config::Config;
use daily_word_backend::logging::init_tracing;
use daily_word_backend::state::AppState;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = init_tracing(&config.log_level);

    let state = match AppState::from_config(&config).await {
        Ok(state) => state,
        Err(err) => {
            tracing::error!(error = %err, "failed to open word store");
            std::process::exit(1);
        }
    };

    let app = daily_word_backend::app_with_state(state);

    let addr = config.bind_addr();
    tracing::info!(%addr, "daily word backend listening");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%addr, error = %err, "bind listener failed");
            std::process::exit(1);
        }
    };

    let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!("graceful shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
