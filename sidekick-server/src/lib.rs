//! Sidekick Server - HTTP API for Code Sidekick
//!
//! Exposes login, session management, repository listing and agent runs
//! over JSON. Sessions map an opaque id to a GitHub access token; every
//! agent run resolves its token from the session store before any remote
//! call is made.

mod error;
mod oauth;
mod routes;
mod runner;
mod state;

use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::{Result, ServerError};
pub use oauth::OAuthClient;
pub use runner::{GitHubAgentRunner, GoalRunner};
pub use state::AppState;

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/login", get(routes::login))
        .route("/callback", get(routes::callback))
        .route("/session", post(routes::create_session))
        .route("/logout", post(routes::logout))
        .route("/user/repos", post(routes::user_repos))
        .route("/run-agent", post(routes::run_agent))
        .route("/run-task", post(routes::run_task))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API until Ctrl-C or SIGTERM
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let app = router(state);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(%addr, "Code Sidekick API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received SIGINT, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to register SIGTERM handler");
                let _ = ctrl_c.await;
                info!("Received SIGINT, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        info!("Received SIGINT, shutting down");
    }
}
