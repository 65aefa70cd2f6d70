use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tower_http::timeout::TimeoutLayer;

use crate::handlers;
use crate::session::SessionRegistry;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state.
///
/// Registries are per-channel and owned here by the top-level composition;
/// nothing reads them from ambient global state.
#[derive(Clone)]
pub struct AppState {
    pub telegram: SessionRegistry,
}

// ============================================================================
// Server Setup
// ============================================================================

pub fn build_app(state: AppState, bot_token: &str, request_timeout_seconds: u64) -> Router {
    // The webhook path is the bot token, mirroring Telegram's own
    // recommendation: unguessable, so no extra auth on the route.
    let webhook = Router::new()
        .route(&format!("/{bot_token}/"), post(handlers::telegram::webhook))
        .with_state(state.clone())
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )));

    Router::new()
        .route("/livez", get(handlers::livez))
        .route("/readyz", get(handlers::readyz))
        .route("/version", get(handlers::version))
        .with_state(state)
        .merge(webhook)
}
