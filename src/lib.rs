//! Daramg backend - classical music community service
//!
//! Library surface for the binary and the integration tests. All list
//! endpoints page with opaque cursors over the seek method; see the
//! `pagination` module.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod pagination;
pub mod services;

use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;
use crate::services::InteractionService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub interactions: Arc<InteractionService>,
}

/// Build the full application router over the given state
pub fn app_router(state: AppState) -> axum::Router {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    axum::Router::new()
        .merge(api::health::router())
        .nest("/api", api::notices::router())
        .nest("/api", api::posts::router())
        .nest("/api", api::notifications::router())
        .nest("/api", api::interactions::router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
