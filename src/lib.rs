pub mod agent;
pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod handlers;
pub mod memory_store;
pub mod middleware;
pub mod models;
pub mod sqlite_store;
pub mod store;
pub mod sync_code;
pub mod util;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use store::AccountStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AccountStore>,
    pub max_tasks_per_snapshot: usize,
}

fn authenticated_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/sync/push", post(handlers::sync::push))
        .route("/api/v1/sync/pull", get(handlers::sync::pull))
        .layer(axum_middleware::from_fn(middleware::auth::require_sync_auth))
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/accounts", post(handlers::accounts::setup))
        .route("/api/v1/accounts/login", post(handlers::accounts::login))
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health_check))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/metrics", get(handlers::admin::get_metrics))
        .layer(axum_middleware::from_fn(
            middleware::admin_auth::require_admin_token,
        ))
}

/// Build the full application router (used by main and tests).
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(authenticated_routes())
        .merge(public_routes())
        .merge(health_routes())
        .merge(admin_routes())
        .with_state(state)
}
