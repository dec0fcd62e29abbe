pub mod auth;
pub mod error;
pub mod handlers;
pub mod reqlog;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{delete, get};
use tower_http::trace::TraceLayer;

use crate::engine::Engine;

pub use auth::TokenStore;
pub use reqlog::RequestLog;

/// Shared handler state, constructed once at startup and injected — no
/// ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub requests: Arc<RequestLog>,
    pub tokens: Arc<TokenStore>,
}

pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route(
            "/requests",
            get(handlers::admin_list_requests).delete(handlers::admin_clear_requests),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ping", get(handlers::ping))
        .route(
            "/api/rooms",
            get(handlers::list_rooms).post(handlers::create_room),
        )
        .route("/api/rooms/:id", delete(handlers::delete_room))
        .route(
            "/api/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route("/api/users/:id", delete(handlers::delete_user))
        .route(
            "/api/bookings",
            get(handlers::list_bookings).post(handlers::create_booking),
        )
        .route("/api/bookings/:id", delete(handlers::delete_booking))
        .nest("/admin", admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
