pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::sessions::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/generate",
            get(handlers::handle_generate_query).post(handlers::handle_generate),
        )
        .route("/api/expand", post(handlers::handle_expand))
        .route("/api/sessions/:id", get(handlers::handle_get_session))
        .with_state(state)
}
