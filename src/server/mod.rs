pub mod routes;

use crate::state::AppState;
use axum::routing::{get, post};
use std::sync::Arc;

/// HTTP boundary. Handlers call the synchronous core directly.
pub fn router(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/api/price", post(routes::post_price))
        .route("/api/strategy/classify", post(routes::post_classify))
        .route("/api/risk/validate", post(routes::post_validate))
        .route("/api/gex", post(routes::post_gex))
        .route("/api/config", get(routes::get_config))
        .route("/api/counters", get(routes::get_counters))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}
