use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/countries", get(handlers::countries_list))
        .route("/select/{usecase}", get(handlers::select))
        .route("/api/stats", get(handlers::api_stats))
        .route("/api/selection", get(handlers::api_selection))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
