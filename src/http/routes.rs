use axum::{routing::get, routing::post, routing::put, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn reports() -> Router<AppState> {
    Router::new()
        .route("/scams", post(handlers::create_report))
        .route("/scams/:id", get(handlers::get_report))
}

pub fn search() -> Router<AppState> {
    Router::new()
        .route("/search", get(handlers::search_reports))
        .route("/search/stats", get(handlers::search_stats))
}

pub fn moderation() -> Router<AppState> {
    Router::new()
        .route("/scams/:id/moderate", put(handlers::moderate_report))
        .route(
            "/scams/:id/verify-partner",
            post(handlers::verify_partner),
        )
}
