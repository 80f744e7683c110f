use axum::Router;

use crate::AppState;

mod auth;
mod error;
mod handlers;
mod routes;

pub use auth::ModeratorToken;
pub use error::AppError;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::reports())
        .merge(routes::search())
        .merge(routes::moderation());

    Router::new()
        .merge(routes::health())
        .nest("/v1", api)
        .with_state(state)
}
