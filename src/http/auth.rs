use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderName;

use crate::http::AppError;
use crate::AppState;

/// Marker extractor for moderator-only routes. Authorization is rejected
/// before any handler state mutation runs.
#[derive(Debug, Clone)]
pub struct ModeratorToken;

const MODERATOR_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-moderator-token");

#[axum::async_trait]
impl FromRequestParts<AppState> for ModeratorToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let expected = state
            .moderator_token
            .as_ref()
            .ok_or_else(|| AppError::forbidden("moderator token not configured"))?;

        let provided = parts
            .headers
            .get(MODERATOR_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::forbidden("missing moderator token"))?;

        if provided != expected {
            return Err(AppError::forbidden("invalid moderator token"));
        }

        Ok(ModeratorToken)
    }
}
