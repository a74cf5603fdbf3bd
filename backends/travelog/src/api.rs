pub mod auth;
pub mod cities;
pub mod comments;
pub mod form;
pub mod health;
pub mod likes;
pub mod trips;
pub mod user;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::error::AppError;

/// Numeric `:id` path segment. Rejections come back as JSON 400s instead of
/// axum's plain-text ones.
#[derive(Debug, Clone, Copy)]
pub struct Id(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for Id
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|err| AppError::bad_request(err.body_text()))?;

        raw.parse()
            .map(Id)
            .map_err(|_| AppError::bad_request(format!("invalid id {raw:?}")))
    }
}
