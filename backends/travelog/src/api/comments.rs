use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    api::Id,
    db::{self, ensure_trip, ensure_user, UserId},
    error::{AppError, AppResult},
    utils::{
        auth::{ensure_acting_user, BearerToken},
        jwt::TokenKeys,
    },
};

const MAX_COMMENT_LEN: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct AddComment {
    #[serde(default)]
    user_id: Option<UserId>,
    #[serde(default)]
    content: Option<String>,
}

// GET /trips/:id/comments
pub async fn get_comments(
    State(pool): State<SqlitePool>,
    Id(trip_id): Id,
) -> AppResult<impl IntoResponse> {
    ensure_trip(&pool, trip_id).await?;

    let comments = db::list_comments(&pool, trip_id).await?;
    Ok(Json(comments))
}

// POST /trips/:id/comments
pub async fn create_comment(
    State(pool): State<SqlitePool>,
    State(tokens): State<TokenKeys>,
    Id(trip_id): Id,
    token: BearerToken,
    Json(comment): Json<AddComment>,
) -> AppResult<impl IntoResponse> {
    let content = comment.content.as_deref().map(str::trim).unwrap_or_default();
    let Some(user_id) = comment.user_id.filter(|_| !content.is_empty()) else {
        return Err(AppError::bad_request("user_id and content are required"));
    };
    if content.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::bad_request("comment is too long"));
    }

    ensure_acting_user(&tokens, token, user_id)?;
    ensure_trip(&pool, trip_id).await?;
    ensure_user(&pool, user_id).await?;

    let comment = db::insert_comment(&pool, trip_id, user_id, content).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

// DELETE /comments/:id
pub async fn delete_comment(
    State(pool): State<SqlitePool>,
    State(tokens): State<TokenKeys>,
    Id(comment_id): Id,
    token: BearerToken,
) -> AppResult<impl IntoResponse> {
    let author_id = db::comment_author(&pool, comment_id).await?;
    ensure_acting_user(&tokens, token, author_id)?;

    db::delete_comment(&pool, comment_id).await?;
    Ok(Json(json!({ "message": "Comment deleted" })))
}
