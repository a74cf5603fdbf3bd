use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    api::Id,
    db::{self, ensure_trip, ensure_user, TripId, UserId},
    error::{AppError, AppResult},
    utils::{
        auth::{ensure_acting_user, BearerToken},
        jwt::TokenKeys,
        storage::Uploads,
    },
};

#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    #[serde(default)]
    user_id: Option<UserId>,
}

async fn liker(
    pool: &SqlitePool,
    tokens: &TokenKeys,
    token: BearerToken,
    trip_id: TripId,
    request: LikeRequest,
) -> AppResult<UserId> {
    let Some(user_id) = request.user_id else {
        return Err(AppError::bad_request("user_id is required"));
    };

    ensure_acting_user(tokens, token, user_id)?;
    ensure_trip(pool, trip_id).await?;
    ensure_user(pool, user_id).await?;

    Ok(user_id)
}

// POST /trips/:id/like
pub async fn like_trip(
    State(pool): State<SqlitePool>,
    State(tokens): State<TokenKeys>,
    Id(trip_id): Id,
    token: BearerToken,
    Json(request): Json<LikeRequest>,
) -> AppResult<impl IntoResponse> {
    let user_id = liker(&pool, &tokens, token, trip_id, request).await?;

    db::like_trip(&pool, trip_id, user_id).await?;
    let like_count = db::like_count(&pool, trip_id).await?;

    Ok(Json(json!({ "liked": true, "like_count": like_count })))
}

// DELETE /trips/:id/like
// POST /trips/:id/unlike
pub async fn unlike_trip(
    State(pool): State<SqlitePool>,
    State(tokens): State<TokenKeys>,
    Id(trip_id): Id,
    token: BearerToken,
    Json(request): Json<LikeRequest>,
) -> AppResult<impl IntoResponse> {
    let user_id = liker(&pool, &tokens, token, trip_id, request).await?;

    db::unlike_trip(&pool, trip_id, user_id).await?;
    let like_count = db::like_count(&pool, trip_id).await?;

    Ok(Json(json!({ "liked": false, "like_count": like_count })))
}

// GET /trips/:id/likes
pub async fn get_likes(
    State(pool): State<SqlitePool>,
    State(uploads): State<Uploads>,
    Id(trip_id): Id,
) -> AppResult<impl IntoResponse> {
    ensure_trip(&pool, trip_id).await?;

    let users: Vec<_> = db::list_likers(&pool, trip_id)
        .await?
        .into_iter()
        .map(|user| user.resolve_urls(&uploads))
        .collect();

    Ok(Json(users))
}
