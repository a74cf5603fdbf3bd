use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    api::{form::FormData, Id},
    db::{self, ensure_user, UserId},
    error::{AppError, AppResult},
    utils::{
        auth::{ensure_acting_user, BearerToken},
        jwt::TokenKeys,
        storage::{filename_from_url, Uploads},
    },
};

const AVATAR_FIELDS: &[&str] = &["photo", "file", "avatar"];

#[derive(Debug, Deserialize)]
pub struct FollowTarget {
    #[serde(default)]
    target_user_id: Option<UserId>,
}

// GET /users
pub async fn get_users(
    State(pool): State<SqlitePool>,
    State(uploads): State<Uploads>,
) -> AppResult<impl IntoResponse> {
    let users: Vec<_> = db::list_users(&pool)
        .await?
        .into_iter()
        .map(|user| user.resolve_urls(&uploads))
        .collect();

    Ok(Json(users))
}

// GET /users/:id
pub async fn get_user(
    State(pool): State<SqlitePool>,
    State(uploads): State<Uploads>,
    Id(user_id): Id,
) -> AppResult<impl IntoResponse> {
    let user = db::get_user(&pool, user_id).await?.resolve_urls(&uploads);
    Ok(Json(user))
}

// GET /users/:id/followers
pub async fn get_followers(
    State(pool): State<SqlitePool>,
    State(uploads): State<Uploads>,
    Id(user_id): Id,
) -> AppResult<impl IntoResponse> {
    ensure_user(&pool, user_id).await?;

    let followers: Vec<_> = db::list_followers(&pool, user_id)
        .await?
        .into_iter()
        .map(|user| user.resolve_urls(&uploads))
        .collect();

    Ok(Json(followers))
}

// GET /users/:id/following
pub async fn get_following(
    State(pool): State<SqlitePool>,
    State(uploads): State<Uploads>,
    Id(user_id): Id,
) -> AppResult<impl IntoResponse> {
    ensure_user(&pool, user_id).await?;

    let following: Vec<_> = db::list_following(&pool, user_id)
        .await?
        .into_iter()
        .map(|user| user.resolve_urls(&uploads))
        .collect();

    Ok(Json(following))
}

async fn follow_target(
    pool: &SqlitePool,
    follower_id: UserId,
    target: FollowTarget,
) -> AppResult<UserId> {
    let Some(followed_id) = target.target_user_id else {
        return Err(AppError::bad_request("target_user_id is required"));
    };

    if followed_id == follower_id {
        return Err(AppError::bad_request("users can't follow themselves"));
    }

    ensure_user(pool, follower_id).await?;
    ensure_user(pool, followed_id).await?;

    Ok(followed_id)
}

// POST /users/:id/follow
pub async fn follow_user(
    State(pool): State<SqlitePool>,
    State(tokens): State<TokenKeys>,
    Id(follower_id): Id,
    token: BearerToken,
    Json(target): Json<FollowTarget>,
) -> AppResult<impl IntoResponse> {
    ensure_acting_user(&tokens, token, follower_id)?;
    let followed_id = follow_target(&pool, follower_id, target).await?;

    let created = db::follow_user(&pool, follower_id, followed_id).await?;
    if created {
        tracing::info!(follower_id, followed_id, "user followed");
    }

    Ok(Json(json!({
        "message": if created { "Followed" } else { "Already following" },
        "following": true,
    })))
}

// POST /users/:id/unfollow
pub async fn unfollow_user(
    State(pool): State<SqlitePool>,
    State(tokens): State<TokenKeys>,
    Id(follower_id): Id,
    token: BearerToken,
    Json(target): Json<FollowTarget>,
) -> AppResult<impl IntoResponse> {
    ensure_acting_user(&tokens, token, follower_id)?;
    let followed_id = follow_target(&pool, follower_id, target).await?;

    let removed = db::unfollow_user(&pool, follower_id, followed_id).await?;
    if removed {
        tracing::info!(follower_id, followed_id, "user unfollowed");
    }

    Ok(Json(json!({
        "message": if removed { "Unfollowed" } else { "Not following" },
        "following": false,
    })))
}

// POST /users/:id/upload_photo
pub async fn upload_photo(
    State(pool): State<SqlitePool>,
    State(tokens): State<TokenKeys>,
    State(uploads): State<Uploads>,
    Id(user_id): Id,
    token: BearerToken,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    ensure_acting_user(&tokens, token, user_id)?;
    ensure_user(&pool, user_id).await?;

    let form = FormData::read(multipart).await?;
    let Some(file) = form.files(AVATAR_FIELDS).next() else {
        return Err(AppError::bad_request("No file uploaded"));
    };

    let photo = uploads
        .save(&file.filename, &file.mimetype, &file.bytes)
        .await?;

    let previous = match db::set_avatar(&pool, user_id, &photo.url).await {
        Ok(previous) => previous,
        Err(err) => {
            uploads.remove(&photo.filename).await;
            return Err(err);
        }
    };

    if let Some(filename) = previous.as_deref().and_then(filename_from_url) {
        uploads.remove(filename).await;
    }

    Ok(Json(json!({ "url": uploads.absolute_url(&photo.url) })))
}
