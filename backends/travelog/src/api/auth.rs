use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    db::{self, get_user, User},
    error::{AppError, AppResult},
    utils::{hasher, jwt::TokenKeys, storage::Uploads},
};

// ================================================= LOGIN ================================================= //

#[derive(Debug, Deserialize, Validate)]
pub struct Login {
    #[serde(default)]
    #[validate(length(min = 1, message = "username can't be blank"))]
    username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "password can't be blank"))]
    password: String,
}

// POST /login
pub async fn login(
    State(pool): State<SqlitePool>,
    State(tokens): State<TokenKeys>,
    State(uploads): State<Uploads>,
    Json(user): Json<Login>,
) -> AppResult<impl IntoResponse> {
    user.validate()?;

    let Some(user_auth) = db::find_user_auth(&pool, user.username.trim()).await? else {
        return Err(AppError::not_found("User"));
    };

    hasher::verify_password(&user_auth.password, &user.password).map_err(|err| {
        tracing::info!(username = %user_auth.username, "failed login attempt");
        err
    })?;

    let token = tokens.generate_jwt(user_auth.id)?;
    let user = get_user(&pool, user_auth.id).await?.resolve_urls(&uploads);

    Ok(Json(json!({ "token": token, "user": user })))
}

// ================================================= SIGNUP ================================================= //

#[derive(Debug, Deserialize, Validate)]
pub struct Signup {
    #[serde(default)]
    #[validate(
        length(min = 1, message = "username can't be blank"),
        length(max = 80, message = "too long user name")
    )]
    username: String,

    #[serde(default)]
    #[validate(
        length(min = 1, message = "email can't be blank"),
        length(max = 120, message = "too long email address"),
        email(message = "invalid email address")
    )]
    email: String,

    #[serde(default)]
    #[validate(
        length(min = 8, message = "password must be at least 8 characters long"),
        length(max = 128, message = "too long password")
    )]
    password: String,
}

// POST /signup
pub async fn signup(
    State(pool): State<SqlitePool>,
    State(tokens): State<TokenKeys>,
    Json(mut user): Json<Signup>,
) -> AppResult<impl IntoResponse> {
    user.username = user.username.trim().to_string();
    user.email = user.email.trim().to_lowercase();
    user.validate()?;

    let hash = hasher::hash_password(&user.password)?;
    let user_id = db::insert_user(&pool, &user.username, &user.email, &hash).await?;

    tracing::info!(user_id, username = %user.username, "user signed up");

    let token = tokens.generate_jwt(user_id)?;
    let user = User {
        id: user_id,
        username: user.username,
        email: user.email,
        avatar_url: None,
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({ "token": token, "user": user })),
    ))
}
