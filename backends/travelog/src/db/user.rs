use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::{
    error::{AppError, AppResult},
    utils::storage::Uploads,
};

use super::UserId;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

impl User {
    pub fn resolve_urls(mut self, uploads: &Uploads) -> Self {
        self.avatar_url = self.avatar_url.map(|url| uploads.absolute_url(&url));
        self
    }
}

pub async fn list_users(pool: &SqlitePool) -> AppResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id, username, email, avatar_url FROM users ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(users)
}

pub async fn get_user(pool: &SqlitePool, user_id: UserId) -> AppResult<User> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, email, avatar_url FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    user.ok_or(AppError::not_found("User"))
}

pub async fn ensure_user(pool: &SqlitePool, user_id: UserId) -> AppResult<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = ?)")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    if exists {
        Ok(())
    } else {
        Err(AppError::not_found("User"))
    }
}

/// Stores the new avatar and hands back the one it replaced.
pub async fn set_avatar(
    pool: &SqlitePool,
    user_id: UserId,
    avatar_url: &str,
) -> AppResult<Option<String>> {
    let mut tx = pool.begin().await?;

    let previous: Option<Option<String>> =
        sqlx::query_scalar("SELECT avatar_url FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

    let Some(previous) = previous else {
        return Err(AppError::not_found("User"));
    };

    sqlx::query("UPDATE users SET avatar_url = ? WHERE id = ?")
        .bind(avatar_url)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(previous)
}

pub(super) async fn all_avatar_urls(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT avatar_url FROM users WHERE avatar_url IS NOT NULL")
        .fetch_all(pool)
        .await
}
