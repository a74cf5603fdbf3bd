use sqlx::{FromRow, SqlitePool};

use crate::error::{AppResult, DBError};

pub type UserId = i64;

#[derive(Debug, FromRow)]
pub struct UserAuth {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password: String,
}

pub async fn find_user_auth(pool: &SqlitePool, username: &str) -> AppResult<Option<UserAuth>> {
    let user = sqlx::query_as::<_, UserAuth>(
        "SELECT id, username, email, password FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn insert_user(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    hash: &str,
) -> AppResult<UserId> {
    let inserted = sqlx::query(
        "INSERT INTO users (username, email, password, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(username)
    .bind(email)
    .bind(hash)
    .bind(chrono::Utc::now())
    .execute(pool)
    .await;

    match inserted {
        Ok(result) => Ok(result.last_insert_rowid()),
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            Err(DBError::AlreadyRegistered.into())
        }
        Err(err) => Err(err.into()),
    }
}
