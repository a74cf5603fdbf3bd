use sqlx::SqlitePool;

use crate::error::AppResult;

use super::{User, UserId};

/// Returns `false` when the edge already existed.
pub async fn follow_user(
    pool: &SqlitePool,
    follower_id: UserId,
    followed_id: UserId,
) -> AppResult<bool> {
    let result = sqlx::query(
        "
        INSERT INTO follows (follower_id, followed_id, created_at)
        VALUES (?, ?, ?)
        ON CONFLICT (follower_id, followed_id) DO NOTHING
        ",
    )
    .bind(follower_id)
    .bind(followed_id)
    .bind(chrono::Utc::now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Returns `false` when there was no edge to remove.
pub async fn unfollow_user(
    pool: &SqlitePool,
    follower_id: UserId,
    followed_id: UserId,
) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followed_id = ?")
        .bind(follower_id)
        .bind(followed_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn list_followers(pool: &SqlitePool, user_id: UserId) -> AppResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        "
        SELECT users.id, users.username, users.email, users.avatar_url
        FROM follows
        INNER JOIN users ON users.id = follows.follower_id
        WHERE follows.followed_id = ?
        ORDER BY users.username
        ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

pub async fn list_following(pool: &SqlitePool, user_id: UserId) -> AppResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        "
        SELECT users.id, users.username, users.email, users.avatar_url
        FROM follows
        INNER JOIN users ON users.id = follows.followed_id
        WHERE follows.follower_id = ?
        ORDER BY users.username
        ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(users)
}
