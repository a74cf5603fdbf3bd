use sqlx::SqlitePool;

use crate::error::AppResult;

use super::{TripId, User, UserId};

pub async fn like_trip(pool: &SqlitePool, trip_id: TripId, user_id: UserId) -> AppResult<()> {
    sqlx::query(
        "
        INSERT INTO likes (user_id, trip_id, created_at)
        VALUES (?, ?, ?)
        ON CONFLICT (user_id, trip_id) DO NOTHING
        ",
    )
    .bind(user_id)
    .bind(trip_id)
    .bind(chrono::Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn unlike_trip(pool: &SqlitePool, trip_id: TripId, user_id: UserId) -> AppResult<()> {
    sqlx::query("DELETE FROM likes WHERE user_id = ? AND trip_id = ?")
        .bind(user_id)
        .bind(trip_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn like_count(pool: &SqlitePool, trip_id: TripId) -> AppResult<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE trip_id = ?")
        .bind(trip_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

pub async fn list_likers(pool: &SqlitePool, trip_id: TripId) -> AppResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        "
        SELECT users.id, users.username, users.email, users.avatar_url
        FROM likes
        INNER JOIN users ON users.id = likes.user_id
        WHERE likes.trip_id = ?
        ORDER BY likes.created_at, likes.id
        ",
    )
    .bind(trip_id)
    .fetch_all(pool)
    .await?;

    Ok(users)
}
