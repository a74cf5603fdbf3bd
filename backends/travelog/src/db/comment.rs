use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use crate::error::{AppError, AppResult};

use super::{TripId, UserId};

pub type CommentId = i64;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Comment {
    pub id: CommentId,
    pub trip_id: TripId,
    pub user_id: UserId,
    pub username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

const COMMENT_SELECT: &str = "
    SELECT
        comments.id,
        comments.trip_id,
        comments.user_id,
        users.username,
        comments.content,
        comments.created_at
    FROM comments
    INNER JOIN users ON users.id = comments.user_id
";

const OLDEST_FIRST: &str = "ORDER BY comments.created_at ASC, comments.id ASC";

pub async fn insert_comment(
    pool: &SqlitePool,
    trip_id: TripId,
    user_id: UserId,
    content: &str,
) -> AppResult<Comment> {
    let inserted = sqlx::query(
        "INSERT INTO comments (user_id, trip_id, content, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(trip_id)
    .bind(content)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    let sql = format!("{COMMENT_SELECT} WHERE comments.id = ?");
    let comment = sqlx::query_as::<_, Comment>(&sql)
        .bind(inserted.last_insert_rowid())
        .fetch_one(pool)
        .await?;

    Ok(comment)
}

pub async fn list_comments(pool: &SqlitePool, trip_id: TripId) -> AppResult<Vec<Comment>> {
    let sql = format!("{COMMENT_SELECT} WHERE comments.trip_id = ? {OLDEST_FIRST}");

    let comments = sqlx::query_as::<_, Comment>(&sql)
        .bind(trip_id)
        .fetch_all(pool)
        .await?;

    Ok(comments)
}

/// Comments for a batch of trips in one round trip, oldest first.
pub async fn comments_for_trips(pool: &SqlitePool, trip_ids: &[TripId]) -> AppResult<Vec<Comment>> {
    if trip_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = QueryBuilder::<Sqlite>::new(COMMENT_SELECT);
    query.push(" WHERE comments.trip_id IN (");
    let mut ids = query.separated(", ");
    for id in trip_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(") ");
    query.push(OLDEST_FIRST);

    let comments = query.build_query_as::<Comment>().fetch_all(pool).await?;
    Ok(comments)
}

pub async fn delete_comment(pool: &SqlitePool, comment_id: CommentId) -> AppResult<()> {
    let deleted = sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(comment_id)
        .execute(pool)
        .await?;

    match deleted.rows_affected() {
        0 => Err(AppError::not_found("Comment")),
        _ => Ok(()),
    }
}

pub async fn comment_author(pool: &SqlitePool, comment_id: CommentId) -> AppResult<UserId> {
    let author = sqlx::query_scalar("SELECT user_id FROM comments WHERE id = ?")
        .bind(comment_id)
        .fetch_optional(pool)
        .await?;

    author.ok_or(AppError::not_found("Comment"))
}
