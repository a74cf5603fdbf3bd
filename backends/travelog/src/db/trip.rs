use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{types::Json, FromRow, SqlitePool};

use crate::{
    error::{AppError, AppResult},
    utils::storage::{Photo, Uploads},
};

use super::{comments_for_trips, get_or_create_city, CityId, Comment, UserId};

pub type TripId = i64;

#[derive(Debug, Clone)]
pub struct NewTrip {
    pub user_id: UserId,
    pub city: String,
    pub country: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub accommodation: Option<String>,
    pub favorite_restaurants: Option<String>,
    pub favorite_attractions: Option<String>,
    pub other_notes: Option<String>,
    pub photos: Vec<Photo>,
}

#[derive(Debug, FromRow)]
struct TripRow {
    id: TripId,
    user_id: UserId,
    username: String,
    city_id: CityId,
    city: String,
    country: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    accommodation: Option<String>,
    favorite_restaurants: Option<String>,
    favorite_attractions: Option<String>,
    other_notes: Option<String>,
    photos: Json<Vec<Photo>>,
    like_count: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TripOwner {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct Trip {
    pub id: TripId,
    pub user_id: UserId,
    pub user: TripOwner,
    pub city_id: CityId,
    pub city: String,
    pub country: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub accommodation: Option<String>,
    pub favorite_restaurants: Option<String>,
    pub favorite_attractions: Option<String>,
    pub other_notes: Option<String>,
    pub photos: Vec<Photo>,
    pub like_count: i64,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
}

const TRIP_SELECT: &str = "
    SELECT
        trips.id,
        trips.user_id,
        users.username,
        trips.city_id,
        cities.name AS city,
        cities.country,
        trips.start_date,
        trips.end_date,
        trips.accommodation,
        trips.favorite_restaurants,
        trips.favorite_attractions,
        trips.other_notes,
        trips.photos,
        (SELECT COUNT(*) FROM likes WHERE likes.trip_id = trips.id) AS like_count,
        trips.created_at
    FROM trips
    INNER JOIN users ON users.id = trips.user_id
    INNER JOIN cities ON cities.id = trips.city_id
";

const NEWEST_FIRST: &str = "ORDER BY trips.created_at DESC, trips.id DESC";

pub async fn insert_trip(pool: &SqlitePool, trip: &NewTrip) -> AppResult<TripId> {
    let mut tx = pool.begin().await?;

    let city_id = get_or_create_city(&mut *tx, &trip.city, &trip.country).await?;

    let result = sqlx::query(
        "
        INSERT INTO trips (
            user_id, city_id, start_date, end_date, accommodation,
            favorite_restaurants, favorite_attractions, other_notes, photos, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ",
    )
    .bind(trip.user_id)
    .bind(city_id)
    .bind(trip.start_date)
    .bind(trip.end_date)
    .bind(&trip.accommodation)
    .bind(&trip.favorite_restaurants)
    .bind(&trip.favorite_attractions)
    .bind(&trip.other_notes)
    .bind(Json(&trip.photos))
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_trip(pool: &SqlitePool, trip_id: TripId, uploads: &Uploads) -> AppResult<Trip> {
    let sql = format!("{TRIP_SELECT} WHERE trips.id = ?");

    let row = sqlx::query_as::<_, TripRow>(&sql)
        .bind(trip_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::not_found("Trip"))?;

    let mut trips = hydrate(pool, vec![row], uploads).await?;
    trips.pop().ok_or(AppError::not_found("Trip"))
}

pub async fn ensure_trip(pool: &SqlitePool, trip_id: TripId) -> AppResult<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM trips WHERE id = ?)")
        .bind(trip_id)
        .fetch_one(pool)
        .await?;

    if exists {
        Ok(())
    } else {
        Err(AppError::not_found("Trip"))
    }
}

pub async fn trip_owner(pool: &SqlitePool, trip_id: TripId) -> AppResult<UserId> {
    let owner = sqlx::query_scalar("SELECT user_id FROM trips WHERE id = ?")
        .bind(trip_id)
        .fetch_optional(pool)
        .await?;

    owner.ok_or(AppError::not_found("Trip"))
}

pub async fn list_user_trips(
    pool: &SqlitePool,
    user_id: UserId,
    uploads: &Uploads,
) -> AppResult<Vec<Trip>> {
    let sql = format!("{TRIP_SELECT} WHERE trips.user_id = ? {NEWEST_FIRST}");

    let rows = sqlx::query_as::<_, TripRow>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    hydrate(pool, rows, uploads).await
}

/// Trips owned by anyone `user_id` follows, newest first.
pub async fn feed_trips(
    pool: &SqlitePool,
    user_id: UserId,
    uploads: &Uploads,
) -> AppResult<Vec<Trip>> {
    let sql = format!(
        "{TRIP_SELECT}
        WHERE trips.user_id IN (
            SELECT follows.followed_id FROM follows WHERE follows.follower_id = ?
        )
        {NEWEST_FIRST}"
    );

    let rows = sqlx::query_as::<_, TripRow>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    hydrate(pool, rows, uploads).await
}

pub async fn list_city_trips(
    pool: &SqlitePool,
    city_id: CityId,
    uploads: &Uploads,
) -> AppResult<Vec<Trip>> {
    let sql = format!("{TRIP_SELECT} WHERE trips.city_id = ? {NEWEST_FIRST}");

    let rows = sqlx::query_as::<_, TripRow>(&sql)
        .bind(city_id)
        .fetch_all(pool)
        .await?;

    hydrate(pool, rows, uploads).await
}

/// Deletes the row (likes and comments cascade) and returns the photos it
/// referenced so the caller can clean them up after the commit.
pub async fn delete_trip(pool: &SqlitePool, trip_id: TripId) -> AppResult<Vec<Photo>> {
    let mut tx = pool.begin().await?;

    let photos: Option<Json<Vec<Photo>>> =
        sqlx::query_scalar("DELETE FROM trips WHERE id = ? RETURNING photos")
            .bind(trip_id)
            .fetch_optional(&mut *tx)
            .await?;

    let Some(Json(photos)) = photos else {
        return Err(AppError::not_found("Trip"));
    };

    tx.commit().await?;
    Ok(photos)
}

pub(super) async fn all_trip_photos(pool: &SqlitePool) -> Result<Vec<Photo>, sqlx::Error> {
    let rows: Vec<Json<Vec<Photo>>> = sqlx::query_scalar("SELECT photos FROM trips")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().flat_map(|Json(photos)| photos).collect())
}

async fn hydrate(pool: &SqlitePool, rows: Vec<TripRow>, uploads: &Uploads) -> AppResult<Vec<Trip>> {
    let ids: Vec<TripId> = rows.iter().map(|row| row.id).collect();

    let mut comments: HashMap<TripId, Vec<Comment>> = HashMap::new();
    for comment in comments_for_trips(pool, &ids).await? {
        comments.entry(comment.trip_id).or_default().push(comment);
    }

    let trips = rows
        .into_iter()
        .map(|row| Trip {
            comments: comments.remove(&row.id).unwrap_or_default(),
            photos: row.photos.0.iter().map(|photo| uploads.resolve(photo)).collect(),
            id: row.id,
            user_id: row.user_id,
            user: TripOwner {
                id: row.user_id,
                username: row.username,
            },
            city_id: row.city_id,
            city: row.city,
            country: row.country,
            start_date: row.start_date,
            end_date: row.end_date,
            accommodation: row.accommodation,
            favorite_restaurants: row.favorite_restaurants,
            favorite_attractions: row.favorite_attractions,
            other_notes: row.other_notes,
            like_count: row.like_count,
            created_at: row.created_at,
        })
        .collect();

    Ok(trips)
}
