use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    api::{form::FormData, Id},
    db::{self, ensure_user, NewTrip, UserId},
    error::{AppError, AppResult},
    utils::{
        auth::{ensure_acting_user, BearerToken},
        jwt::TokenKeys,
        storage::{Photo, Uploads},
    },
};

const PHOTO_FIELDS: &[&str] = &["media", "photos", "photo"];
const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_date(form: &FormData, names: &[&str]) -> AppResult<NaiveDate> {
    let raw = form.required(names)?;

    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
        AppError::bad_request(format!("{} must be a date like 2024-05-01", names[0]))
    })
}

fn optional(form: &FormData, names: &[&str]) -> Option<String> {
    form.text(names).map(str::to_string)
}

// Everything but the photos, which are only written once the form is known
// to be valid.
fn parse_new_trip(form: &FormData) -> AppResult<NewTrip> {
    let user_id: UserId = form
        .required(&["user_id", "userId"])?
        .parse()
        .map_err(|_| AppError::bad_request("user_id must be an integer"))?;

    let start_date = parse_date(form, &["start_date", "startDate"])?;
    let end_date = parse_date(form, &["end_date", "endDate"])?;
    if end_date < start_date {
        return Err(AppError::bad_request("end_date can't be before start_date"));
    }

    Ok(NewTrip {
        user_id,
        city: form.required(&["city"])?.to_string(),
        country: form.required(&["country"])?.to_string(),
        start_date,
        end_date,
        accommodation: optional(form, &["accommodation"]),
        favorite_restaurants: optional(form, &["favorite_restaurants", "favoriteRestaurants"]),
        favorite_attractions: optional(form, &["favorite_attractions", "favoriteAttractions"]),
        other_notes: optional(form, &["other_notes", "otherNotes"]),
        photos: Vec::new(),
    })
}

async fn store_photos(uploads: &Uploads, form: &FormData) -> AppResult<Vec<Photo>> {
    let mut photos = Vec::new();

    for file in form.files(PHOTO_FIELDS) {
        match uploads.save(&file.filename, &file.mimetype, &file.bytes).await {
            Ok(photo) => photos.push(photo),
            Err(err) => {
                uploads.remove_all(&photos).await;
                return Err(err.into());
            }
        }
    }

    Ok(photos)
}

// POST /trips
pub async fn create_trip(
    State(pool): State<SqlitePool>,
    State(tokens): State<TokenKeys>,
    State(uploads): State<Uploads>,
    token: BearerToken,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = FormData::read(multipart).await?;
    let mut trip = parse_new_trip(&form)?;

    ensure_acting_user(&tokens, token, trip.user_id)?;
    ensure_user(&pool, trip.user_id).await?;

    trip.photos = store_photos(&uploads, &form).await?;

    let trip_id = match db::insert_trip(&pool, &trip).await {
        Ok(trip_id) => trip_id,
        Err(err) => {
            uploads.remove_all(&trip.photos).await;
            return Err(err);
        }
    };

    tracing::info!(
        trip_id,
        user_id = trip.user_id,
        photos = trip.photos.len(),
        "trip created"
    );

    let trip = db::get_trip(&pool, trip_id, &uploads).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

// GET /trips/:id
pub async fn get_user_trips(
    State(pool): State<SqlitePool>,
    State(uploads): State<Uploads>,
    Id(user_id): Id,
) -> AppResult<impl IntoResponse> {
    ensure_user(&pool, user_id).await?;

    let trips = db::list_user_trips(&pool, user_id, &uploads).await?;
    Ok(Json(trips))
}

// GET /trip/:id
pub async fn get_trip(
    State(pool): State<SqlitePool>,
    State(uploads): State<Uploads>,
    Id(trip_id): Id,
) -> AppResult<impl IntoResponse> {
    let trip = db::get_trip(&pool, trip_id, &uploads).await?;
    Ok(Json(trip))
}

// DELETE /trips/:id
pub async fn delete_trip(
    State(pool): State<SqlitePool>,
    State(tokens): State<TokenKeys>,
    State(uploads): State<Uploads>,
    Id(trip_id): Id,
    token: BearerToken,
) -> AppResult<impl IntoResponse> {
    let owner_id = db::trip_owner(&pool, trip_id).await?;
    ensure_acting_user(&tokens, token, owner_id)?;

    // Row first: a crash after the commit leaves orphaned files for the
    // startup sweep, never rows pointing at missing files.
    let photos = db::delete_trip(&pool, trip_id).await?;
    uploads.remove_all(&photos).await;

    tracing::info!(trip_id, photos = photos.len(), "trip deleted");

    Ok(Json(json!({ "message": "Trip deleted" })))
}

// GET /feed/:id
pub async fn get_feed(
    State(pool): State<SqlitePool>,
    State(uploads): State<Uploads>,
    Id(user_id): Id,
) -> AppResult<impl IntoResponse> {
    ensure_user(&pool, user_id).await?;

    let trips = db::feed_trips(&pool, user_id, &uploads).await?;
    Ok(Json(trips))
}
