use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    api::Id,
    db::{self, City, CityId},
    error::{AppError, AppResult},
    utils::storage::Uploads,
};

#[derive(Debug, Serialize)]
pub struct CityDetail {
    id: CityId,
    name: String,
    country: String,
    slug: String,
    trip_count: i64,
}

impl From<City> for CityDetail {
    fn from(city: City) -> Self {
        Self {
            slug: city.slug(),
            id: city.id,
            name: city.name,
            country: city.country,
            trip_count: city.trip_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CitySearchHit {
    id: CityId,
    city: String,
    country: String,
    slug: String,
}

impl From<City> for CitySearchHit {
    fn from(city: City) -> Self {
        Self {
            slug: city.slug(),
            id: city.id,
            city: city.name,
            country: city.country,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: Option<String>,
}

// GET /cities
pub async fn get_cities(State(pool): State<SqlitePool>) -> AppResult<impl IntoResponse> {
    let cities: Vec<CityDetail> = db::list_cities(&pool)
        .await?
        .into_iter()
        .map(CityDetail::from)
        .collect();

    Ok(Json(cities))
}

// GET /cities/search?q=
pub async fn search_cities(
    State(pool): State<SqlitePool>,
    Query(params): Query<SearchQuery>,
) -> AppResult<impl IntoResponse> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(AppError::bad_request("q is required"));
    }

    let hits: Vec<CitySearchHit> = db::search_cities(&pool, query)
        .await?
        .into_iter()
        .map(CitySearchHit::from)
        .collect();

    Ok(Json(hits))
}

// GET /cities/:id
pub async fn get_city(
    State(pool): State<SqlitePool>,
    Id(city_id): Id,
) -> AppResult<impl IntoResponse> {
    let city = db::get_city(&pool, city_id).await?;
    Ok(Json(CityDetail::from(city)))
}

// GET /cities/:id/trips
pub async fn get_city_trips(
    State(pool): State<SqlitePool>,
    State(uploads): State<Uploads>,
    Id(city_id): Id,
) -> AppResult<impl IntoResponse> {
    db::get_city(&pool, city_id).await?;

    let trips = db::list_city_trips(&pool, city_id, &uploads).await?;
    Ok(Json(trips))
}

// GET /cities/:id/users
pub async fn get_city_users(
    State(pool): State<SqlitePool>,
    State(uploads): State<Uploads>,
    Id(city_id): Id,
) -> AppResult<impl IntoResponse> {
    db::get_city(&pool, city_id).await?;

    let users: Vec<_> = db::list_city_users(&pool, city_id)
        .await?
        .into_iter()
        .map(|user| user.resolve_urls(&uploads))
        .collect();

    Ok(Json(users))
}
