use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

use crate::{api, config::Config, utils::storage::UPLOAD_ROUTE, AppState};

pub fn generate_routes(state: AppState, config: &Config) -> anyhow::Result<Router> {
    let cors = CorsLayer::new()
        .allow_origin(config.allowed_origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let uploads = ServeDir::new(state.uploads.dir());

    let router = Router::new()
        .route("/ping", get(api::health::ping))
        // ==== AUTH ==== //
        .route("/signup", post(api::auth::signup))
        .route("/login", post(api::auth::login))
        // ==== USERS ==== //
        .route("/users", get(api::user::get_users))
        .route("/users/:id", get(api::user::get_user))
        .route("/users/:id/followers", get(api::user::get_followers))
        .route("/users/:id/following", get(api::user::get_following))
        .route("/users/:id/follow", post(api::user::follow_user))
        .route("/users/:id/unfollow", post(api::user::unfollow_user))
        .route("/users/:id/upload_photo", post(api::user::upload_photo))
        // ==== TRIPS ==== //
        .route("/trips", post(api::trips::create_trip))
        .route(
            "/trips/:id",
            get(api::trips::get_user_trips).delete(api::trips::delete_trip),
        )
        .route("/trip/:id", get(api::trips::get_trip))
        .route("/feed/:id", get(api::trips::get_feed))
        // ==== LIKES ==== //
        .route(
            "/trips/:id/like",
            post(api::likes::like_trip).delete(api::likes::unlike_trip),
        )
        .route("/trips/:id/unlike", post(api::likes::unlike_trip))
        .route("/trips/:id/likes", get(api::likes::get_likes))
        // ==== COMMENTS ==== //
        .route(
            "/trips/:id/comments",
            get(api::comments::get_comments).post(api::comments::create_comment),
        )
        .route("/comments/:id", delete(api::comments::delete_comment))
        // ==== CITIES ==== //
        .route("/cities", get(api::cities::get_cities))
        .route("/cities/search", get(api::cities::search_cities))
        .route("/cities/:id", get(api::cities::get_city))
        .route("/cities/:id/trips", get(api::cities::get_city_trips))
        .route("/cities/:id/users", get(api::cities::get_city_users))
        // ==== UPLOADS ==== //
        .nest_service(UPLOAD_ROUTE, uploads)
        .fallback(handler_404)
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        );

    Ok(router)
}

async fn handler_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "nothing to see here" })),
    )
}
