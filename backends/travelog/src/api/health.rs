use axum::{response::IntoResponse, Json};
use serde_json::json;

// GET /ping
pub async fn ping() -> impl IntoResponse {
    Json(json!({ "message": "pong!" }))
}
