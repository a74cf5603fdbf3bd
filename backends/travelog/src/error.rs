use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(thiserror::Error, Debug)]
pub enum DBError {
    #[error("Username or email is already registered")]
    AlreadyRegistered,

    #[error("{0} not found")]
    NotFound(&'static str),
}

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Any error: {0:?}")]
    Anyhow(#[from] anyhow::Error),

    #[error("DB Error: {0:?}")]
    DBError(#[from] DBError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Forbidden request: {0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("SQL failed: {0:?}")]
    Sqlx(#[from] sqlx::Error),

    #[error("JWT error: {0:?}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid request: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("IO failed: {0:?}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    pub fn not_found(entity: &'static str) -> Self {
        AppError::DBError(DBError::NotFound(entity))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Validation(_) | AppError::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::DBError(DBError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::DBError(DBError::AlreadyRegistered) => StatusCode::CONFLICT,
            AppError::Anyhow(_) | AppError::Sqlx(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// Tell axum how to convert `AppError` into a response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
            "Internal server error".to_string()
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
            match self {
                AppError::DBError(db_error) => db_error.to_string(),
                AppError::JwtError(_) => "Invalid or expired token".to_string(),
                other => other.to_string(),
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
