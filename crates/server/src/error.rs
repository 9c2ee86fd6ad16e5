use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("requested resource doesn't exist or is not published")]
    NotFound,
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Clone, Debug, Error)]
pub enum ValidationError {
    #[error("input value is invalid: `{value}`, reason: {reason}")]
    InvalidInput { value: String, reason: String },
    #[error("limit exceeded for {subject}, allowed {limit} {unit}(s), got {attempted}")]
    LimitExceeded {
        subject: String,
        unit: String,
        attempted: usize,
        limit: usize,
    },
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::Sqlx(e) => match e {
                sqlx::Error::RowNotFound => (StatusCode::NOT_FOUND, "not found".into()),
                e => {
                    error!("received internal error for user request: {e}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Something went wrong".into(),
                    )
                }
            },
            Self::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            e @ Self::NotFound => (StatusCode::NOT_FOUND, e.to_string()),
        };
        let error = json!({ "error": error }).to_string();
        (status, error).into_response()
    }
}
