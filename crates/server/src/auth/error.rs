use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Clone, Debug)]
pub enum AuthError {
    MissingKey,
    BadKey,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::MissingKey => (StatusCode::UNAUTHORIZED, "Missing or bad bearer key"),
            Self::BadKey => (StatusCode::UNAUTHORIZED, "Bearer key is not valid"),
        };
        let error = json!({ "error": error }).to_string();
        (status, error).into_response()
    }
}
