use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorResponse {
    success: bool,
    error: String,
}

/// Failures visible to callers of the control surface.
///
/// Provider failures never show up here: the fetcher turns them into a
/// fallback joke.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("{0}")]
    InvalidArgument(String),
}

impl RefreshError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        RefreshError::InvalidArgument(msg.into())
    }
}

impl IntoResponse for RefreshError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            RefreshError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(ErrorResponse {
            success: false,
            error,
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, RefreshError>;
