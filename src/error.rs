use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Everything a request can fail with.
///
/// The first four are expected rejections and map to 400 with a message
/// the frontend shows verbatim. `Internal` is the catch-all for faults
/// that should never happen under normal traffic.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Video ID is required")]
    MissingVideoId,

    #[error("Invalid video ID")]
    InvalidVideo,

    #[error("Must follow on {0}")]
    MissingRequirement(&'static str),

    #[error("You have already voted")]
    AlreadyVoted,

    #[error("Internal error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
