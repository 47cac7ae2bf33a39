// imgbatch/src/http/error.rs
use crate::core::ImageToolError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

impl From<ImageToolError> for AppError {
    fn from(err: ImageToolError) -> Self {
        if err.is_validation() {
            AppError::Validation(err.to_string())
        } else {
            AppError::Internal(err.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(msg) => {
                log::error!("Request failed: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
