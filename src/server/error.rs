// shrinkray/src/server/error.rs
use crate::core::CompressError;
use crate::envelope::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse::new(self.message))).into_response()
    }
}

impl From<CompressError> for ApiError {
    fn from(err: CompressError) -> Self {
        let message = err.public_message();

        if err.is_client_error() {
            log::info!("Rejected upload: {}", err);
            return Self::bad_request(message);
        }

        match &err {
            CompressError::CompressionFailed { source, .. } => {
                log::error!("Error during compression: {} ({})", err, source);
            }
            _ => log::error!("Error processing image: {}", err),
        }
        Self::internal(message)
    }
}
