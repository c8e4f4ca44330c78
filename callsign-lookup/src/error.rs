//! Error types for callsign-lookup HTTP handlers

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use callsign_common::StoreError;
use thiserror::Error;
use tracing::error;

use crate::api::auth::AuthError;
use crate::import::ImportError;
use crate::render;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Member store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Fatal import failure before the report started streaming
    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    /// Malformed or oversized multipart upload
    #[error("Upload error: {0}")]
    Multipart(#[from] MultipartError),

    /// Login redirect could not be built
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            // 413 when the upload exceeds the body limit, 400 when malformed
            ApiError::Multipart(e) => e.status(),
            ApiError::Internal(_)
            | ApiError::Store(_)
            | ApiError::Import(_)
            | ApiError::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("{}", self);
        }

        (status, Html(render::error_page(status, &self.to_string()))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
