//! Error-to-HTTP response conversion.
//!
//! Route handlers return `Result<T, AppError>`; every [`eventimg_common::Error`]
//! converts into a JSON body `{"error", "code"}` with the status from
//! [`eventimg_common::Error::http_status`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use eventimg_common::Error;
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError(pub Error);

impl AppError {
    pub fn code(&self) -> &'static str {
        match &self.0 {
            Error::NotFound { .. } => "not_found",
            Error::Validation(_) => "validation_error",
            Error::UnsupportedFormat(_) => "unsupported_format",
            Error::PayloadTooLarge { .. } => "payload_too_large",
            Error::Codec(_) => "codec_error",
            Error::Database { .. } => "database_error",
            Error::Storage { .. } => "storage_error",
            Error::Io { .. } => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }
}

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self(Error::Internal(format!("blocking task failed: {e}")))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.0, "Server error in API handler");
        } else {
            tracing::debug!(status = %status, error = %self.0, "Request rejected");
        }

        let body = json!({
            "error": self.0.to_string(),
            "code": self.code(),
        });

        (status, axum::Json(body)).into_response()
    }
}
