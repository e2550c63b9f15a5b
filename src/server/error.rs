//! Error-to-HTTP response conversion.
//!
//! Route handlers return `Result<T, AppError>`; anything convertible into
//! [`m4bforge_common::Error`] can be propagated with `?`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use m4bforge_common::Error;
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: Error,
}

impl AppError {
    pub fn new(inner: Error) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Error {
        &self.inner
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(e: E) -> Self {
        Self::new(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.inner, "Server error in API handler");
        } else {
            tracing::debug!(status = %status, error = %self.inner, "Rejected request");
        }

        let body = json!({
            "error": self.inner.to_string(),
            "code": self.inner.code(),
        });

        (status, axum::Json(body)).into_response()
    }
}
