//! HTTP error response handling for the API
//!
//! This module provides conversions from domain errors to HTTP responses
//! with appropriate status codes and JSON error bodies.

use crate::config::Locale;
use crate::error::{ApiError, Error, ToHttpStatus};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Build the error response for `error` with the message in `locale`
///
/// Every error is logged here before it leaves the service: client errors at
/// `warn`, server errors at `error`.
pub fn localized(error: Error, locale: Locale) -> Response {
    let status_code =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status_code.is_server_error() {
        tracing::error!(error = %error, code = error.error_code(), "request failed");
    } else {
        tracing::warn!(error = %error, code = error.error_code(), "request rejected");
    }

    let api_error = ApiError::from_error(&error, locale);
    (status_code, Json(api_error)).into_response()
}

/// Implement IntoResponse for Error to automatically convert errors to HTTP responses
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        localized(self, Locale::default())
    }
}
