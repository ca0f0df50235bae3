//! HTTP error responses.
//!
//! Every failure is rendered as `{ "success": false, "kind": ..., "error": ... }`.
//! Storage and internal failures are logged here and reach the client only
//! as a generic message, with a `Retry-After` hint.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use nationhood_core::error::{ErrorKind, NationError};
use serde::Serialize;
use tracing::error;

const INTERNAL_MESSAGE: &str = "Internal server error";
const RETRY_AFTER_SECS: &str = "1";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required request field was absent or blank.
    #[error("{0}")]
    MissingFields(&'static str),

    /// The request body was not the expected JSON.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error(transparent)]
    Domain(#[from] NationError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    kind: &'static str,
    error: String,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::MissingFields(_) | ApiError::InvalidBody(_) => ErrorKind::Validation,
            ApiError::Domain(err) => err.kind(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            // Invariant violations answer 400 like malformed input.
            ErrorKind::Validation | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Domain(err) if err.is_retryable())
    }

    /// The message shown to the client.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => INTERNAL_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let retryable = self.is_retryable();
        if kind == ErrorKind::Internal {
            error!(error = %self, retryable, "Request failed");
        }

        let body = ErrorBody {
            success: false,
            kind: kind.as_str(),
            error: self.public_message(),
        };
        let mut response = (self.status(), Json(body)).into_response();
        if retryable {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
        }
        response
    }
}
