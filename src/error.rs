//! Error types with HTTP status code mapping.
//!
//! [`SubmitError`] describes why a row did not reach the warehouse.
//! [`ShimError`] is the HTTP-facing error for requests that never became a
//! change notification; each variant maps to a status code and a
//! structured JSON body.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::sink::RowInsertError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid request: unknown value kind in field `status`",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Failure to append a row to the warehouse.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmitError {
    /// The sink accepted the call but rejected the row.
    #[error("warehouse rejected row: {}", join_messages(.errors))]
    SinkRejection {
        /// Row-level errors reported by the sink.
        errors: Vec<RowInsertError>,
    },

    /// The append call itself failed (network, auth, quota).
    #[error("warehouse transport failure: {0}")]
    Transport(String),

    /// The row could not be encoded for the sink.
    #[error("row serialization failure: {0}")]
    Serialization(String),
}

fn join_messages(errors: &[RowInsertError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Codes
///
/// | Code | Variant        | HTTP Status                      |
/// |------|----------------|----------------------------------|
/// | 1000 | MalformedBody  | from the rejection (400/415/422) |
/// | 1001 | InvalidRequest | 400 Bad Request                  |
#[derive(Debug, thiserror::Error)]
pub enum ShimError {
    /// Request body is not the expected JSON document.
    #[error("malformed body: {0}")]
    MalformedBody(#[from] JsonRejection),

    /// Request decoded as JSON but does not describe a valid change.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ShimError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::MalformedBody(_) => 1000,
            Self::InvalidRequest(_) => 1001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedBody(rejection) => rejection.status(),
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ShimError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
