//! Error responses of the status endpoints.
//!
//! # Design Decisions
//! - One generic payload for every failure; it never names the failing dependency
//! - The status code is mirrored in the payload and on the response line

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Details string carried by every error payload.
pub const ERROR_DETAILS: &str = "error during request processing";

/// Body of a failed status query, e.g.
/// `{"ErrorCode":503,"ErrorDetails":"error during request processing"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorResponse {
    pub error_code: u16,
    pub error_details: String,
}

impl ErrorResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            error_code: status.as_u16(),
            error_details: ERROR_DETAILS.to_string(),
        }
    }
}

/// JSON error response with `status` on both the line and the payload.
pub fn answer_with_json_error(status: StatusCode) -> Response {
    (status, Json(ErrorResponse::new(status))).into_response()
}
