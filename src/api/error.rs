//! API Error Types
//!
//! Every non-2xx answer from the backend becomes an [`ApiError`].
//! A 401 is kept distinct so views can force a logout.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors from backend calls
#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend rejected the credential (HTTP 401)
    #[error("Unauthorized: credential rejected by server")]
    Unauthorized,

    /// Any other non-2xx status.
    ///
    /// `message` is set only when the body carried a JSON message field;
    /// `reason` holds the raw body, or the status phrase for an empty body.
    #[error("Server returned {status}: {}", status_text(.message, .reason))]
    Status {
        status: u16,
        message: Option<String>,
        reason: String,
    },

    /// Network or protocol failure
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// Message the server supplied with an error status
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Build an error from a failed status and its body
    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            return ApiError::Unauthorized;
        }

        let body = body.trim();
        let reason = if body.is_empty() {
            status.canonical_reason().unwrap_or("").to_string()
        } else {
            body.to_string()
        };

        ApiError::Status {
            status: status.as_u16(),
            message: json_message(body),
            reason,
        }
    }
}

fn status_text<'a>(message: &'a Option<String>, reason: &'a str) -> &'a str {
    message.as_deref().unwrap_or(reason)
}

/// The `msg`, `message` or `error` field of a JSON error body
fn json_message(body: &str) -> Option<String> {
    let map = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => return None,
    };

    ["msg", "message", "error"]
        .iter()
        .find_map(|field| match map.get(*field) {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        })
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
