use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Failures talking to the dashboard backend.
///
/// Every variant is recoverable: callers log it, show one inline message,
/// and leave retrying to the user.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (DNS, connection refused, TLS, reset)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),
    /// Request plus body read exceeded the per-request budget
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Non-2xx response. `detail` is empty when the body carried none.
    #[error("HTTP error: status {status}{}", detail_suffix(.detail))]
    HttpStatus { status: u16, detail: String },
    /// Success status but the body was not the expected JSON
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(" ({})", detail)
    }
}

impl ApiError {
    /// HTTP status for `HttpStatus` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short text for the status bar: the backend's detail when it sent one,
    /// otherwise the error's own description.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::HttpStatus { detail, .. } if !detail.is_empty() => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// Failure body. FastAPI-style backends send `detail`; the collector's own
/// endpoints send `error`. `detail` may also be a structured validation list.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
    error: Option<serde_json::Value>,
}

/// Extract the human-readable detail from a failure body.
///
/// An empty, non-JSON, or detail-less body yields an empty string.
pub(crate) fn error_detail(body: &[u8]) -> String {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
    match parsed.detail.or(parsed.error) {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
