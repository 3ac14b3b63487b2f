//! Project service error types.

use crate::auth::AuthError;
use thiserror::Error;

/// Condense an API error for display, pulling the message out of a JSON body.
///
/// Handles:
/// - `"HTTP 404: {"error": {"message": "...", "code": "..."}}"` → prefix + message + code
/// - an `error.type` stands in when `code` is absent or null
/// - `{"message": "..."}` → message
/// - Plain text → returned unchanged
#[must_use]
pub fn format_api_error(error: &str) -> String {
    if let Some(json_start) = error.find('{') {
        let json_str = &error[json_start..];

        if let Ok(json) = serde_json::from_str::<serde_json::Value>(json_str)
            && let Some(msg) = extract_error_message(&json)
        {
            let prefix = error[..json_start].trim();
            if prefix.is_empty() {
                return msg;
            }
            return format!("{prefix} {msg}");
        }
    }

    error.to_string()
}

/// Extract a readable message from an error body.
fn extract_error_message(json: &serde_json::Value) -> Option<String> {
    // {"error": {"message": "...", "code": "...", "type": "..."}}
    // {"error": "..."}
    // {"message": "..."}
    if let Some(error_obj) = json.get("error") {
        if let Some(msg) = error_obj.get("message").and_then(|v| v.as_str()) {
            if let Some(code) = error_obj.get("code").and_then(|v| v.as_str()) {
                return Some(format!("{msg} (code: {code})"));
            }
            // OpenAI-style bodies often carry a null code but a typed error.
            if let Some(kind) = error_obj.get("type").and_then(|v| v.as_str()) {
                return Some(format!("{msg} (type: {kind})"));
            }
            return Some(msg.to_string());
        }

        if let Some(msg) = error_obj.as_str() {
            return Some(msg.to_string());
        }
    }

    json.get("message")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid project endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("API error: {}", format_api_error(.0))]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limited, retry after {retry_after:?}s")]
    RateLimited { retry_after: Option<u64> },

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),
}
