//! Internal error helpers for mapping HTTP/reqwest errors to [`ChatError`].

use std::time::Duration;

use questro_types::ChatError;
use serde::Deserialize;

/// Error body returned by the chat endpoint: `{"error": "..."}`.
///
/// Some gateways nest it as `{"error": {"message": "..."}}`.
#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorField,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorField {
    Text(String),
    Detailed { message: String },
}

/// The `error` field of a JSON error body, or the raw body text.
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: ErrorField::Text(message) | ErrorField::Detailed { message },
        }) => message,
        Err(_) => body.trim().to_string(),
    }
}

/// Map a non-2xx status from the chat endpoint to a [`ChatError`].
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> ChatError {
    let message = error_message(body);
    match status.as_u16() {
        429 => ChatError::RateLimited(message),
        402 => ChatError::QuotaExceeded(message),
        code => ChatError::Http {
            status: code,
            message,
        },
    }
}

/// Map a [`reqwest::Error`] to a [`ChatError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error, timeout: Duration) -> ChatError {
    if err.is_timeout() {
        ChatError::Timeout(timeout)
    } else {
        ChatError::Transport(Box::new(err))
    }
}
