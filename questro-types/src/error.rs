//! Error types for all Questro crates.

use std::time::Duration;

/// Shown to the user when the chat endpoint answers 429.
pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again in a moment.";

/// Shown to the user when the chat endpoint answers 402.
pub const QUOTA_MESSAGE: &str = "AI service quota exceeded. Please contact support.";

/// Generic failure text shown for any other failed exchange.
pub const FAILURE_MESSAGE: &str = "Failed to get AI response";

/// Why a streamed body stopped before it could be fully assembled.
///
/// Malformed frames and undecodable bytes are not failures; they are
/// recovered inside the assembler and never reach this type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamFailure {
    /// The underlying byte stream returned an error.
    #[error("stream read error: {0}")]
    Read(String),
    /// No chunk arrived within the configured inactivity window.
    #[error("no data received for {0:?}")]
    IdleTimeout(Duration),
    /// The stream ended cleanly but before the `[DONE]` sentinel, and the
    /// caller asked for the sentinel to be required.
    #[error("stream ended before the [DONE] sentinel")]
    Truncated,
    /// The exchange was cancelled through its cancellation token.
    #[error("cancelled")]
    Cancelled,
}

/// Errors from a chat exchange: the request, the response status, or the
/// streamed body.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Network-level failure (connection refused, reset, DNS, TLS).
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// No response headers within the request timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// The endpoint answered 429.
    #[error("rate limited: {0}")]
    RateLimited(String),
    /// The endpoint answered 402.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
    /// Any other non-2xx status. `message` is the `error` field of the JSON
    /// body when present, otherwise the raw body.
    #[error("HTTP {status}: {message}")]
    Http {
        /// Response status code.
        status: u16,
        /// Server-provided error text.
        message: String,
    },
    /// The response body failed while streaming.
    #[error("stream failed: {0}")]
    Stream(#[from] StreamFailure),
    /// The client is misconfigured (missing endpoint, bad credential header).
    #[error("configuration error: {0}")]
    Config(String),
}

impl ChatError {
    /// Whether the endpoint rejected the request for rate limiting.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }

    /// Whether the endpoint rejected the request for exhausted quota/credits.
    #[must_use]
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_))
    }

    /// Whether the exchange was cancelled by the caller.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Stream(StreamFailure::Cancelled))
    }

    /// The notification text to show the user for this failure.
    ///
    /// Rate limiting and quota exhaustion get their own actionable messages.
    /// Nothing here is retried automatically; the user re-submits.
    pub fn user_message(&self) -> String {
        match self {
            Self::RateLimited(_) => RATE_LIMIT_MESSAGE.to_string(),
            Self::QuotaExceeded(_) => QUOTA_MESSAGE.to_string(),
            Self::Stream(StreamFailure::Cancelled) => "Response cancelled.".to_string(),
            Self::Timeout(_) | Self::Stream(StreamFailure::IdleTimeout(_)) => {
                "The AI service took too long to respond. Please try again.".to_string()
            }
            Self::Http { message, .. } if !message.is_empty() => {
                format!("{FAILURE_MESSAGE}: {message}")
            }
            _ => FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Errors from history persistence.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record with this id is owned by the user.
    #[error("chat not found: {user_id}/{id}")]
    NotFound {
        /// The owning user that was searched.
        user_id: String,
        /// The record id that was not found.
        id: String,
    },
    /// Records could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// The backing medium failed.
    #[error("storage I/O failed: {0}")]
    Io(String),
}

impl StoreError {
    /// Convenience constructor for [`StoreError::NotFound`].
    pub fn not_found(user_id: &str, id: &str) -> Self {
        Self::NotFound {
            user_id: user_id.to_string(),
            id: id.to_string(),
        }
    }
}
