//! Session-level errors.

use questro_types::{ChatError, StoreError};

/// Errors from [`ChatSession`](crate::ChatSession) operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The submission had no text and no attachment.
    #[error("nothing to send")]
    EmptyInput,
    /// The exchange failed. The placeholder reply was removed.
    #[error(transparent)]
    Chat(#[from] ChatError),
    /// History could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SessionError {
    /// The notification text to show the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyInput => "Please enter a message.".to_string(),
            Self::Chat(err) => err.user_message(),
            Self::Store(StoreError::NotFound { .. }) => "Chat not found.".to_string(),
            Self::Store(_) => "Failed to save chat history.".to_string(),
        }
    }

    /// Whether the exchange was cancelled by the caller.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Chat(err) if err.is_cancelled())
    }
}
