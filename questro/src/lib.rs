//! Terminal chat client for the Questro chat endpoint.
//!
//! The binary wires [`config::QuestroConfig`], a
//! [`ChatClient`](questro_client::ChatClient), a history store and a
//! [`ChatSession`](questro_session::ChatSession) into a line-oriented chat.

pub mod attach;
pub mod command;
pub mod config;

pub use config::{ConfigError, QuestroConfig};

/// Top-level error for the binary.
#[derive(Debug, thiserror::Error)]
pub enum QuestroError {
    /// Configuration could not be loaded or is incomplete.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The history store could not be opened.
    #[error("history: {0}")]
    Store(#[from] questro_types::StoreError),
    /// Terminal I/O failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
