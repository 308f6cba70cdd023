#![deny(missing_docs)]
//! The chat session that sits between a user and the streaming backend.
//!
//! A [`ChatSession`] owns the in-memory conversation. Each
//! [`submit`](ChatSession::submit) appends the user message and an empty
//! assistant placeholder, streams the reply into that placeholder, and then
//! either persists the conversation or rolls the placeholder back.

mod cancel;
mod error;
mod session;

pub use cancel::CancelHandle;
pub use error::SessionError;
pub use session::{ChatSession, Exchange};
