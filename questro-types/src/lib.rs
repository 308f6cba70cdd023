#![deny(missing_docs)]
//! Shared types for the Questro chat core.
//!
//! This crate holds everything the other Questro crates agree on:
//!
//! - [`Message`], [`ChatRecord`] and [`ChatRequest`], the data model and the
//!   JSON body sent to the chat endpoint
//! - [`HistoryStore`], the persistence collaborator, scoped by owning user id
//! - [`ChatBackend`], the seam between a chat session and whatever produces
//!   the streamed reply
//! - [`StreamEvent`] / [`StreamHandle`] for pull-style stream consumption
//! - the error enums ([`ChatError`], [`StreamFailure`], [`StoreError`])

pub mod backend;
pub mod error;
pub mod history;
pub mod stream;
pub mod types;

pub use backend::*;
pub use error::*;
pub use history::*;
pub use stream::*;
pub use types::*;
