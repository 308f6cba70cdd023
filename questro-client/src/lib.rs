#![deny(missing_docs)]
//! HTTP client for the Questro chat endpoint.
//!
//! [`ChatClient`] POSTs a [`ChatRequest`](questro_types::ChatRequest) with a
//! bearer credential, classifies non-2xx responses, and hands the streamed
//! body to the `questro-stream` assembler.
//!
//! # Usage
//!
//! ```no_run
//! use questro_client::ChatClient;
//! use questro_stream::AssemblerConfig;
//! use questro_types::{ChatRequest, Message};
//!
//! # async fn run() -> Result<(), questro_types::ChatError> {
//! let client = ChatClient::new("https://example.supabase.co/functions/v1/chat", "anon-key");
//! let request = ChatRequest::from_history(&[Message::user("What is a limit?")]);
//! let reply = client
//!     .stream(&request, &AssemblerConfig::default(), |text| println!("{text}"))
//!     .await?;
//! # let _ = reply;
//! # Ok(())
//! # }
//! ```

pub mod client;
mod error;

pub use client::{API_KEY_ENV, ChatClient, ClientConfig, DEFAULT_REQUEST_TIMEOUT, ENDPOINT_ENV};

// Re-export the shared types callers need alongside the client.
pub use questro_types::{ChatBackend, ChatError, ChatRequest, StreamEvent, StreamHandle};
