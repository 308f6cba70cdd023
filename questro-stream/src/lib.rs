#![deny(missing_docs)]
//! Server-sent-event reassembly for streamed chat replies.
//!
//! [`StreamAssembler`] is the synchronous core: feed it raw body chunks and
//! it reports the cumulative reply text after every delta. [`assemble`] and
//! [`event_stream`] drive it over an async byte stream with an idle timeout
//! and cooperative cancellation.

pub mod assembler;
pub mod decoder;
pub mod driver;
pub mod frame;

pub use assembler::{AssemblerState, StreamAssembler};
pub use decoder::Utf8StreamDecoder;
pub use driver::{AssemblerConfig, DEFAULT_IDLE_TIMEOUT, assemble, event_stream, stream_handle};
pub use frame::{DATA_PREFIX, DONE_SENTINEL, Frame, MalformedFrame, classify_line, decode_delta};
