//! Streaming event types for incremental replies.

use std::pin::Pin;

use futures::Stream;

use crate::error::StreamFailure;

/// An event emitted while a reply streams in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// One incremental fragment of reply text.
    TextDelta(String),
    /// The stream reached its terminal state (sentinel or clean end).
    Done,
    /// The stream failed. No further events follow.
    Error(StreamFailure),
}

/// Handle to a streaming reply.
pub struct StreamHandle {
    /// The stream of events. Consume with `StreamExt::next()`.
    pub receiver: Pin<Box<dyn Stream<Item = StreamEvent> + Send>>,
}

/// Summary of one fully assembled reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyOutcome {
    /// The cumulative reply text.
    pub text: String,
    /// Number of deltas delivered to the sink.
    pub deltas: usize,
    /// Number of `data:` frames dropped because their payload did not decode.
    pub malformed_frames: usize,
    /// Whether the `[DONE]` sentinel was seen.
    pub saw_sentinel: bool,
}
