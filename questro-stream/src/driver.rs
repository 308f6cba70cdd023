//! Async drivers: run the assembler over a live byte stream.

use std::fmt::Display;
use std::time::Duration;

use futures::{Stream, StreamExt};
use questro_types::{AssemblyOutcome, StreamEvent, StreamFailure, StreamHandle};
use tokio_util::sync::CancellationToken;

use crate::assembler::StreamAssembler;

/// Default inactivity window between two chunks.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Read-loop policy for one streamed reply.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Maximum wait for the next chunk. `None` waits forever.
    pub idle_timeout: Option<Duration>,
    /// Treat a clean end before `[DONE]` as [`StreamFailure::Truncated`].
    pub require_sentinel: bool,
    /// Checked at every chunk read.
    pub cancellation: CancellationToken,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
            require_sentinel: false,
            cancellation: CancellationToken::new(),
        }
    }
}

impl AssemblerConfig {
    /// Override the inactivity window.
    #[must_use]
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Require the `[DONE]` sentinel before a clean end.
    #[must_use]
    pub fn require_sentinel(mut self, required: bool) -> Self {
        self.require_sentinel = required;
        self
    }

    /// Use the given cancellation token.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }
}

/// Wait for the next chunk, racing cancellation and the idle timeout.
async fn next_chunk<S>(stream: &mut S, config: &AssemblerConfig) -> Result<Option<S::Item>, StreamFailure>
where
    S: Stream + Unpin,
{
    match config.idle_timeout {
        Some(limit) => tokio::select! {
            biased;
            _ = config.cancellation.cancelled() => Err(StreamFailure::Cancelled),
            item = tokio::time::timeout(limit, stream.next()) => {
                item.map_err(|_| StreamFailure::IdleTimeout(limit))
            }
        },
        None => tokio::select! {
            biased;
            _ = config.cancellation.cancelled() => Err(StreamFailure::Cancelled),
            item = stream.next() => Ok(item),
        },
    }
}

/// Assemble a streamed reply, calling `on_delta` with the cumulative text
/// after every delta.
///
/// The byte stream is owned by this call and dropped on every exit path,
/// including timeout and cancellation.
pub async fn assemble<S, B, E, F>(
    byte_stream: S,
    config: &AssemblerConfig,
    mut on_delta: F,
) -> Result<AssemblyOutcome, StreamFailure>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
    F: FnMut(&str),
{
    let mut stream = std::pin::pin!(byte_stream);
    let mut assembler = StreamAssembler::new();

    while !assembler.is_done() {
        match next_chunk(&mut stream, config).await? {
            Some(Ok(chunk)) => {
                assembler.feed(chunk.as_ref(), &mut on_delta);
            }
            Some(Err(e)) => {
                tracing::debug!(error = %e, "stream read failed");
                return Err(StreamFailure::Read(e.to_string()));
            }
            None => {
                assembler.finish(&mut on_delta);
            }
        }
    }

    if config.require_sentinel && !assembler.saw_sentinel() {
        return Err(StreamFailure::Truncated);
    }

    let outcome = assembler.into_outcome();
    tracing::debug!(
        deltas = outcome.deltas,
        malformed = outcome.malformed_frames,
        sentinel = outcome.saw_sentinel,
        "stream assembled"
    );
    Ok(outcome)
}

/// Parse a raw byte stream into a stream of [`StreamEvent`]s.
///
/// Emits one [`StreamEvent::TextDelta`] per delta (the fragment, not the
/// cumulative text), then either [`StreamEvent::Done`] or a single
/// [`StreamEvent::Error`].
pub fn event_stream<S, B, E>(
    byte_stream: S,
    config: AssemblerConfig,
) -> impl Stream<Item = StreamEvent> + Send + 'static
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    async_stream::stream! {
        let mut bytes_stream = std::pin::pin!(byte_stream);
        let mut assembler = StreamAssembler::new();

        while !assembler.is_done() {
            let next = match next_chunk(&mut bytes_stream, &config).await {
                Ok(next) => next,
                Err(failure) => {
                    yield StreamEvent::Error(failure);
                    return;
                }
            };

            let mut fragments = Vec::new();
            let mut seen = assembler.assembled().len();
            let mut sink = |text: &str| {
                fragments.push(text[seen..].to_string());
                seen = text.len();
            };
            match next {
                Some(Ok(chunk)) => {
                    assembler.feed(chunk.as_ref(), &mut sink);
                }
                Some(Err(e)) => {
                    yield StreamEvent::Error(StreamFailure::Read(e.to_string()));
                    return;
                }
                None => {
                    assembler.finish(&mut sink);
                }
            }

            for fragment in fragments {
                yield StreamEvent::TextDelta(fragment);
            }
        }

        if config.require_sentinel && !assembler.saw_sentinel() {
            yield StreamEvent::Error(StreamFailure::Truncated);
            return;
        }
        yield StreamEvent::Done;
    }
}

/// Wrap [`event_stream`] in a [`StreamHandle`].
pub fn stream_handle<S, B, E>(byte_stream: S, config: AssemblerConfig) -> StreamHandle
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    StreamHandle {
        receiver: Box::pin(event_stream(byte_stream, config)),
    }
}
