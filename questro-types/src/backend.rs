//! The chat backend trait: one streamed reply per request.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::ChatError;
use crate::stream::AssemblyOutcome;
use crate::types::ChatRequest;

/// Something that turns a [`ChatRequest`] into a streamed reply.
///
/// `on_delta` receives the cumulative reply text after every delta, in
/// arrival order. Implementations check `cancel` at every suspension point and
/// return `ChatError::Stream(StreamFailure::Cancelled)` once it fires.
///
/// The HTTP client is the production implementation; tests script replies.
pub trait ChatBackend: Send + Sync {
    /// Send the request and assemble the streamed reply.
    fn stream_chat<'a>(
        &'a self,
        request: &'a ChatRequest,
        cancel: CancellationToken,
        on_delta: &'a mut (dyn FnMut(&str) + Send),
    ) -> impl Future<Output = Result<AssemblyOutcome, ChatError>> + Send + 'a;
}
