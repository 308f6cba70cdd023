//! Cross-task cancellation of the in-flight exchange.

use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;

/// Holds the token of the exchange currently in flight, if any.
#[derive(Debug, Clone, Default)]
pub(crate) struct CancelSlot(Arc<Mutex<Option<CancellationToken>>>);

impl CancelSlot {
    pub(crate) fn arm(&self, token: CancellationToken) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    pub(crate) fn disarm(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    fn cancel(&self) -> bool {
        match self.0.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

/// Cancels whatever exchange its session has in flight.
///
/// Obtained from [`ChatSession::cancel_handle`](crate::ChatSession::cancel_handle)
/// and usable from any task, e.g. a Ctrl-C watcher.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    pub(crate) slot: CancelSlot,
}

impl CancelHandle {
    /// Cancel the in-flight exchange. Returns `false` if nothing was in flight.
    pub fn cancel(&self) -> bool {
        let cancelled = self.slot.cancel();
        if cancelled {
            tracing::debug!("in-flight exchange cancelled");
        }
        cancelled
    }
}
