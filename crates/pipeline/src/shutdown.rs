//! Run-wide cancellation and first-error capture
//!
//! Every pipeline stage holds the same [`Shutdown`]. The first stage to hit
//! a fatal error records it and cancels the token; the others notice at
//! their next channel operation and wind down. Later errors are logged and
//! dropped so the run reports the root cause.

use parking_lot::Mutex;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, error};

use crate::error::PipelineError;

#[derive(Debug, Default)]
pub struct Shutdown {
    token: CancellationToken,
    first_error: Mutex<Option<PipelineError>>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fatal error and cancel the run
    pub fn fail(&self, err: PipelineError) {
        {
            let mut slot = self.first_error.lock();
            if slot.is_none() {
                error!(error = %err, "pipeline failed, shutting down");
                *slot = Some(err);
            } else {
                debug!(error = %err, "additional error during shutdown");
            }
        }
        self.token.cancel();
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Take the recorded error, if any
    pub fn take_error(&self) -> Option<PipelineError> {
        self.first_error.lock().take()
    }
}
