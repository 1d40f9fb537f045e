//! Cancellation helpers shared by the agent loop and the summarizer.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Fails with [`Error::Cancelled`] if `cancel` has fired.
pub(crate) fn ensure_active(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}

/// Drives `fut` to completion unless `cancel` fires first, in which case the
/// future is dropped and [`Error::Cancelled`] is returned.
pub(crate) async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        out = fut => Ok(out),
    }
}
