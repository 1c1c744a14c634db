//! Deadlines and cancellation for remote calls.

use rollcall_core::error::{AttendanceError, Result};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Run `call`, failing with `Timeout` once `limit` passes
pub(crate) async fn with_timeout<T, F>(operation: &str, limit: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, seconds = limit.as_secs(), "Remote call timed out");
            Err(AttendanceError::Timeout {
                operation: operation.to_string(),
                seconds: limit.as_secs(),
            })
        }
    }
}

/// Like `with_timeout`, but abandons the call when `cancel` fires.
///
/// A result that arrives after cancellation is dropped unseen.
pub(crate) async fn guarded<T, F>(
    cancel: &CancellationToken,
    operation: &str,
    limit: Duration,
    call: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!(operation, "Call abandoned after cancellation");
            Err(AttendanceError::Cancelled)
        }
        result = with_timeout(operation, limit, call) => result,
    }
}
