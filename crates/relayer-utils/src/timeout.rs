use std::future::Future;
use std::time::Duration;

use crate::{Error, Result};

/// Runs `fut` with a deadline, turning an elapsed deadline into [`Error::Timeout`].
///
/// A zero `after` disables the deadline.
pub async fn with_timeout<F, T>(
    call: &'static str,
    after: Duration,
    fut: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if after.is_zero() {
        return fut.await;
    }
    tokio::time::timeout(after, fut)
        .await
        .map_err(|_| Error::Timeout { call, after })?
}
