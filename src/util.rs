//! Async helpers for callers running on tokio.

use std::time::Duration;

use tokio::task::spawn_blocking;
use tokio::time::timeout;

use crate::core::task::TaskNode;
use crate::invalidation::{InvalidationReport, InvalidationRequest, Invalidator};
use crate::{Error, Result};

pub async fn blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    spawn_blocking(f)
        .await
        .map_err(|e| Error::TaskJoin(e.to_string()))?
}

/// Note: on timeout the blocking closure keeps running to completion in the
/// background; only the caller stops waiting.
pub async fn blocking_with_timeout<F, T>(duration: Duration, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match timeout(duration, spawn_blocking(f)).await {
        Ok(Ok(inner)) => inner,
        Ok(Err(join_err)) => Err(Error::TaskJoin(join_err.to_string())),
        Err(_) => Err(Error::Timeout(duration)),
    }
}

/// Run a sequential downstream invalidation on the blocking pool.
pub async fn invalidate_downstream_blocking<T>(
    invalidator: Invalidator,
    request: InvalidationRequest<T>,
) -> Result<InvalidationReport>
where
    T: TaskNode + Send + 'static,
{
    blocking(move || invalidator.invalidate_downstream(&request)).await
}

pub async fn invalidate_downstream_with_timeout<T>(
    duration: Duration,
    invalidator: Invalidator,
    request: InvalidationRequest<T>,
) -> Result<InvalidationReport>
where
    T: TaskNode + Send + 'static,
{
    blocking_with_timeout(duration, move || {
        invalidator.invalidate_downstream(&request)
    })
    .await
}
