//! Timeout enforcement for in-flight exchanges
//!
//! The timer starts when the exchange future is first polled. If it fires,
//! the exchange future is dropped, which closes its connection; nothing the
//! aborted exchange would have produced is observed afterwards.

use std::future::Future;
use std::time::Duration;

/// Race `future` against an optional deadline
///
/// Returns `None` if the deadline passed first. Without a deadline the future
/// simply runs to completion.
pub async fn with_timeout<F, T>(future: F, timeout: Option<Duration>) -> Option<T>
where
    F: Future<Output = T>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, future).await.ok(),
        None => Some(future.await),
    }
}
