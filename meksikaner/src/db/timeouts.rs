//! Database query timeout helpers
//!
//! Bounds every store call so a stuck connection surfaces as an error
//! instead of a hung game actor.

use std::{future::Future, time::Duration};
use tokio::time::timeout;

/// Default timeout for single queries (5 seconds)
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for transactions (10 seconds)
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for long-running operations such as migrations (30 seconds)
pub const LONG_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Operation did not finish in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Database operation timed out after {0:?}")]
pub struct TimeoutError(pub Duration);

/// Run `future` with a deadline
///
/// # Arguments
///
/// * `duration` - Timeout duration
/// * `future` - Async operation to execute
///
/// # Returns
///
/// * `Result<T, E>` - The operation's own result, or `E::from(TimeoutError)`
///
/// # Example
///
/// ```no_run
/// use meksikaner::db::timeouts::{with_timeout, DEFAULT_QUERY_TIMEOUT};
/// use meksikaner::session::GameError;
/// # use sqlx::PgPool;
/// # async fn example(pool: &PgPool) -> Result<(), GameError> {
///
/// with_timeout(DEFAULT_QUERY_TIMEOUT, async {
///     sqlx::query("SELECT 1").execute(pool).await?;
///     Ok::<_, GameError>(())
/// })
/// .await?;
///
/// # Ok(())
/// # }
/// ```
pub async fn with_timeout<F, T, E>(duration: Duration, future: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<TimeoutError>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(TimeoutError(duration).into()),
    }
}

/// Run a single query with the default timeout (5 seconds)
pub async fn with_default_timeout<F, T, E>(future: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<TimeoutError>,
{
    with_timeout(DEFAULT_QUERY_TIMEOUT, future).await
}

/// Run a transaction with the transaction timeout (10 seconds)
pub async fn with_transaction_timeout<F, T, E>(future: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<TimeoutError>,
{
    with_timeout(DEFAULT_TRANSACTION_TIMEOUT, future).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        TimedOut,
        Failed,
    }

    impl From<TimeoutError> for TestError {
        fn from(_: TimeoutError) -> Self {
            TestError::TimedOut
        }
    }

    #[test]
    fn test_timeout_constants() {
        assert_eq!(DEFAULT_QUERY_TIMEOUT.as_secs(), 5);
        assert_eq!(DEFAULT_TRANSACTION_TIMEOUT.as_secs(), 10);
        assert_eq!(LONG_OPERATION_TIMEOUT.as_secs(), 30);
    }

    #[test]
    fn test_timeout_error_display() {
        let err = TimeoutError(Duration::from_secs(5));
        assert!(err.to_string().contains("timed out"));
        assert!(err.to_string().contains("5s"));
    }

    #[tokio::test]
    async fn test_passes_through_result() {
        let ok: Result<u8, TestError> = with_default_timeout(async { Ok(3) }).await;
        assert_eq!(ok, Ok(3));

        let failed: Result<u8, TestError> =
            with_default_timeout(async { Err(TestError::Failed) }).await;
        assert_eq!(failed, Err(TestError::Failed));
    }

    #[tokio::test]
    async fn test_slow_future_times_out() {
        let result: Result<(), TestError> = with_timeout(Duration::from_millis(20), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert_eq!(result, Err(TestError::TimedOut));
    }
}
