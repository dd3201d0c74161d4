//! Bounded concurrent fan-out over handler tasks.
//!
//! Requirement augmentation and capability listing query every handler at
//! once; a slow handler must not hold up the response or hide the results
//! of the others. Each task runs to completion or past the shared deadline,
//! in which case its result is discarded while the task itself keeps
//! running in the background.

use std::time::Duration;

use tokio::task::JoinHandle;

/// Why a fanned-out task produced no result.
#[derive(Debug, thiserror::Error)]
pub enum FanoutError {
    /// The task did not finish before the shared deadline.
    #[error("timed out")]
    TimedOut,
    /// The task panicked or was cancelled.
    #[error("{0}")]
    Failed(String),
}

/// Awaits every task under one shared deadline.
///
/// Results come back in task order. Tasks that miss the deadline are left
/// running detached; their eventual results are dropped.
pub async fn join_settled_with_timeout<T>(
    handles: Vec<JoinHandle<T>>,
    timeout: Duration,
) -> Vec<Result<T, FanoutError>> {
    let deadline = tokio::time::Instant::now() + timeout;
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        match tokio::time::timeout_at(deadline, handle).await {
            Ok(Ok(value)) => results.push(Ok(value)),
            Ok(Err(join_error)) => results.push(Err(FanoutError::Failed(join_error.to_string()))),
            Err(_) => results.push(Err(FanoutError::TimedOut)),
        }
    }
    results
}
