//! Actor runtime error types.

use flight_net::NetError;

/// Errors raised by the actor runtime.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The bus failed to connect, subscribe or close.
    #[error("bus error: {0}")]
    Net(#[from] NetError),

    /// The worker pool's semaphore was closed while waiting for a permit.
    #[error("worker pool closed")]
    PoolClosed,

    /// In-flight handlers did not finish before the drain timeout.
    #[error("drain timed out with {remaining} handler(s) still running")]
    DrainTimeout {
        /// Handlers aborted when the timeout elapsed.
        remaining: usize,
    },
}
