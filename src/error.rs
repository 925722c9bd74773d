/*!
 * Wait Operation Errors
 */

use thiserror::Error;

/// Result type for fallible wait-queue operations
pub type WaitResult<T> = Result<T, WaitError>;

/// Wait-queue errors
///
/// Contention is never an error: CAS retries are internal, wake races have a
/// single winner, and deadline expiry is a normal return. These variants cover
/// illegal use and malformed arguments only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WaitError {
    /// A second thread attempted to register on an exclusive queue whose
    /// slot is already owned. The caller must serialize use of the queue.
    #[error("another thread already owns the exclusive wait slot")]
    AlreadyRegistered,

    /// Spin budget above [`MAX_SPIN_ITERATIONS`](crate::MAX_SPIN_ITERATIONS).
    #[error("spin budget of {0} iterations exceeds the supported maximum")]
    SpinBudgetTooLarge(u32),
}
