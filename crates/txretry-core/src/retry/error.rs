//! Retry controller error type.

use thiserror::Error;

/// Terminal outcome of a retry loop, distinguishable from the business
/// errors raised by the unit of work itself so callers can branch on it.
#[derive(Debug, Error)]
pub enum RetryError {
    /// The retry budget is spent and the work still fails transiently.
    #[error("too many serialization failures ({attempts} of max {retry_attempts}); giving up")]
    Exhausted {
        /// Attempts actually made (including the first).
        attempts: u32,
        /// Retries the policy allowed after the first attempt.
        retry_attempts: u32,
    },

    /// A transaction was already active when the retry loop was entered.
    /// Retrying inside an outer transaction would corrupt its atomicity,
    /// so this is reported before any attempt and never retried.
    #[error("active transaction detected at the retry boundary; the retry wrapper must run outside transaction scope")]
    AmbientTransaction,

    /// The abort token was set while the loop was running or waiting.
    #[error("retry loop aborted")]
    Aborted,

    /// Non-retryable failure, propagated unchanged from the unit of work.
    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}
