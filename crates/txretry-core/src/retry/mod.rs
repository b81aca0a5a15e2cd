//! Transaction retry and backoff policy.
//!
//! This module encapsulates error classification (serialization failures
//! vs. everything else) and exponential backoff decisions so that any
//! idempotent transactional unit of work can be wrapped in a retry loop.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, sql_state, Classification, SERIALIZATION_FAILURE};
pub use error::RetryError;
pub use policy::{RetryDecision, RetryPolicy};
pub use run::{run_in_transaction, run_with_retry};
