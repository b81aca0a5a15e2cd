//! Retry loop: run a transactional unit of work until it commits, the
//! retry budget is spent, or a non-retryable error surfaces.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::classify::{classify, db_error_cause, sql_state, Classification};
use super::error::RetryError;
use super::policy::{RetryDecision, RetryPolicy};
use crate::ambient::{AmbientProbe, TransactionProbe};

/// Granularity of the backoff sleep; the abort token is observed at least
/// this often while waiting.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Runs `work` until it succeeds or retries are exhausted, retrying only
/// serialization failures (SQLSTATE 40001) with exponential backoff.
///
/// `work` must be idempotent, and every invocation must begin a brand-new
/// transaction and commit or roll it back before returning; the loop never
/// carries a transaction across attempts. `probe` is consulted once on
/// entry: an already-active transaction means the wrapper was wired inside
/// transaction demarcation instead of around it, and fails fast without
/// invoking the work.
///
/// When `abort` is set by another thread the loop stops at the next check
/// with [`RetryError::Aborted`]; the token is left set so the signal is
/// never swallowed.
pub fn run_with_retry<T, F>(
    policy: &RetryPolicy,
    probe: &dyn TransactionProbe,
    abort: Option<&AtomicBool>,
    mut work: F,
) -> Result<T, RetryError>
where
    F: FnMut() -> anyhow::Result<T>,
{
    if probe.in_transaction() {
        return Err(RetryError::AmbientTransaction);
    }

    let start = Instant::now();
    let mut attempt = 0u32;

    loop {
        if aborted(abort) {
            return Err(RetryError::Aborted);
        }

        let err = match work() {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(
                        attempts = attempt + 1,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "recovered from transient serialization failures"
                    );
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if classify(&err) == Classification::Fatal {
            log_fatal(&err);
            return Err(RetryError::Fatal(err));
        }

        attempt += 1;
        match policy.decide(attempt) {
            RetryDecision::GiveUp => {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    retry_attempts: policy.retry_attempts,
                });
            }
            RetryDecision::RetryAfter(delay) => {
                let state = sql_state(&err).unwrap_or_default();
                tracing::warn!(
                    sql_state = %state,
                    backoff_ms = delay.as_millis() as u64,
                    attempt,
                    retry_attempts = policy.retry_attempts,
                    "transient serialization failure; backing off before retry: {}",
                    err.root_cause()
                );
                if !backoff_sleep(delay, abort) {
                    return Err(RetryError::Aborted);
                }
            }
        }
    }
}

/// Common-path wrapper: retry `work` against the thread-local ambient
/// transaction probe, with no abort token.
pub fn run_in_transaction<T, F>(policy: &RetryPolicy, work: F) -> Result<T, RetryError>
where
    F: FnMut() -> anyhow::Result<T>,
{
    run_with_retry(policy, &AmbientProbe, None, work)
}

/// Log every nested cause of a non-retryable database error before it is
/// propagated. Drivers chain further errors onto the first for batched
/// statements; each is worth a line of diagnostics.
fn log_fatal(err: &anyhow::Error) {
    if let Some(db) = db_error_cause(err) {
        for nested in db.iter() {
            tracing::warn!(
                sql_state = nested.sql_state().unwrap_or(""),
                vendor_code = nested.vendor_code().unwrap_or(0),
                "non-retryable database error: {}",
                nested.message()
            );
        }
    } else if let Some(state) = sql_state(err) {
        tracing::warn!(
            sql_state = %state,
            "non-retryable database error: {}",
            err.root_cause()
        );
    }
}

/// Sleep `delay` in slices, watching the abort token. Returns false if the
/// token was set before the full delay elapsed.
fn backoff_sleep(delay: Duration, abort: Option<&AtomicBool>) -> bool {
    let deadline = Instant::now() + delay;
    loop {
        if aborted(abort) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep((deadline - now).min(SLEEP_SLICE));
    }
}

fn aborted(abort: Option<&AtomicBool>) -> bool {
    abort.map(|a| a.load(Ordering::Relaxed)).unwrap_or(false)
}
