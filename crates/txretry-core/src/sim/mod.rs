//! Contention harness: hammer the versioned store from worker threads and
//! report how the retry engine behaved.
//!
//! Each worker performs random transfers through [`run_in_transaction`],
//! so every conflict exercises the full classify/backoff/retry path. The
//! report carries enough to verify the engine end to end: every committed
//! transfer, every retried conflict, and balance conservation.

pub mod store;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use rand::Rng;

use crate::retry::{self, RetryError, RetryPolicy};
use store::VersionedStore;

const INITIAL_BALANCE: i64 = 1_000;

/// Parameters for one simulation run.
#[derive(Debug, Clone, Copy)]
pub struct SimOptions {
    /// Concurrent worker threads.
    pub workers: usize,
    /// Accounts in the store; fewer accounts means more conflicts.
    pub accounts: usize,
    /// Transfers each worker performs.
    pub transfers_per_worker: usize,
    pub policy: RetryPolicy,
}

/// Outcome of a simulation run.
#[derive(Debug, Clone, Copy)]
pub struct SimReport {
    /// Transfers committed.
    pub transfers: u64,
    /// Transient conflicts that triggered a retry.
    pub conflicts: u64,
    /// Transfers abandoned after exhausting the retry budget.
    pub gave_up: u64,
    pub elapsed_secs: f64,
    pub total_balance: i64,
    pub expected_balance: i64,
}

/// Runs `workers` threads of contended transfers through the retry engine.
pub fn run_simulation(opts: &SimOptions) -> Result<SimReport> {
    anyhow::ensure!(opts.workers > 0, "need at least one worker");
    anyhow::ensure!(opts.accounts >= 2, "need at least two accounts");

    let SimOptions {
        workers,
        accounts,
        transfers_per_worker,
        policy,
    } = *opts;

    let store = Arc::new(VersionedStore::new(accounts, INITIAL_BALANCE));
    let start = Instant::now();

    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let store = Arc::clone(&store);
        handles.push(std::thread::spawn(move || -> Result<(u64, u64, u64)> {
            let mut commits = 0u64;
            let mut conflicts = 0u64;
            let mut gave_up = 0u64;
            let mut rng = rand::rng();

            for _ in 0..transfers_per_worker {
                let from = rng.random_range(0..accounts);
                let mut to = rng.random_range(0..accounts - 1);
                if to >= from {
                    to += 1;
                }

                let mut attempts = 0u64;
                let result = retry::run_in_transaction(&policy, || {
                    attempts += 1;
                    store.transfer(from, to, 1)
                });
                conflicts += attempts.saturating_sub(1);

                match result {
                    Ok(()) => commits += 1,
                    Err(RetryError::Exhausted { .. }) => gave_up += 1,
                    Err(err) => return Err(err.into()),
                }
            }
            Ok((commits, conflicts, gave_up))
        }));
    }

    let mut transfers = 0u64;
    let mut conflicts = 0u64;
    let mut gave_up = 0u64;
    for handle in handles {
        let (c, k, g) = handle
            .join()
            .map_err(|_| anyhow::anyhow!("simulation worker panicked"))??;
        transfers += c;
        conflicts += k;
        gave_up += g;
    }

    Ok(SimReport {
        transfers,
        conflicts,
        gave_up,
        elapsed_secs: start.elapsed().as_secs_f64(),
        total_balance: store.total_balance(),
        expected_balance: accounts as i64 * INITIAL_BALANCE,
    })
}
