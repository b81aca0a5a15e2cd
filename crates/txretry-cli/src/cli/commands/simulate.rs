//! `txretry simulate` – contended transfers through the retry engine.

use std::time::Duration;

use anyhow::Result;
use txretry_core::config::{self, TxretryConfig};
use txretry_core::sim::{self, SimOptions, SimReport};

fn print_report(report: &SimReport) {
    println!(
        "  {:>10}  {:>10}  {:>8}  {:>8}",
        "Committed", "Conflicts", "GaveUp", "Time(s)"
    );
    println!(
        "  {}  {}  {}  {}",
        "----------", "----------", "--------", "--------"
    );
    println!(
        "  {:>10}  {:>10}  {:>8}  {:>8.2}",
        report.transfers, report.conflicts, report.gave_up, report.elapsed_secs
    );
    if report.total_balance == report.expected_balance {
        println!("Balance conserved: {}", report.total_balance);
    } else {
        println!(
            "BALANCE MISMATCH: expected {}, found {}",
            report.expected_balance, report.total_balance
        );
    }
}

pub fn run_simulate(
    cfg: &TxretryConfig,
    workers: Option<usize>,
    accounts: Option<usize>,
    transfers: Option<usize>,
    retry_attempts: Option<u32>,
    max_backoff_ms: Option<u64>,
) -> Result<()> {
    let mut policy = config::retry_policy(cfg);
    if let Some(n) = retry_attempts {
        policy.retry_attempts = n;
    }
    if let Some(ms) = max_backoff_ms {
        policy.max_backoff = Duration::from_millis(ms);
    }

    let opts = SimOptions {
        workers: workers.unwrap_or(cfg.workers),
        accounts: accounts.unwrap_or(cfg.accounts),
        transfers_per_worker: transfers.unwrap_or(cfg.transfers_per_worker),
        policy,
    };

    tracing::info!(
        workers = opts.workers,
        accounts = opts.accounts,
        transfers_per_worker = opts.transfers_per_worker,
        retry_attempts = policy.retry_attempts,
        max_backoff_ms = policy.max_backoff.as_millis() as u64,
        "starting contention simulation"
    );

    let report = sim::run_simulation(&opts)?;
    print_report(&report);
    Ok(())
}
