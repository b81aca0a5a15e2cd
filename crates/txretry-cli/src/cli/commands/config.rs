//! `txretry config` – show the resolved configuration.

use anyhow::Result;
use txretry_core::config::{self, TxretryConfig};

pub fn run_config(cfg: &TxretryConfig) -> Result<()> {
    let policy = config::retry_policy(cfg);
    println!("config file: {}", config::config_path()?.display());
    println!("workers:              {}", cfg.workers);
    println!("accounts:             {}", cfg.accounts);
    println!("transfers_per_worker: {}", cfg.transfers_per_worker);
    println!("retry_attempts:       {}", policy.retry_attempts);
    println!("max_backoff:          {} ms", policy.max_backoff.as_millis());
    Ok(())
}
