use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries allowed after the first attempt.
    pub retry_attempts: u32,
    /// Maximum backoff delay in milliseconds.
    pub max_backoff_millis: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 10,
            max_backoff_millis: 30_000,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> RetryPolicy {
        RetryPolicy {
            retry_attempts: cfg.retry_attempts,
            max_backoff: Duration::from_millis(cfg.max_backoff_millis),
        }
    }
}

/// Global configuration loaded from `~/.config/txretry/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxretryConfig {
    /// Concurrent workers in the contention simulation.
    pub workers: usize,
    /// Accounts in the simulated store; fewer accounts means more conflicts.
    pub accounts: usize,
    /// Transfers each worker performs.
    pub transfers_per_worker: usize,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for TxretryConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            accounts: 4,
            transfers_per_worker: 100,
            retry: None,
        }
    }
}

/// Effective retry policy for a loaded config.
pub fn retry_policy(cfg: &TxretryConfig) -> RetryPolicy {
    cfg.retry.as_ref().map(RetryPolicy::from).unwrap_or_default()
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("txretry")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<TxretryConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = TxretryConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: TxretryConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = TxretryConfig::default();
        assert_eq!(cfg.workers, 8);
        assert_eq!(cfg.accounts, 4);
        assert_eq!(cfg.transfers_per_worker, 100);
        assert!(cfg.retry.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = TxretryConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: TxretryConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.workers, cfg.workers);
        assert_eq!(parsed.accounts, cfg.accounts);
        assert_eq!(parsed.transfers_per_worker, cfg.transfers_per_worker);
    }

    #[test]
    fn config_toml_with_retry_section() {
        let toml = r#"
            workers = 2
            accounts = 16
            transfers_per_worker = 50

            [retry]
            retry_attempts = 3
            max_backoff_millis = 15000
        "#;
        let cfg: TxretryConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.workers, 2);
        assert_eq!(cfg.accounts, 16);
        let retry = cfg.retry.as_ref().unwrap();
        assert_eq!(retry.retry_attempts, 3);
        assert_eq!(retry.max_backoff_millis, 15_000);
    }

    #[test]
    fn retry_section_maps_onto_policy() {
        let mut cfg = TxretryConfig::default();
        let defaults = retry_policy(&cfg);
        assert_eq!(defaults.retry_attempts, 10);
        assert_eq!(defaults.max_backoff, Duration::from_millis(30_000));

        cfg.retry = Some(RetryConfig {
            retry_attempts: 2,
            max_backoff_millis: 500,
        });
        let policy = retry_policy(&cfg);
        assert_eq!(policy.retry_attempts, 2);
        assert_eq!(policy.max_backoff, Duration::from_millis(500));
    }
}
