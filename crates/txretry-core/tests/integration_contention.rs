//! End-to-end: contended transfers driven through the public retry API.

use std::time::Duration;

use txretry_core::ambient;
use txretry_core::retry::{run_in_transaction, RetryError, RetryPolicy};
use txretry_core::sim::{run_simulation, SimOptions};

#[test]
fn contended_transfers_all_commit() {
    let opts = SimOptions {
        workers: 4,
        accounts: 2,
        transfers_per_worker: 50,
        policy: RetryPolicy {
            retry_attempts: 1_000,
            max_backoff: Duration::from_millis(2),
        },
    };

    let report = run_simulation(&opts).expect("simulation failed");

    assert_eq!(report.transfers, 200);
    assert_eq!(report.gave_up, 0);
    assert_eq!(report.total_balance, report.expected_balance);
}

#[test]
fn retry_boundary_refuses_an_open_transaction() {
    let _txn = ambient::begin();
    let result = run_in_transaction(&RetryPolicy::default(), || Ok(()));
    assert!(matches!(result, Err(RetryError::AmbientTransaction)));
}
