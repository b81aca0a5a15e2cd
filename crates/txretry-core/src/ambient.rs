//! Thread-local ambient transaction tracking.
//!
//! The retry loop must never run inside an open transaction: a retried
//! attempt would re-execute work inside the outer transaction instead of a
//! fresh one, and the outer transaction's atomicity would be lost.
//! Transaction owners mark their scope with [`begin`]; the retry loop asks
//! a [`TransactionProbe`] whether a scope is already open.

use std::cell::Cell;
use std::marker::PhantomData;

thread_local! {
    static TXN_DEPTH: Cell<u32> = Cell::new(0);
}

/// Query interface for "is a transaction currently active on this context?".
pub trait TransactionProbe {
    fn in_transaction(&self) -> bool;
}

/// Probe over the thread-local transaction depth maintained by [`begin`].
pub struct AmbientProbe;

impl TransactionProbe for AmbientProbe {
    fn in_transaction(&self) -> bool {
        in_transaction()
    }
}

/// True if the current thread is inside at least one [`begin`] scope.
pub fn in_transaction() -> bool {
    TXN_DEPTH.with(|d| d.get() > 0)
}

/// Mark a transaction scope open on the current thread until the returned
/// guard drops. Scopes nest.
pub fn begin() -> TxnGuard {
    TXN_DEPTH.with(|d| d.set(d.get() + 1));
    TxnGuard {
        _not_send: PhantomData,
    }
}

/// RAII marker for an open transaction scope. Must drop on the thread that
/// opened it, so the guard is not `Send`.
pub struct TxnGuard {
    _not_send: PhantomData<*const ()>,
}

impl Drop for TxnGuard {
    fn drop(&mut self) {
        TXN_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_transaction_by_default() {
        assert!(!in_transaction());
    }

    #[test]
    fn guard_opens_and_closes_a_scope() {
        {
            let _txn = begin();
            assert!(in_transaction());
        }
        assert!(!in_transaction());
    }

    #[test]
    fn scopes_nest() {
        let _outer = begin();
        {
            let _inner = begin();
            assert!(in_transaction());
        }
        assert!(in_transaction());
    }

    #[test]
    fn scope_is_per_thread() {
        let _txn = begin();
        let seen_elsewhere = std::thread::spawn(in_transaction).join().unwrap();
        assert!(!seen_elsewhere);
    }

    #[test]
    fn probe_reflects_thread_state() {
        let probe = AmbientProbe;
        assert!(!probe.in_transaction());
        let _txn = begin();
        assert!(probe.in_transaction());
    }
}
