//! Classify failed-attempt errors into transient serialization conflicts
//! and everything else.

use crate::db_error::DbError;

/// SQLSTATE reported by serializable databases when a transaction loses a
/// race with a concurrent transaction and should be restarted (deadlock
/// victim, optimistic and pessimistic locking failures).
pub const SERIALIZATION_FAILURE: &str = "40001";

/// Outcome of classifying one failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Serialization conflict; the attempt may safely be retried.
    Transient,
    /// Anything else; propagate to the caller without retrying.
    Fatal,
}

/// Classify an error raised by one transactional attempt.
///
/// Transient iff the most specific database-layer cause carries SQLSTATE
/// 40001. Errors with any other code, and errors with no database cause at
/// all (the unit of work failed outside the database), are fatal.
pub fn classify(err: &anyhow::Error) -> Classification {
    match sql_state(err) {
        Some(state) if state == SERIALIZATION_FAILURE => Classification::Transient,
        _ => Classification::Fatal,
    }
}

/// SQLSTATE of the most specific database-layer cause, if any.
///
/// Adapter layers routinely wrap driver errors (context wrappers, pool
/// errors), so the cause chain is scanned from the root cause upward and
/// the first cause that carries a SQL error code wins. Both the crate's
/// own [`DbError`] and raw `sqlx` database errors are recognized.
pub fn sql_state(err: &anyhow::Error) -> Option<String> {
    for cause in err.chain().rev() {
        if let Some(db) = cause.downcast_ref::<DbError>() {
            return db.sql_state().map(str::to_owned);
        }
        if let Some(sqlx::Error::Database(db)) = cause.downcast_ref::<sqlx::Error>() {
            return db.code().map(|c| c.into_owned());
        }
    }
    None
}

/// The most specific [`DbError`] cause, when the chain has one. Used for
/// per-cause diagnostics on fatal errors.
pub(crate) fn db_error_cause(err: &anyhow::Error) -> Option<&DbError> {
    err.chain().rev().find_map(|c| c.downcast_ref::<DbError>())
}
