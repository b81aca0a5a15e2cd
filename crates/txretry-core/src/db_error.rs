//! Driver-level database error model.
//!
//! Mirrors what SQL drivers expose on a failed statement: the SQLSTATE, a
//! vendor-specific numeric code, a message, and (for batched statements) a
//! chain of further errors. The classifier looks for this type in an
//! error's cause chain when deciding whether an attempt is retryable.

use std::fmt;

/// One database error, possibly chained to further errors from the same
/// failed batch. The chain is diagnostic only and deliberately not exposed
/// through `source()`; causes and batch siblings are different things.
#[derive(Debug)]
pub struct DbError {
    sql_state: Option<String>,
    vendor_code: Option<i64>,
    message: String,
    next: Option<Box<DbError>>,
}

impl DbError {
    pub fn new(sql_state: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            sql_state: sql_state.map(str::to_owned),
            vendor_code: None,
            message: message.into(),
            next: None,
        }
    }

    /// Serialization failure (SQLSTATE 40001): the transaction lost a race
    /// and may safely be retried.
    pub fn serialization_failure(message: impl Into<String>) -> Self {
        Self::new(Some(crate::retry::SERIALIZATION_FAILURE), message)
    }

    pub fn with_vendor_code(mut self, code: i64) -> Self {
        self.vendor_code = Some(code);
        self
    }

    /// Append an error to the end of the chain.
    pub fn chain(mut self, next: DbError) -> Self {
        self.push(next);
        self
    }

    fn push(&mut self, next: DbError) {
        match &mut self.next {
            Some(tail) => tail.push(next),
            None => self.next = Some(Box::new(next)),
        }
    }

    pub fn sql_state(&self) -> Option<&str> {
        self.sql_state.as_deref()
    }

    pub fn vendor_code(&self) -> Option<i64> {
        self.vendor_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Iterate this error and every chained error, in order.
    pub fn iter(&self) -> Chain<'_> {
        Chain { cur: Some(self) }
    }

    /// Bridge from the sqlx driver: database-side errors carry a code and
    /// message; client-side failures (pool, decode, io) have no SQLSTATE
    /// and yield `None`.
    pub fn from_sqlx(err: &sqlx::Error) -> Option<DbError> {
        match err {
            sqlx::Error::Database(db) => {
                let mut out = DbError::new(db.code().as_deref(), db.message());
                if let Some(code) = db.code().and_then(|c| c.parse::<i64>().ok()) {
                    out = out.with_vendor_code(code);
                }
                Some(out)
            }
            _ => None,
        }
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sql_state {
            Some(state) => write!(f, "[{}] {}", state, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for DbError {}

/// Iterator over a [`DbError`] and its chained errors.
pub struct Chain<'a> {
    cur: Option<&'a DbError>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a DbError;

    fn next(&mut self) -> Option<&'a DbError> {
        let cur = self.cur.take()?;
        self.cur = cur.next.as_deref();
        Some(cur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    #[test]
    fn display_includes_state_when_present() {
        let err = DbError::serialization_failure("restart transaction");
        assert_eq!(err.to_string(), "[40001] restart transaction");

        let bare = DbError::new(None, "connection reset");
        assert_eq!(bare.to_string(), "connection reset");
    }

    #[test]
    fn chain_preserves_order() {
        let err = DbError::new(Some("23505"), "first")
            .chain(DbError::new(Some("23503"), "second"))
            .chain(DbError::new(None, "third"));
        let messages: Vec<&str> = err.iter().map(DbError::message).collect();
        assert_eq!(messages, ["first", "second", "third"]);
        let states: Vec<Option<&str>> = err.iter().map(DbError::sql_state).collect();
        assert_eq!(states, [Some("23505"), Some("23503"), None]);
    }

    #[test]
    fn chained_errors_are_not_sources() {
        let err = DbError::new(Some("23505"), "first").chain(DbError::new(None, "second"));
        assert!(std::error::Error::source(&err).is_none());
    }

    #[tokio::test]
    async fn from_sqlx_extracts_code_and_message() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        let err = sqlx::query("SELECT * FROM missing_table")
            .execute(&pool)
            .await
            .unwrap_err();

        let db = DbError::from_sqlx(&err).expect("database-side error");
        assert_eq!(db.sql_state(), Some("1"));
        assert_eq!(db.vendor_code(), Some(1));
        assert!(db.message().contains("missing_table"), "{}", db.message());
    }

    #[test]
    fn from_sqlx_ignores_client_side_errors() {
        assert!(DbError::from_sqlx(&sqlx::Error::RowNotFound).is_none());
    }
}
