use thiserror::Error;

use crate::notice::Notice;
use crate::value::Literal;

/// A specific statement failed. The physical connection remains healthy and
/// reusable; the error carries the rendered SQL, the ordered parameters, and
/// any notices observed during that one statement.
#[derive(Debug, Error)]
#[error("statement failed: {source} (sql: {sql})")]
pub struct SqlError {
    /// The rendered SQL text that was executed
    pub sql: String,
    /// The positional parameters, in placeholder order
    pub params: Vec<Literal>,
    /// Notices captured while this statement ran
    pub notices: Vec<Notice>,
    /// The underlying backend error
    #[source]
    pub source: tokio_postgres::Error,
}

/// A rollback attempt, itself following a failure inside a transaction, also
/// failed. The physical client's state is now unknown and it must be evicted
/// from the pool. Both failures are preserved so operators can diagnose
/// either.
#[derive(Debug, Error)]
#[error("transaction aborted: {original}; rollback also failed: {rollback}")]
pub struct TransactionAbortedError {
    /// The failure that triggered the rollback
    pub original: Box<PgComposeError>,
    /// The failure of the rollback statement itself
    pub rollback: Box<PgComposeError>,
}

#[derive(Debug, Error)]
pub enum PgComposeError {
    /// A client could not be acquired or established. Not recoverable locally.
    #[error("connection error: {0}")]
    Connection(String),

    /// A statement failed; recoverable at the statement level.
    #[error(transparent)]
    Sql(#[from] SqlError),

    /// A rollback failed after a statement failure; the client is poisoned.
    #[error(transparent)]
    TransactionAborted(#[from] TransactionAbortedError),

    #[error("configuration error: {0}")]
    Config(String),

    /// Template chunks and values did not line up.
    #[error("template error: {0}")]
    Template(String),

    /// Caller-supplied failure surfaced out of a transaction block.
    #[error("{0}")]
    Other(String),
}

impl PgComposeError {
    /// Whether this failure leaves the physical client in an unknown state.
    ///
    /// A poisoning error means the client must be evicted from the pool
    /// rather than reused. Only a failed rollback poisons; ordinary statement
    /// failures never do.
    #[must_use]
    pub fn poisons_connection(&self) -> bool {
        matches!(self, PgComposeError::TransactionAborted(_))
    }
}
