//! Transaction and savepoint state machine.
//!
//! A root transaction and its arbitrarily nested savepoints share one pinned
//! physical client; exclusivity is enforced by `&mut` ownership of the
//! [`Connection`], so no other operation can interleave statements while a
//! transaction block is running.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use futures_util::future::BoxFuture;

use crate::connection::Connection;
use crate::error::{PgComposeError, TransactionAbortedError};
use crate::fragment::Fragment;
use crate::results::{ResultSet, Row};
use crate::value::Literal;

/// Lifecycle of one transaction instance. `Active` is the only state in
/// which statements run; the other three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    /// Created but begin has not run yet
    Idle,
    /// Begin succeeded; statements may run
    Active,
    /// Commit succeeded
    Committed,
    /// Rollback succeeded after a failure
    RolledBack,
    /// Rollback itself failed; the client is poisoned
    Aborted,
}

impl TxState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TxState::Committed | TxState::RolledBack | TxState::Aborted
        )
    }

    fn code(self) -> u8 {
        match self {
            TxState::Idle => 0,
            TxState::Active => 1,
            TxState::Committed => 2,
            TxState::RolledBack => 3,
            TxState::Aborted => 4,
        }
    }

    fn from_code(code: u8) -> TxState {
        match code {
            0 => TxState::Idle,
            1 => TxState::Active,
            2 => TxState::Committed,
            3 => TxState::RolledBack,
            _ => TxState::Aborted,
        }
    }
}

/// A cloneable handle onto one transaction level's lifecycle state.
///
/// The handle outlives the [`Transaction`] it came from, so a block can keep
/// a clone and observe the terminal state (`Committed`, `RolledBack`,
/// `Aborted`) after the block has finished.
#[derive(Debug, Clone)]
pub struct TxStatus {
    inner: Arc<AtomicU8>,
}

impl TxStatus {
    fn new() -> Self {
        TxStatus {
            inner: Arc::new(AtomicU8::new(TxState::Idle.code())),
        }
    }

    /// The current state of the transaction level this handle watches.
    #[must_use]
    pub fn get(&self) -> TxState {
        TxState::from_code(self.inner.load(Ordering::Acquire))
    }

    fn set(&self, state: TxState) {
        self.inner.store(state.code(), Ordering::Release);
    }
}

#[derive(Debug, Clone)]
enum TxKind {
    Root,
    Savepoint(String),
}

/// Either the root transaction or a savepoint nested somewhere below it.
///
/// Every context holds the root's counter cell; savepoint names are minted
/// from it at child-creation time, so they stay unique for the lifetime of
/// one physical transaction regardless of nesting depth or sibling count.
#[derive(Debug, Clone)]
pub struct TxContext {
    kind: TxKind,
    counter: Arc<AtomicU64>,
}

impl TxContext {
    /// A fresh root context with its own savepoint counter.
    #[must_use]
    pub fn root() -> Self {
        TxContext {
            kind: TxKind::Root,
            counter: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Mint a savepoint context bound to the same root counter.
    #[must_use]
    pub fn child(&self) -> TxContext {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        TxContext {
            kind: TxKind::Savepoint(format!("sp_{n}")),
            counter: Arc::clone(&self.counter),
        }
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        matches!(self.kind, TxKind::Root)
    }

    /// The savepoint name, or `None` for the root.
    #[must_use]
    pub fn savepoint_name(&self) -> Option<&str> {
        match &self.kind {
            TxKind::Root => None,
            TxKind::Savepoint(name) => Some(name),
        }
    }

    #[must_use]
    pub fn begin_sql(&self) -> String {
        match &self.kind {
            TxKind::Root => "begin".to_string(),
            TxKind::Savepoint(name) => format!("savepoint {name}"),
        }
    }

    #[must_use]
    pub fn commit_sql(&self) -> String {
        match &self.kind {
            TxKind::Root => "commit".to_string(),
            TxKind::Savepoint(name) => format!("release savepoint {name}"),
        }
    }

    #[must_use]
    pub fn rollback_sql(&self) -> String {
        match &self.kind {
            TxKind::Root => "rollback".to_string(),
            TxKind::Savepoint(name) => format!("rollback to savepoint {name}"),
        }
    }
}

/// A live transaction (root or savepoint) pinned to one connection.
///
/// All statement methods delegate to the pinned connection, so everything a
/// block issues runs on the same physical client, in order.
pub struct Transaction<'c> {
    conn: &'c mut Connection,
    ctx: TxContext,
    status: TxStatus,
}

impl Transaction<'_> {
    /// The current lifecycle state; `Active` while a block is running.
    #[must_use]
    pub fn state(&self) -> TxState {
        self.status.get()
    }

    /// A handle onto this level's lifecycle state. The handle stays valid
    /// after the block returns, reporting the terminal state the level
    /// reached.
    #[must_use]
    pub fn status(&self) -> TxStatus {
        self.status.clone()
    }

    /// The context of this transaction level.
    #[must_use]
    pub fn context(&self) -> &TxContext {
        &self.ctx
    }

    /// See [`Connection::query`].
    ///
    /// # Errors
    /// Same failure modes as [`Connection::query`].
    pub async fn query(&mut self, fragment: &Fragment) -> Result<ResultSet, PgComposeError> {
        self.conn.query(fragment).await
    }

    /// See [`Connection::row`].
    ///
    /// # Errors
    /// Same failure modes as [`Connection::query`].
    pub async fn row(&mut self, fragment: &Fragment) -> Result<Option<Row>, PgComposeError> {
        self.conn.row(fragment).await
    }

    /// See [`Connection::value`].
    ///
    /// # Errors
    /// Same failure modes as [`Connection::query`].
    pub async fn value(&mut self, fragment: &Fragment) -> Result<Option<Literal>, PgComposeError> {
        self.conn.value(fragment).await
    }

    /// See [`Connection::column`].
    ///
    /// # Errors
    /// Same failure modes as [`Connection::query`].
    pub async fn column(&mut self, fragment: &Fragment) -> Result<Vec<Literal>, PgComposeError> {
        self.conn.column(fragment).await
    }

    /// See [`Connection::execute`].
    ///
    /// # Errors
    /// Same failure modes as [`Connection::query`].
    pub async fn execute(&mut self, fragment: &Fragment) -> Result<u64, PgComposeError> {
        self.conn.execute(fragment).await
    }

    /// See [`Connection::batch`].
    ///
    /// # Errors
    /// Same failure modes as [`Connection::query`].
    pub async fn batch(&mut self, sql: &str) -> Result<(), PgComposeError> {
        self.conn.batch(sql).await
    }

    /// Run `block` inside a nested savepoint on the same pinned client.
    ///
    /// Savepoints nest to unbounded depth; each level gets a name minted
    /// from the root's counter at this call.
    ///
    /// # Errors
    /// Propagates statement failures and
    /// [`PgComposeError::TransactionAborted`] when the savepoint rollback
    /// fails.
    pub async fn savepoint<T, F>(&mut self, block: F) -> Result<T, PgComposeError>
    where
        F: for<'a, 'b> FnOnce(&'a mut Transaction<'b>) -> BoxFuture<'a, Result<T, PgComposeError>>,
    {
        let ctx = self.ctx.child();
        run_block(self.conn, ctx, block).await
    }
}

/// Begin, run, and finish one transaction level on `conn`.
///
/// On a normal return the level commits; on failure it rolls back and
/// re-raises the block's error unchanged. When the rollback itself fails the
/// synthesized error carries both failures and the client is poisoned on the
/// spot, so the pool evicts it no matter how the error travels afterwards.
pub(crate) async fn run_block<T, F>(
    conn: &mut Connection,
    ctx: TxContext,
    block: F,
) -> Result<T, PgComposeError>
where
    F: for<'a, 'b> FnOnce(&'a mut Transaction<'b>) -> BoxFuture<'a, Result<T, PgComposeError>>,
{
    conn.simple(&ctx.begin_sql()).await?;
    let mut tx = Transaction {
        conn,
        ctx,
        status: TxStatus::new(),
    };
    tx.status.set(TxState::Active);

    match block(&mut tx).await {
        Ok(value) => match tx.conn.simple(&tx.ctx.commit_sql()).await {
            Ok(()) => {
                tx.status.set(TxState::Committed);
                Ok(value)
            }
            Err(commit_err) => finish_rollback(tx, commit_err).await,
        },
        Err(block_err) => finish_rollback(tx, block_err).await,
    }
}

async fn finish_rollback<T>(
    tx: Transaction<'_>,
    original: PgComposeError,
) -> Result<T, PgComposeError> {
    match tx.conn.simple(&tx.ctx.rollback_sql()).await {
        Ok(()) => {
            tx.status.set(TxState::RolledBack);
            Err(original)
        }
        Err(rollback) => {
            tx.status.set(TxState::Aborted);
            // The client's state is unknown; mark it here, while the
            // connection is in hand, so eviction does not depend on callers
            // propagating the aborted error unchanged.
            tx.conn.poison();
            tracing::warn!(
                savepoint = tx.ctx.savepoint_name(),
                "rollback failed after {original}; client state unknown"
            );
            Err(TransactionAbortedError {
                original: Box::new(original),
                rollback: Box::new(rollback),
            }
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn root_statements_are_plain() {
        let root = TxContext::root();
        assert!(root.is_root());
        assert_eq!(root.begin_sql(), "begin");
        assert_eq!(root.commit_sql(), "commit");
        assert_eq!(root.rollback_sql(), "rollback");
        assert_eq!(root.savepoint_name(), None);
    }

    #[test]
    fn savepoint_statements_carry_the_minted_name() {
        let root = TxContext::root();
        let child = root.child();
        let name = child.savepoint_name().expect("savepoint has a name");
        assert_eq!(child.begin_sql(), format!("savepoint {name}"));
        assert_eq!(child.commit_sql(), format!("release savepoint {name}"));
        assert_eq!(
            child.rollback_sql(),
            format!("rollback to savepoint {name}")
        );
    }

    #[test]
    fn savepoint_names_are_unique_across_depth_and_siblings() {
        let root = TxContext::root();
        let mut names = HashSet::new();

        // Siblings directly under the root.
        for _ in 0..10 {
            let child = root.child();
            assert!(names.insert(child.savepoint_name().unwrap().to_string()));
        }

        // A deep chain; every level shares the root counter.
        let mut ctx = root.child();
        assert!(names.insert(ctx.savepoint_name().unwrap().to_string()));
        for _ in 0..25 {
            ctx = ctx.child();
            assert!(names.insert(ctx.savepoint_name().unwrap().to_string()));
        }

        // Siblings of a deep node still draw from the same sequence.
        for _ in 0..10 {
            let child = ctx.child();
            assert!(names.insert(child.savepoint_name().unwrap().to_string()));
        }

        assert_eq!(names.len(), 46);
    }

    #[test]
    fn separate_roots_may_reuse_names() {
        let a = TxContext::root().child();
        let b = TxContext::root().child();
        // Counters are per root transaction, not global.
        assert_eq!(a.savepoint_name(), b.savepoint_name());
    }

    #[test]
    fn terminal_states() {
        assert!(!TxState::Idle.is_terminal());
        assert!(!TxState::Active.is_terminal());
        assert!(TxState::Committed.is_terminal());
        assert!(TxState::RolledBack.is_terminal());
        assert!(TxState::Aborted.is_terminal());
    }

    #[test]
    fn status_handle_tracks_every_state() {
        let status = TxStatus::new();
        assert_eq!(status.get(), TxState::Idle);

        let watcher = status.clone();
        for state in [
            TxState::Active,
            TxState::Committed,
            TxState::RolledBack,
            TxState::Aborted,
        ] {
            status.set(state);
            // Clones observe the same cell.
            assert_eq!(watcher.get(), state);
        }
    }
}
