//! Explicit connection pool with eviction of poisoned clients.
//!
//! The pool is constructed once at startup from [`PgOptions`](crate::PgOptions)
//! and passed to callers; there is no implicit global. Each client handle has
//! exactly one owner at a time, transferred at acquire/release boundaries.

mod client;
mod manager;

pub use client::PooledClient;
pub use manager::ClientManager;

use futures_util::future::BoxFuture;

use crate::config::PgOptions;
use crate::connection::Connection;
use crate::error::PgComposeError;
use crate::transaction::{self, Transaction, TxContext};

/// A pool of physical backend clients.
///
/// Cloning is cheap and shares the underlying pool.
#[derive(Clone)]
pub struct Pool {
    inner: bb8::Pool<ClientManager>,
}

/// A snapshot of the pool's bookkeeping, mostly useful for diagnostics and
/// eviction tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolState {
    /// Total live clients, checked out or idle
    pub connections: u32,
    /// Clients currently idle in the pool
    pub idle_connections: u32,
}

impl Pool {
    /// Build a pool from resolved options, verifying one client connects.
    ///
    /// # Errors
    /// Returns [`PgComposeError::Config`] for invalid options and
    /// [`PgComposeError::Connection`] when the pool cannot be established.
    pub async fn connect(options: PgOptions) -> Result<Self, PgComposeError> {
        options.validate()?;
        let manager = ClientManager::new(options.config);
        let inner = bb8::Pool::builder()
            .max_size(options.max_size)
            .min_idle(options.min_idle)
            .connection_timeout(options.connect_timeout)
            .idle_timeout(options.idle_timeout)
            .build(manager)
            .await
            .map_err(|e| {
                PgComposeError::Connection(format!("failed to create postgres pool: {e}"))
            })?;
        Ok(Pool { inner })
    }

    /// Check one client out of the pool.
    ///
    /// The returned [`Connection`] owns the client exclusively until dropped;
    /// dropping it releases the client back to the pool (or destroys it when
    /// poisoned).
    ///
    /// # Errors
    /// Returns [`PgComposeError::Connection`] when acquisition fails (pool
    /// exhausted, network or auth failure) — distinct from statement-level
    /// failures.
    pub async fn acquire(&self) -> Result<Connection, PgComposeError> {
        let client = self
            .inner
            .get_owned()
            .await
            .map_err(|e| PgComposeError::Connection(format!("postgres checkout error: {e}")))?;
        Ok(Connection::new(client))
    }

    /// Acquire a client, run `work` against it, and release it afterwards.
    ///
    /// When `work` fails with a poisoning error the client is marked broken
    /// before release, so the pool destroys it instead of recycling it. An
    /// ordinary statement error releases the client normally. A failed
    /// rollback already poisons the client at the abort site; this check
    /// additionally covers poisoning errors raised outside a transaction
    /// block.
    ///
    /// # Errors
    /// Propagates acquisition failures and whatever `work` returns.
    pub async fn with_client<T, F>(&self, work: F) -> Result<T, PgComposeError>
    where
        F: for<'a> FnOnce(&'a mut Connection) -> BoxFuture<'a, Result<T, PgComposeError>>,
    {
        let mut conn = self.acquire().await?;
        let outcome = work(&mut conn).await;
        if let Err(err) = &outcome
            && err.poisons_connection()
        {
            conn.poison();
        }
        outcome
    }

    /// Run `block` with one client pinned for its whole duration, without a
    /// transaction. Use this when several statements must visibly share one
    /// session (e.g. session-scoped settings).
    ///
    /// # Errors
    /// Propagates acquisition failures and whatever `block` returns.
    pub async fn connection<T, F>(&self, block: F) -> Result<T, PgComposeError>
    where
        F: for<'a> FnOnce(&'a mut Connection) -> BoxFuture<'a, Result<T, PgComposeError>>,
    {
        self.with_client(block).await
    }

    /// Run `block` inside a root transaction on one pinned client.
    ///
    /// The client stays pinned for the whole, possibly nested, transaction
    /// block. On commit or rollback it is released normally; when the
    /// rollback itself fails the client is evicted instead.
    ///
    /// # Errors
    /// Propagates acquisition failures, statement failures, and
    /// [`PgComposeError::TransactionAborted`] when a rollback fails.
    pub async fn transaction<T, F>(&self, block: F) -> Result<T, PgComposeError>
    where
        T: Send,
        F: for<'a, 'b> FnOnce(&'a mut Transaction<'b>) -> BoxFuture<'a, Result<T, PgComposeError>>
            + Send
            + 'static,
    {
        self.with_client(move |conn| {
            Box::pin(async move { transaction::run_block(conn, TxContext::root(), block).await })
        })
        .await
    }

    /// A snapshot of live and idle client counts.
    #[must_use]
    pub fn state(&self) -> PoolState {
        let state = self.inner.state();
        PoolState {
            connections: state.connections,
            idle_connections: state.idle_connections,
        }
    }
}
