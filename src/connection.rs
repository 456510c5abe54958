//! Statement execution against one pinned physical client.

use bb8::PooledConnection;
use futures_util::future::BoxFuture;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::{PgComposeError, SqlError};
use crate::fragment::{Fragment, Query};
use crate::notice::Notice;
use crate::pool::ClientManager;
use crate::results::{self, ResultSet, Row};
use crate::transaction::{self, Transaction, TxContext};
use crate::value::{self, Literal};

/// A checked-out client. Owns the physical client exclusively until dropped;
/// all statements issued through one `Connection` execute strictly in the
/// order they were issued.
pub struct Connection {
    client: PooledConnection<'static, ClientManager>,
}

impl Connection {
    pub(crate) fn new(client: PooledConnection<'static, ClientManager>) -> Self {
        Self { client }
    }

    pub(crate) fn poison(&mut self) {
        self.client.poison();
    }

    /// Execute a fragment and shape the full result set.
    ///
    /// # Errors
    /// Returns [`PgComposeError::Sql`] carrying the statement text, ordered
    /// parameters, backend error, and any notices captured while it ran.
    pub async fn query(&mut self, fragment: &Fragment) -> Result<ResultSet, PgComposeError> {
        self.query_with(&fragment.to_query()).await
    }

    /// Execute an already-normalized [`Query`] and shape the result set.
    ///
    /// # Errors
    /// Same failure modes as [`Connection::query`].
    pub async fn query_with(&mut self, query: &Query) -> Result<ResultSet, PgComposeError> {
        let notices = self.client.notices.clone();
        let mut receiver = notices.install();
        let refs = value::to_sql_refs(&query.params);
        let outcome = self.client.client.query(query.text.as_str(), &refs).await;
        notices.clear();
        let captured = drain_notices(&mut receiver);

        match outcome {
            Ok(rows) => match results::build_result_set(&rows) {
                Ok(mut result_set) => {
                    result_set.rows_affected = result_set.len() as u64;
                    result_set.notices = captured;
                    Ok(result_set)
                }
                Err(source) => Err(statement_error(query, captured, source).into()),
            },
            Err(source) => Err(statement_error(query, captured, source).into()),
        }
    }

    /// Execute a fragment and return the first row, or `None` for an empty
    /// result set — never an error.
    ///
    /// # Errors
    /// Same failure modes as [`Connection::query`].
    pub async fn row(&mut self, fragment: &Fragment) -> Result<Option<Row>, PgComposeError> {
        Ok(self.query(fragment).await?.into_first())
    }

    /// Execute a fragment and return the first column of the first row;
    /// `None` when the result set is empty.
    ///
    /// # Errors
    /// Same failure modes as [`Connection::query`].
    pub async fn value(&mut self, fragment: &Fragment) -> Result<Option<Literal>, PgComposeError> {
        Ok(self.query(fragment).await?.into_value())
    }

    /// Execute a fragment and return the first column of every row; an empty
    /// list (not an error) when the result set is empty.
    ///
    /// # Errors
    /// Same failure modes as [`Connection::query`].
    pub async fn column(&mut self, fragment: &Fragment) -> Result<Vec<Literal>, PgComposeError> {
        Ok(self.query(fragment).await?.into_column())
    }

    /// Execute a DML fragment and return the affected row count.
    ///
    /// # Errors
    /// Same failure modes as [`Connection::query`].
    pub async fn execute(&mut self, fragment: &Fragment) -> Result<u64, PgComposeError> {
        self.execute_with(&fragment.to_query()).await
    }

    /// Execute an already-normalized DML [`Query`].
    ///
    /// # Errors
    /// Same failure modes as [`Connection::query`].
    pub async fn execute_with(&mut self, query: &Query) -> Result<u64, PgComposeError> {
        let notices = self.client.notices.clone();
        let mut receiver = notices.install();
        let refs = value::to_sql_refs(&query.params);
        let outcome = self.client.client.execute(query.text.as_str(), &refs).await;
        notices.clear();
        let captured = drain_notices(&mut receiver);

        outcome.map_err(|source| statement_error(query, captured, source).into())
    }

    /// Execute a multi-statement batch (no parameters), e.g. DDL setup.
    ///
    /// # Errors
    /// Same failure modes as [`Connection::query`].
    pub async fn batch(&mut self, sql: &str) -> Result<(), PgComposeError> {
        self.simple(sql).await
    }

    /// Run `block` inside a root transaction pinned to this connection.
    ///
    /// # Errors
    /// Propagates statement failures and
    /// [`PgComposeError::TransactionAborted`] when a rollback fails.
    pub async fn transaction<T, F>(&mut self, block: F) -> Result<T, PgComposeError>
    where
        F: for<'a, 'b> FnOnce(&'a mut Transaction<'b>) -> BoxFuture<'a, Result<T, PgComposeError>>,
    {
        transaction::run_block(self, TxContext::root(), block).await
    }

    /// Run one parameterless control statement (begin, commit, savepoint...).
    pub(crate) async fn simple(&mut self, sql: &str) -> Result<(), PgComposeError> {
        let notices = self.client.notices.clone();
        let mut receiver = notices.install();
        let outcome = self.client.client.batch_execute(sql).await;
        notices.clear();
        let captured = drain_notices(&mut receiver);

        outcome.map_err(|source| {
            SqlError {
                sql: sql.to_string(),
                params: Vec::new(),
                notices: captured,
                source,
            }
            .into()
        })
    }
}

fn statement_error(query: &Query, notices: Vec<Notice>, source: tokio_postgres::Error) -> SqlError {
    SqlError {
        sql: query.text.clone(),
        params: query.params.clone(),
        notices,
        source,
    }
}

fn drain_notices(receiver: &mut UnboundedReceiver<Notice>) -> Vec<Notice> {
    let mut notices = Vec::new();
    while let Ok(notice) = receiver.try_recv() {
        notices.push(notice);
    }
    notices
}
