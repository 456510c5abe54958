//! Safe SQL composition and pooled nested transactions for PostgreSQL.
//!
//! `pg-compose` sits between application code and `tokio-postgres`: callers
//! build [`Fragment`]s from trusted template text and interleaved values,
//! the fragment renders to a normalized [`Query`] (`$1..$n` placeholders plus
//! ordered parameters), and the [`Pool`] lends a physical client to execute
//! it. Transactions — including arbitrarily nested savepoints — pin one
//! client for their whole block and recover deterministically from failures:
//! an ordinary statement error rolls the level back and leaves the client
//! healthy; a failed rollback poisons the client so the pool evicts it.
//!
//! ```rust,no_run
//! use pg_compose::{Fragment, PgOptions, Pool, SqlArg, ident};
//!
//! # async fn demo() -> Result<(), pg_compose::PgComposeError> {
//! let pool = Pool::connect(PgOptions::from_url(
//!     "postgres://app@localhost/inventory",
//! )?)
//! .await?;
//!
//! let find = Fragment::template(
//!     &["select qty from ", " where sku = ", ""],
//!     vec![SqlArg::from(ident("stock")), SqlArg::from("A-100")],
//! )?;
//!
//! let qty = pool
//!     .connection(|conn| Box::pin(async move { conn.value(&find).await }))
//!     .await?;
//! # let _ = qty;
//! # Ok(())
//! # }
//! ```

mod config;
mod connection;
mod error;
mod escape;
mod fragment;
mod notice;
mod pool;
mod results;
mod transaction;
mod value;

pub mod prelude;

pub use config::PgOptions;
pub use connection::Connection;
pub use error::{PgComposeError, SqlError, TransactionAbortedError};
pub use escape::{escape_identifier, escape_literal};
pub use fragment::{Fragment, Query, SqlArg, ident, idents, items, items_with, literal, literals};
pub use notice::Notice;
pub use pool::{ClientManager, Pool, PoolState, PooledClient};
pub use results::{ResultSet, Row};
pub use transaction::{Transaction, TxContext, TxState, TxStatus};
pub use value::Literal;
