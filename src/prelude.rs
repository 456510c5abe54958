//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::config::PgOptions;
pub use crate::connection::Connection;
pub use crate::error::{PgComposeError, SqlError, TransactionAbortedError};
pub use crate::fragment::{
    Fragment, Query, SqlArg, ident, idents, items, items_with, literal, literals,
};
pub use crate::notice::Notice;
pub use crate::pool::{Pool, PoolState};
pub use crate::results::{ResultSet, Row};
pub use crate::transaction::{Transaction, TxContext, TxState, TxStatus};
pub use crate::value::Literal;
