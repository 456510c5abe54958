use std::collections::HashMap;
use std::sync::Arc;

use super::row::Row;
use crate::notice::Notice;
use crate::value::Literal;

/// Shaped rows from one executed statement, plus any notices the backend
/// raised while it ran.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the statement
    pub rows: Vec<Row>,
    /// Rows affected, for DML statements
    pub rows_affected: u64,
    /// Notices observed during this one statement
    pub notices: Vec<Notice>,
    column_names: Option<Arc<Vec<String>>>,
    column_index: Option<Arc<HashMap<String, usize>>>,
}

impl ResultSet {
    /// Create a result set with preallocated row capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            rows: Vec::with_capacity(capacity),
            ..ResultSet::default()
        }
    }

    /// Set the column names shared by every row of this result set.
    pub(crate) fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        let index: HashMap<String, usize> = column_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        self.column_index = Some(Arc::new(index));
        self.column_names = Some(column_names);
    }

    /// The column names, if any rows were shaped.
    #[must_use]
    pub fn column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Append a row of values; column names must have been set first.
    pub(crate) fn add_row_values(&mut self, values: Vec<Literal>) {
        debug_assert!(
            self.column_names.is_some(),
            "column names must be set before rows are added"
        );
        let (Some(column_names), Some(column_index)) =
            (&self.column_names, &self.column_index)
        else {
            return;
        };
        self.rows.push(Row {
            column_names: Arc::clone(column_names),
            values,
            column_index: Arc::clone(column_index),
        });
    }

    /// Number of rows in the result set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The first row, or `None` for an empty result set. Never an error.
    #[must_use]
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Consume the result set, yielding the first row if there is one.
    #[must_use]
    pub fn into_first(self) -> Option<Row> {
        self.rows.into_iter().next()
    }

    /// The first column's value of the first row; `None` when empty.
    #[must_use]
    pub fn into_value(self) -> Option<Literal> {
        self.rows
            .into_iter()
            .next()
            .and_then(|row| row.values.into_iter().next())
    }

    /// The first column's value from every row; empty for an empty result
    /// set, never an error.
    #[must_use]
    pub fn into_column(self) -> Vec<Literal> {
        self.rows
            .into_iter()
            .filter_map(|row| row.values.into_iter().next())
            .collect()
    }
}
