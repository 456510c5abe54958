use std::collections::HashMap;
use std::sync::Arc;

use crate::value::Literal;

/// A single row from a query result, with access by column name or index.
#[derive(Debug, Clone)]
pub struct Row {
    /// Column names, shared across all rows in a result set
    pub column_names: Arc<Vec<String>>,
    /// The values for this row, in column order
    pub values: Vec<Literal>,
    // Shared name-to-index map to avoid repeated string comparisons.
    #[doc(hidden)]
    pub(crate) column_index: Arc<HashMap<String, usize>>,
}

impl Row {
    /// Get the index of a column by name.
    #[must_use]
    pub fn column_index(&self, column_name: &str) -> Option<usize> {
        if let Some(&idx) = self.column_index.get(column_name) {
            return Some(idx);
        }
        // Fall back to linear search
        self.column_names.iter().position(|col| col == column_name)
    }

    /// Get a value by column name, or `None` if the column is absent.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&Literal> {
        self.column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value by column index, or `None` when out of bounds.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&Literal> {
        self.values.get(index)
    }

    /// The first column's value, if the row has any columns.
    #[must_use]
    pub fn first_value(&self) -> Option<&Literal> {
        self.values.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> Row {
        let names = Arc::new(vec!["id".to_string(), "name".to_string()]);
        let index: HashMap<String, usize> = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Row {
            column_names: names,
            values: vec![Literal::Int(1), Literal::Text("alice".into())],
            column_index: Arc::new(index),
        }
    }

    #[test]
    fn lookup_by_name_and_index_agree() {
        let row = sample_row();
        assert_eq!(row.get("id"), Some(&Literal::Int(1)));
        assert_eq!(row.get_by_index(1), Some(&Literal::Text("alice".into())));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.first_value(), Some(&Literal::Int(1)));
    }
}
