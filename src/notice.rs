use serde::Serialize;
use tokio_postgres::error::DbError;

/// An asynchronous informational or warning message raised by the backend
/// while a statement was executing. Not itself a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Severity tag, e.g. `NOTICE` or `WARNING`
    pub severity: String,
    /// SQLSTATE code
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl Notice {
    pub(crate) fn from_db_error(err: &DbError) -> Self {
        Notice {
            severity: err.severity().to_string(),
            code: err.code().code().to_string(),
            message: err.message().to_string(),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}
