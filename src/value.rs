use std::error::Error;

use bytes::BytesMut;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio_postgres::types::{IsNull, Kind, ToSql, Type, to_sql_checked};

/// A scalar or nested array value renderable as inline SQL text or bound as a
/// statement parameter.
///
/// The same enum is used for fragment composition, positional parameters, and
/// result shaping, so helper code never needs to branch on driver types:
/// ```rust
/// use pg_compose::Literal;
///
/// let params = vec![
///     Literal::Int(1),
///     Literal::Text("alice".into()),
///     Literal::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value (UTC instant)
    Timestamp(DateTime<Utc>),
    /// NULL value
    Null,
    /// JSON value
    Json(JsonValue),
    /// Array value; elements may themselves be arrays
    Array(Vec<Literal>),
}

impl Literal {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let Literal::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let Literal::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let Literal::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        if let Literal::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let Literal::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_json(&self) -> Option<&JsonValue> {
        if let Literal::Json(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Literal]> {
        if let Literal::Array(items) = self {
            Some(items)
        } else {
            None
        }
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Int(i64::from(value))
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Text(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Text(value)
    }
}

impl From<DateTime<Utc>> for Literal {
    fn from(value: DateTime<Utc>) -> Self {
        Literal::Timestamp(value)
    }
}

impl From<JsonValue> for Literal {
    fn from(value: JsonValue) -> Self {
        Literal::Json(value)
    }
}

impl From<Vec<Literal>> for Literal {
    fn from(items: Vec<Literal>) -> Self {
        Literal::Array(items)
    }
}

impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(value: Option<T>) -> Self {
        value.map_or(Literal::Null, Into::into)
    }
}

impl ToSql for Literal {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Literal::Int(i) => (*i).to_sql(ty, out),
            Literal::Float(f) => (*f).to_sql(ty, out),
            Literal::Text(s) => s.to_sql(ty, out),
            Literal::Bool(b) => (*b).to_sql(ty, out),
            Literal::Timestamp(dt) => {
                // TIMESTAMP columns bind the naive form; TIMESTAMPTZ keeps the instant.
                if *ty == Type::TIMESTAMP {
                    dt.naive_utc().to_sql(ty, out)
                } else {
                    dt.to_sql(ty, out)
                }
            }
            Literal::Null => Ok(IsNull::Yes),
            Literal::Json(jsval) => jsval.to_sql(ty, out),
            Literal::Array(items) => items.to_sql(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        if let Kind::Array(member) = ty.kind() {
            return Self::accepts(member);
        }
        // Only accept types we can properly handle
        match *ty {
            // Integer types
            Type::INT2 | Type::INT4 | Type::INT8 => true,
            // Floating point types
            Type::FLOAT4 | Type::FLOAT8 => true,
            // Text types
            Type::TEXT | Type::VARCHAR | Type::CHAR | Type::NAME => true,
            // Boolean type
            Type::BOOL => true,
            // Date/time types
            Type::TIMESTAMP | Type::TIMESTAMPTZ => true,
            // JSON types
            Type::JSON | Type::JSONB => true,
            // For any other type, we don't accept
            _ => false,
        }
    }

    to_sql_checked!();
}

/// Borrow a parameter slice as the driver's trait-object form.
pub(crate) fn to_sql_refs(params: &[Literal]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_match_variants() {
        assert_eq!(Literal::Int(7).as_int(), Some(&7));
        assert_eq!(Literal::Text("x".into()).as_text(), Some("x"));
        assert_eq!(Literal::Bool(true).as_bool(), Some(&true));
        assert_eq!(Literal::Int(1).as_bool(), Some(&true));
        assert_eq!(Literal::Int(0).as_bool(), Some(&false));
        assert!(Literal::Null.is_null());
        assert_eq!(Literal::Float(1.5).as_float(), Some(1.5));
    }

    #[test]
    fn option_conversion_maps_none_to_null() {
        assert_eq!(Literal::from(None::<i64>), Literal::Null);
        assert_eq!(Literal::from(Some(3i64)), Literal::Int(3));
    }

    #[test]
    fn timestamp_accessor_parses_text() {
        let lit = Literal::Text("2024-05-01T10:30:00.000Z".into());
        let ts = lit.as_timestamp().expect("parseable instant");
        assert_eq!(ts.timestamp(), 1_714_559_400);
    }
}
