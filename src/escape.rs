//! Pure escaping of identifiers and literal values into inline SQL text.
//!
//! These functions are total: every input renders to a string the backend
//! parses back to the original value. They are the only place in the crate
//! where quoting rules live; fragments call them exactly once per value.

use chrono::SecondsFormat;

use crate::value::Literal;

/// Escape an identifier (table, column, schema name) for inline use.
///
/// Wraps the name in double quotes and doubles any embedded double quote.
#[must_use]
pub fn escape_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('"');
    for ch in name.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Escape a [`Literal`] for inline use in SQL text.
///
/// Finite numbers render verbatim (non-finite floats in their quoted
/// spellings), `Null` as `null`, booleans as `true`/`false`.
/// Timestamps render as their ISO-8601 instant and are then string-escaped.
/// Arrays render as `Array[...]` with each element escaped recursively.
#[must_use]
pub fn escape_literal(value: &Literal) -> String {
    match value {
        Literal::Int(i) => i.to_string(),
        Literal::Float(f) => {
            // Non-finite floats are not valid tokens; the backend only
            // accepts them in their quoted spellings.
            if f.is_finite() {
                f.to_string()
            } else if f.is_nan() {
                "'NaN'".to_string()
            } else if f.is_sign_positive() {
                "'Infinity'".to_string()
            } else {
                "'-Infinity'".to_string()
            }
        }
        Literal::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        Literal::Null => "null".to_string(),
        Literal::Timestamp(dt) => {
            escape_string(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        Literal::Json(v) => escape_string(&v.to_string()),
        Literal::Text(s) => escape_string(s),
        Literal::Array(items) => {
            let elements: Vec<String> = items.iter().map(escape_literal).collect();
            format!("Array[{}]", elements.join(", "))
        }
    }
}

/// Quote a string, doubling embedded quotes and backslashes.
///
/// When a backslash had to be doubled the result is prefixed with `E` so the
/// backend parses backslash escapes regardless of `standard_conforming_strings`.
fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    let mut has_backslash = false;
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\'' => out.push_str("''"),
            '\\' => {
                out.push_str("\\\\");
                has_backslash = true;
            }
            _ => out.push(ch),
        }
    }
    out.push('\'');
    if has_backslash { format!("E{out}") } else { out }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn identifier_doubles_embedded_quotes() {
        assert_eq!(escape_identifier("users"), r#""users""#);
        assert_eq!(escape_identifier(r#"weird " ident"#), r#""weird "" ident""#);
    }

    #[test]
    fn scalars_render_verbatim() {
        assert_eq!(escape_literal(&Literal::Int(42)), "42");
        assert_eq!(escape_literal(&Literal::Float(1.5)), "1.5");
        assert_eq!(escape_literal(&Literal::Bool(true)), "true");
        assert_eq!(escape_literal(&Literal::Bool(false)), "false");
        assert_eq!(escape_literal(&Literal::Null), "null");
    }

    #[test]
    fn non_finite_floats_render_quoted() {
        assert_eq!(escape_literal(&Literal::Float(f64::NAN)), "'NaN'");
        assert_eq!(escape_literal(&Literal::Float(f64::INFINITY)), "'Infinity'");
        assert_eq!(
            escape_literal(&Literal::Float(f64::NEG_INFINITY)),
            "'-Infinity'"
        );
    }

    #[test]
    fn plain_string_is_quoted() {
        assert_eq!(escape_literal(&Literal::Text("alice".into())), "'alice'");
    }

    #[test]
    fn embedded_quote_is_doubled() {
        assert_eq!(escape_literal(&Literal::Text("a'a".into())), "'a''a'");
    }

    #[test]
    fn backslash_triggers_extended_marker() {
        // Both the quote and the backslash double; the backslash adds the E prefix.
        assert_eq!(
            escape_literal(&Literal::Text("a'a\\".into())),
            "E'a''a\\\\'"
        );
    }

    #[test]
    fn quote_only_string_has_no_marker() {
        assert_eq!(escape_literal(&Literal::Text("it's".into())), "'it''s'");
    }

    #[test]
    fn arrays_render_recursively() {
        let value = Literal::Array(vec![
            Literal::Int(1),
            Literal::Text("two".into()),
            Literal::Array(vec![Literal::Bool(true), Literal::Null]),
        ]);
        assert_eq!(
            escape_literal(&value),
            "Array[1, 'two', Array[true, null]]"
        );
    }

    #[test]
    fn timestamp_renders_as_quoted_instant() {
        let dt = Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap();
        assert_eq!(
            escape_literal(&Literal::Timestamp(dt)),
            "'2024-05-01T10:30:00.000Z'"
        );
    }

    #[test]
    fn json_is_serialized_then_string_escaped() {
        let value = Literal::Json(serde_json::json!({"k": "v'"}));
        assert_eq!(escape_literal(&value), r#"'{"k":"v''"}'"#);
    }
}
