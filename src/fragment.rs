//! Composable, already-safe SQL fragments.
//!
//! A [`Fragment`] is an opaque piece of SQL built from trusted template text
//! and interleaved values. It renders in two distinct modes:
//!
//! - [`Fragment::render`] produces pure literal SQL text, with every value
//!   escaped inline. Use this when building larger safe SQL (identifiers,
//!   sub-expressions).
//! - [`Fragment::to_query`] produces the executable [`Query`] form, with every
//!   directly-held value replaced by a `$n` placeholder in order of first
//!   appearance. Nested fragments stay inlined as literal text.
//!
//! Composing a fragment into another fragment splices its rendered text
//! verbatim; nothing is ever escaped twice.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::PgComposeError;
use crate::escape::{escape_identifier, escape_literal};
use crate::value::Literal;

/// An argument to [`Fragment::template`] or [`items`]: either a plain value
/// (escaped or parameterized on render) or an already-safe fragment (inlined
/// verbatim). The explicit sum keeps dispatch exact; nothing is ever
/// classified by object shape.
#[derive(Debug, Clone)]
pub enum SqlArg {
    /// A plain value, escaped (literal mode) or bound as `$n` (query mode).
    Value(Literal),
    /// An already-safe fragment, inlined as rendered text in both modes.
    Fragment(Fragment),
}

impl From<Literal> for SqlArg {
    fn from(value: Literal) -> Self {
        SqlArg::Value(value)
    }
}

impl From<Fragment> for SqlArg {
    fn from(fragment: Fragment) -> Self {
        SqlArg::Fragment(fragment)
    }
}

impl From<i64> for SqlArg {
    fn from(value: i64) -> Self {
        SqlArg::Value(Literal::Int(value))
    }
}

impl From<i32> for SqlArg {
    fn from(value: i32) -> Self {
        SqlArg::Value(Literal::Int(i64::from(value)))
    }
}

impl From<f64> for SqlArg {
    fn from(value: f64) -> Self {
        SqlArg::Value(Literal::Float(value))
    }
}

impl From<bool> for SqlArg {
    fn from(value: bool) -> Self {
        SqlArg::Value(Literal::Bool(value))
    }
}

impl From<&str> for SqlArg {
    fn from(value: &str) -> Self {
        SqlArg::Value(Literal::Text(value.to_string()))
    }
}

impl From<String> for SqlArg {
    fn from(value: String) -> Self {
        SqlArg::Value(Literal::Text(value))
    }
}

impl From<DateTime<Utc>> for SqlArg {
    fn from(value: DateTime<Utc>) -> Self {
        SqlArg::Value(Literal::Timestamp(value))
    }
}

impl From<JsonValue> for SqlArg {
    fn from(value: JsonValue) -> Self {
        SqlArg::Value(Literal::Json(value))
    }
}

impl From<Vec<Literal>> for SqlArg {
    fn from(items: Vec<Literal>) -> Self {
        SqlArg::Value(Literal::Array(items))
    }
}

/// One piece of a fragment: trusted SQL text, or a value still awaiting its
/// rendering mode.
#[derive(Debug, Clone)]
enum Piece {
    Sql(String),
    Value(Literal),
}

/// An immutable, already-safe piece of SQL.
///
/// Once constructed a fragment's rendering is fixed. Values passed to
/// [`Fragment::template`] are escaped at most once, ever; fragments nested
/// into other fragments are inlined as rendered text and never re-escaped.
#[derive(Debug, Clone, Default)]
pub struct Fragment {
    pieces: Vec<Piece>,
}

impl Fragment {
    fn from_sql(text: String) -> Self {
        Fragment {
            pieces: vec![Piece::Sql(text)],
        }
    }

    /// Build a fragment from template chunks interleaved with arguments.
    ///
    /// `chunks` and `args` walk in lockstep: `chunks[0]`, `args[0]`,
    /// `chunks[1]`, ... so `chunks.len()` must equal `args.len() + 1`.
    ///
    /// # Errors
    /// Returns [`PgComposeError::Template`] when the chunk and argument counts
    /// do not line up.
    pub fn template<I>(chunks: &[&str], args: I) -> Result<Fragment, PgComposeError>
    where
        I: IntoIterator,
        I::Item: Into<SqlArg>,
    {
        let args: Vec<SqlArg> = args.into_iter().map(Into::into).collect();
        if chunks.len() != args.len() + 1 {
            return Err(PgComposeError::Template(format!(
                "expected {} chunks for {} values, got {}",
                args.len() + 1,
                args.len(),
                chunks.len()
            )));
        }

        let mut fragment = Fragment::default();
        let mut chunk_iter = chunks.iter();
        if let Some(first) = chunk_iter.next() {
            fragment.push_sql(first);
        }
        for (arg, chunk) in args.into_iter().zip(chunk_iter) {
            fragment.push_arg(arg);
            fragment.push_sql(chunk);
        }
        Ok(fragment)
    }

    fn push_sql(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        // Merge adjacent text pieces so rendering stays cheap.
        if let Some(Piece::Sql(existing)) = self.pieces.last_mut() {
            existing.push_str(text);
        } else {
            self.pieces.push(Piece::Sql(text.to_string()));
        }
    }

    fn push_arg(&mut self, arg: SqlArg) {
        match arg {
            SqlArg::Value(value) => self.pieces.push(Piece::Value(value)),
            // A nested fragment's rendering is already fixed; splice it as text.
            SqlArg::Fragment(fragment) => self.push_sql(&fragment.render()),
        }
    }

    /// Render to pure literal SQL text, escaping every held value inline.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Sql(sql) => out.push_str(sql),
                Piece::Value(value) => out.push_str(&escape_literal(value)),
            }
        }
        out
    }

    /// Render to the executable form: `$1..$n` placeholders in order of first
    /// appearance, paired with the correspondingly ordered parameter list.
    ///
    /// Only values held directly by this fragment become placeholders; nested
    /// fragments were inlined as literal text at composition time.
    #[must_use]
    pub fn to_query(&self) -> Query {
        let mut text = String::new();
        let mut params = Vec::new();
        for piece in &self.pieces {
            match piece {
                Piece::Sql(sql) => text.push_str(sql),
                Piece::Value(value) => {
                    params.push(value.clone());
                    text.push('$');
                    text.push_str(&params.len().to_string());
                }
            }
        }
        Query { text, params }
    }
}

/// Wrap an identifier as an already-escaped fragment.
#[must_use]
pub fn ident(name: &str) -> Fragment {
    Fragment::from_sql(escape_identifier(name))
}

/// Wrap several identifiers as one comma-joined fragment.
#[must_use]
pub fn idents(names: &[&str]) -> Fragment {
    let joined: Vec<String> = names.iter().map(|n| escape_identifier(n)).collect();
    Fragment::from_sql(joined.join(", "))
}

/// Wrap a value as an already-escaped inline fragment.
///
/// The value is escaped here, once; the resulting fragment inlines as text
/// even in query mode. Use a template argument instead when the value should
/// travel as a `$n` parameter.
#[must_use]
pub fn literal(value: impl Into<Literal>) -> Fragment {
    Fragment::from_sql(escape_literal(&value.into()))
}

/// Wrap several values as one comma-joined, already-escaped fragment.
#[must_use]
pub fn literals<I>(values: I) -> Fragment
where
    I: IntoIterator,
    I::Item: Into<Literal>,
{
    let joined: Vec<String> = values
        .into_iter()
        .map(|v| escape_literal(&v.into()))
        .collect();
    Fragment::from_sql(joined.join(", "))
}

/// Combine independently built arguments into one fragment, joined by `", "`.
///
/// Values stay escaped-on-render (or parameterized at the top level);
/// fragments are inlined verbatim — the same dispatch as
/// [`Fragment::template`].
#[must_use]
pub fn items<I>(values: I) -> Fragment
where
    I: IntoIterator,
    I::Item: Into<SqlArg>,
{
    items_with(values, ", ")
}

/// Like [`items`] with an explicit separator.
#[must_use]
pub fn items_with<I>(values: I, separator: &str) -> Fragment
where
    I: IntoIterator,
    I::Item: Into<SqlArg>,
{
    let mut fragment = Fragment::default();
    for (i, value) in values.into_iter().enumerate() {
        if i > 0 {
            fragment.push_sql(separator);
        }
        fragment.push_arg(value.into());
    }
    fragment
}

/// The normalized executable form of a top-level fragment: SQL text with
/// `$1..$n` placeholders and the correspondingly ordered parameters. This
/// pairing is the exact contract handed to the backend; positional
/// correspondence is preserved exactly.
#[derive(Debug, Clone, Serialize)]
pub struct Query {
    /// The SQL text with positional placeholders
    pub text: String,
    /// The parameters, ordered to match the placeholders
    pub params: Vec<Literal>,
}

impl Query {
    /// Build a query directly from raw SQL text and ordered parameters,
    /// bypassing fragment composition. The caller vouches for the text.
    #[must_use]
    pub fn new(text: impl Into<String>, params: Vec<Literal>) -> Self {
        Self {
            text: text.into(),
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select_by_id(table: &str, id: i64) -> Fragment {
        Fragment::template(
            &["select * from ", " where id = ", ""],
            vec![SqlArg::from(ident(table)), SqlArg::from(id)],
        )
        .expect("chunk counts line up")
    }

    #[test]
    fn template_interleaves_chunks_and_values() {
        let frag = select_by_id("users", 5);
        assert_eq!(frag.render(), r#"select * from "users" where id = 5"#);
    }

    #[test]
    fn template_rejects_mismatched_chunks() {
        let err = Fragment::template(&["select "], vec![SqlArg::from(1i64)]).unwrap_err();
        assert!(matches!(err, PgComposeError::Template(_)));
    }

    #[test]
    fn query_mode_parameterizes_direct_values_only() {
        let frag = select_by_id("users", 5);
        let query = frag.to_query();
        // The identifier fragment stays inline; the value becomes $1.
        assert_eq!(query.text, r#"select * from "users" where id = $1"#);
        assert_eq!(query.params, vec![Literal::Int(5)]);
    }

    #[test]
    fn placeholders_number_in_order_of_appearance() {
        let frag = Fragment::template(
            &["insert into t (a, b, c) values (", ", ", ", ", ")"],
            vec![SqlArg::from("x"), SqlArg::from(2i64), SqlArg::from("x")],
        )
        .unwrap();
        let query = frag.to_query();
        assert_eq!(query.text, "insert into t (a, b, c) values ($1, $2, $3)");
        assert_eq!(
            query.params,
            vec![
                Literal::Text("x".into()),
                Literal::Int(2),
                Literal::Text("x".into()),
            ]
        );
    }

    #[test]
    fn nested_fragment_is_never_reescaped() {
        let inner = literal("o'brien");
        let rendered_once = inner.render();
        let outer = Fragment::template(
            &["select ", " as name"],
            vec![SqlArg::from(inner)],
        )
        .unwrap();
        // The inner text appears verbatim: quotes doubled exactly once.
        assert_eq!(outer.render(), format!("select {rendered_once} as name"));
        assert_eq!(outer.render(), "select 'o''brien' as name");
        // Query mode inlines it too; no parameter is minted for it.
        let query = outer.to_query();
        assert_eq!(query.text, "select 'o''brien' as name");
        assert!(query.params.is_empty());
    }

    #[test]
    fn deeply_nested_fragments_escape_each_value_once() {
        let level1 = items(vec![SqlArg::from("a\\b"), SqlArg::from(1i64)]);
        let level2 = Fragment::template(&["(", ")"], vec![SqlArg::from(level1)]).unwrap();
        let level3 = Fragment::template(&["values ", ""], vec![SqlArg::from(level2)]).unwrap();
        assert_eq!(level3.render(), "values (E'a\\\\b', 1)");
    }

    #[test]
    fn items_joins_with_default_separator() {
        let frag = items(vec![SqlArg::from(1i64), SqlArg::from(2i64), SqlArg::from(3i64)]);
        assert_eq!(frag.render(), "1, 2, 3");
        let query = frag.to_query();
        assert_eq!(query.text, "$1, $2, $3");
    }

    #[test]
    fn items_with_custom_separator_mixes_values_and_fragments() {
        let frag = items_with(
            vec![
                SqlArg::from(Fragment::template(&["a = ", ""], vec![SqlArg::from(1i64)]).unwrap()),
                SqlArg::from(Fragment::template(&["b = ", ""], vec![SqlArg::from("x")]).unwrap()),
            ],
            " and ",
        );
        assert_eq!(frag.render(), "a = 1 and b = 'x'");
    }

    #[test]
    fn idents_and_literals_join_with_commas() {
        assert_eq!(idents(&["a", "b"]).render(), r#""a", "b""#);
        let frag = literals(vec![Literal::Int(1), Literal::Text("two".into())]);
        assert_eq!(frag.render(), "1, 'two'");
    }

    #[test]
    fn empty_fragment_renders_empty() {
        let frag = Fragment::default();
        assert_eq!(frag.render(), "");
        let query = frag.to_query();
        assert_eq!(query.text, "");
        assert!(query.params.is_empty());
    }
}
