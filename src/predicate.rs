//! Predicate terms: associative filters and raw fragments.
//!
//! A [`Conditions`] map turns into structured predicates (`=` for scalars,
//! `IN` for sequences) on snake-cased columns. Raw fragments are passed through
//! verbatim with `?` placeholders for positional parameters or `:name`
//! placeholders for named ones.

use crate::error::{QuarryError, Result};
use crate::naming;
use crate::statement::column_ref;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_query::{Expr, ExprTrait, Value};

/// Named placeholders, skipping PostgreSQL `::type` casts
static NAMED_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^:]):([A-Za-z_][A-Za-z0-9_]*)").expect("valid placeholder regex"));

/// Parameters bound into a raw fragment
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Params {
    #[default]
    None,
    /// Bound in order to `?` placeholders
    Positional(Vec<Value>),
    /// Bound by name to `:name` placeholders
    Named(Vec<(String, Value)>),
}

impl Params {
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Params::Positional(values.into_iter().map(Into::into).collect())
    }

    pub fn named<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Params::Named(values.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Value side of a map entry
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Scalar(Value),
    Set(Vec<Value>),
}

impl From<Value> for FilterValue {
    fn from(value: Value) -> Self {
        FilterValue::Scalar(value)
    }
}

impl From<Vec<Value>> for FilterValue {
    fn from(values: Vec<Value>) -> Self {
        FilterValue::Set(values)
    }
}

/// One entry of an associative filter
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Attribute name (any casing) compared with a value or set of values
    Attribute(String, FilterValue),
    /// Raw fragment nested inside the map
    Raw(String, Params),
}

/// Associative filter used by `filter`, `delete` and friends.
///
/// ```
/// use quarry::Conditions;
///
/// let conditions = Conditions::new()
///     .eq("firstName", "Ann")
///     .any("id", [1, 2, 3])
///     .raw("age > ?", quarry::Params::positional([18]));
/// assert_eq!(conditions.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Conditions {
    entries: Vec<Condition>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Equality on `attribute`
    pub fn eq(self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entry(attribute, FilterValue::Scalar(value.into()))
    }

    /// Membership of `attribute` in `values`
    pub fn any<I, V>(self, attribute: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.entry(attribute, FilterValue::Set(values))
    }

    pub fn entry(mut self, attribute: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.entries
            .push(Condition::Attribute(attribute.into(), value.into()));
        self
    }

    pub fn raw(mut self, fragment: impl Into<String>, params: Params) -> Self {
        self.entries.push(Condition::Raw(fragment.into(), params));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.entries.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Conditions
where
    K: Into<String>,
    V: Into<FilterValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Conditions::new(), |acc, (k, v)| acc.entry(k, v))
    }
}

/// A predicate term attached to a statement
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Structured predicate on a column; qualified with the base table on SELECT
    Equals { column: String, value: Value },
    In { column: String, values: Vec<Value> },
    /// Opaque fragment with its parameters
    Raw { fragment: String, params: Params },
    /// Caller-built sea-query expression
    Expr(Expr),
}

impl Predicate {
    /// Turn an associative filter into predicates
    pub fn from_conditions(conditions: Conditions) -> Vec<Predicate> {
        conditions
            .entries
            .into_iter()
            .map(|entry| match entry {
                Condition::Attribute(attribute, FilterValue::Scalar(value)) => Predicate::Equals {
                    column: naming::snake_case(&attribute),
                    value,
                },
                Condition::Attribute(attribute, FilterValue::Set(values)) => Predicate::In {
                    column: naming::snake_case(&attribute),
                    values,
                },
                Condition::Raw(fragment, params) => Predicate::Raw { fragment, params },
            })
            .collect()
    }

    /// Lower into a sea-query expression, qualifying structured columns with
    /// `qualifier` when given
    ///
    /// # Errors
    ///
    /// `MissingParameter` when a named placeholder has no value.
    pub fn to_expr(&self, qualifier: Option<&str>) -> Result<Expr> {
        Ok(match self {
            Predicate::Equals { column, value } => {
                column_ref(qualifier, column).eq(value.clone())
            }
            Predicate::In { column, values } => {
                column_ref(qualifier, column).is_in(values.iter().cloned())
            }
            Predicate::Raw { fragment, params } => raw_expr(fragment, params)?,
            Predicate::Expr(expr) => expr.clone(),
        })
    }
}

/// Build a custom expression from a raw fragment and its parameters
pub(crate) fn raw_expr(fragment: &str, params: &Params) -> Result<Expr> {
    match params {
        Params::None => Ok(Expr::cust(fragment.to_string())),
        Params::Positional(values) => Ok(Expr::cust_with_values(
            number_positional(fragment, values.len())?,
            values.iter().cloned(),
        )),
        Params::Named(named) => {
            let (sql, values) = bind_named(fragment, named)?;
            Ok(Expr::cust_with_values(sql, values))
        }
    }
}

/// Split a fragment into `(quoted, text)` spans. Single- and double-quoted
/// literals are quoted spans; an unterminated literal runs to the end.
fn spans(fragment: &str) -> Vec<(bool, &str)> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    for (idx, c) in fragment.char_indices() {
        match quote {
            None if c == '\'' || c == '"' => {
                if start < idx {
                    out.push((false, &fragment[start..idx]));
                }
                start = idx;
                quote = Some(c);
            }
            Some(open) if c == open => {
                let end = idx + c.len_utf8();
                out.push((true, &fragment[start..end]));
                start = end;
                quote = None;
            }
            _ => {}
        }
    }
    if start < fragment.len() {
        out.push((quote.is_some(), &fragment[start..]));
    }
    out
}

/// Rewrite `?` placeholders outside quoted literals to `$1`, `$2`, ... in
/// order of appearance. `??` stands for a literal `?` (the jsonb operator).
fn number_positional(fragment: &str, values: usize) -> Result<String> {
    let mut sql = String::with_capacity(fragment.len() + 8);
    let mut next = 0;
    for (quoted, text) in spans(fragment) {
        if quoted {
            sql.push_str(text);
            continue;
        }
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '?' {
                sql.push(c);
            } else if chars.next_if_eq(&'?').is_some() {
                sql.push('?');
            } else {
                next += 1;
                sql.push_str(&format!("${next}"));
            }
        }
    }
    if next != values {
        return Err(QuarryError::ParameterCount {
            placeholders: next,
            values,
        });
    }
    Ok(sql)
}

/// Rewrite `:name` placeholders outside quoted literals to numbered ones and
/// order the values accordingly
fn bind_named(fragment: &str, named: &[(String, Value)]) -> Result<(String, Vec<Value>)> {
    let mut values = Vec::new();
    let mut sql = String::with_capacity(fragment.len());
    for (quoted, text) in spans(fragment) {
        if quoted {
            sql.push_str(text);
            continue;
        }
        let mut missing = None;
        let bound = NAMED_PLACEHOLDER.replace_all(text, |caps: &regex::Captures| {
            let name = &caps[2];
            match named.iter().find(|(key, _)| key == name) {
                Some((_, value)) => values.push(value.clone()),
                None => {
                    missing.get_or_insert_with(|| name.to_string());
                }
            }
            format!("{}${}", &caps[1], values.len())
        });
        if let Some(name) = missing {
            return Err(QuarryError::MissingParameter(name));
        }
        sql.push_str(&bound);
    }
    Ok((sql, values))
}
