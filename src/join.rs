//! Join tree expansion.
//!
//! A [`JoinSpec`] is a tree of tables. Expansion walks it depth first and emits
//! one [`JoinClause`] per table, each referencing its immediate parent in the
//! tree (or the base table at the top) through the `<singular parent>_id`
//! convention.

use crate::naming;
use crate::statement::{JoinClause, JoinKind};

/// Nested join specification.
///
/// ```
/// use quarry::JoinSpec;
///
/// // posts off the base table, then comments and moderators both off posts
/// let spec = JoinSpec::nested("posts", ["comments", "moderators"]);
/// assert_eq!(spec.tables(), vec!["posts", "comments", "moderators"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinSpec {
    /// Single table joined off the current source
    Table(String),
    /// Table joined off the current source, with `child` joined off it
    Nested(String, Box<JoinSpec>),
    /// Independent joins off the same source
    Siblings(Vec<JoinSpec>),
}

impl JoinSpec {
    pub fn table(name: impl Into<String>) -> Self {
        JoinSpec::Table(name.into())
    }

    pub fn nested(name: impl Into<String>, child: impl Into<JoinSpec>) -> Self {
        JoinSpec::Nested(name.into(), Box::new(child.into()))
    }

    pub fn siblings<I, S>(specs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<JoinSpec>,
    {
        JoinSpec::Siblings(specs.into_iter().map(Into::into).collect())
    }

    /// Tables in expansion order
    pub fn tables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_tables(&mut out);
        out
    }

    fn collect_tables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            JoinSpec::Table(name) => out.push(name),
            JoinSpec::Nested(name, child) => {
                out.push(name);
                child.collect_tables(out);
            }
            JoinSpec::Siblings(specs) => specs.iter().for_each(|s| s.collect_tables(out)),
        }
    }
}

impl From<&str> for JoinSpec {
    fn from(name: &str) -> Self {
        JoinSpec::table(name)
    }
}

impl From<String> for JoinSpec {
    fn from(name: String) -> Self {
        JoinSpec::Table(name)
    }
}

impl<T: Into<JoinSpec>> From<Vec<T>> for JoinSpec {
    fn from(specs: Vec<T>) -> Self {
        JoinSpec::siblings(specs)
    }
}

impl<T: Into<JoinSpec>, const N: usize> From<[T; N]> for JoinSpec {
    fn from(specs: [T; N]) -> Self {
        JoinSpec::siblings(specs)
    }
}

/// Side a join hangs off: the real table name drives the foreign key, the
/// qualifier is what the ON-predicate refers to (an alias for the base table).
#[derive(Debug, Clone, Copy)]
pub(crate) struct Source<'a> {
    pub table: &'a str,
    pub qualifier: &'a str,
}

impl<'a> Source<'a> {
    pub fn table(table: &'a str) -> Self {
        Source {
            table,
            qualifier: table,
        }
    }
}

/// Expand `spec` into join clauses hanging off `source`
pub(crate) fn expand(spec: &JoinSpec, kind: JoinKind, source: Source<'_>) -> Vec<JoinClause> {
    let mut clauses = Vec::new();
    expand_into(spec, kind, source, &mut clauses);
    clauses
}

fn expand_into(spec: &JoinSpec, kind: JoinKind, source: Source<'_>, out: &mut Vec<JoinClause>) {
    match spec {
        JoinSpec::Table(table) => out.push(clause(table, kind, source)),
        JoinSpec::Nested(table, child) => {
            out.push(clause(table, kind, source));
            expand_into(child, kind, Source::table(table), out);
        }
        JoinSpec::Siblings(specs) => {
            for spec in specs {
                expand_into(spec, kind, source, out);
            }
        }
    }
}

fn clause(table: &str, kind: JoinKind, source: Source<'_>) -> JoinClause {
    let foreign_key = naming::foreign_key(source.table);
    log::trace!(
        "join {:?} {} on {}.{} = {}.id",
        kind,
        table,
        table,
        foreign_key,
        source.qualifier
    );
    JoinClause {
        table: table.to_string(),
        kind,
        source: source.qualifier.to_string(),
        foreign_key,
        explicit: Vec::new(),
    }
}
