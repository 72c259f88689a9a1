//! Eager loading of one related collection.
//!
//! Children are fetched with a single `IN` query on the foreign key derived
//! from the parent table (`posts` → `post_id`), grouped by that key and
//! attached to every parent, including parents without children.

use crate::connection::SharedConnection;
use crate::entity::{EntityDef, Model, Records};
use crate::error::Result;
use crate::naming;
use crate::predicate::Conditions;
use crate::relation::Relation;
use crate::row::Row;
use crate::statement::Operation;
use crate::value;
use sea_query::Value;
use std::collections::{HashMap, HashSet};

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// Related entity to load and the key children are attached under
#[derive(Debug, Clone, PartialEq)]
pub struct Include {
    pub related: EntityDef,
    pub key: String,
}

impl Include {
    pub fn new(related: EntityDef, key: impl Into<String>) -> Self {
        Include {
            related,
            key: key.into(),
        }
    }
}

/// Load and attach the related collection.
///
/// Raw rows and empty collections are returned untouched without a query.
/// The child query runs on `connection` when the parent relation overrides
/// its entity's connection, otherwise on the related entity's own.
///
/// # Errors
///
/// Errors from the child query or from materializing the children.
pub fn resolve(
    records: Records,
    parent: &EntityDef,
    include: &Include,
    connection: Option<&SharedConnection>,
) -> Result<Records> {
    let mut parents = match records {
        Records::Models(models) if !models.is_empty() => models,
        Records::Rows(rows) if !rows.is_empty() => {
            log::warn!(
                "rows did not materialize as {}, skipping include of {}",
                parent.name(),
                include.key
            );
            return Ok(Records::Rows(rows));
        }
        empty => return Ok(empty),
    };

    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::include_span(include.related.name(), parents.len()).entered();

    let primary_key = parent.primary_key();
    let foreign_key = naming::foreign_key(&parent.table());

    let mut seen = HashSet::new();
    let keys: Vec<Value> = parents
        .iter()
        .filter_map(|model| model.attribute(primary_key))
        .filter(|key| value::match_key(key).is_some_and(|k| seen.insert(k)))
        .collect();

    let children = if keys.is_empty() {
        Records::Models(Vec::new())
    } else {
        let mut children = Relation::from_def(include.related, Operation::Select);
        if let Some(connection) = connection {
            children = children.with_connection(connection.clone());
        }
        children.filter(Conditions::new().any(foreign_key.as_str(), keys)).all()?
    };
    log::debug!(
        "include {}: {} child row(s) for {} parent(s) on {}",
        include.key,
        children.len(),
        parents.len(),
        foreign_key
    );

    match children {
        Records::Models(models) => {
            let groups = group_by_key(models, |m| m.attribute(&foreign_key));
            attach_all(&mut parents, primary_key, &include.key, &groups, Records::Models);
        }
        Records::Rows(rows) => {
            let groups = group_by_key(rows, |r: &Row| r.get(&foreign_key).cloned());
            attach_all(&mut parents, primary_key, &include.key, &groups, Records::Rows);
        }
    }
    Ok(Records::Models(parents))
}

/// Bucket items by the match key of their foreign key value; items without one are dropped
fn group_by_key<T>(items: Vec<T>, key_of: impl Fn(&T) -> Option<Value>) -> HashMap<String, Vec<T>> {
    let mut groups: HashMap<String, Vec<T>> = HashMap::new();
    for item in items {
        if let Some(key) = key_of(&item).as_ref().and_then(value::match_key) {
            groups.entry(key).or_default().push(item);
        }
    }
    groups
}

fn attach_all<T: Clone>(
    parents: &mut [Box<dyn Model>],
    primary_key: &str,
    storage_key: &str,
    groups: &HashMap<String, Vec<T>>,
    wrap: fn(Vec<T>) -> Records,
) {
    for parent in parents.iter_mut() {
        let subset = parent
            .attribute(primary_key)
            .as_ref()
            .and_then(value::match_key)
            .and_then(|key| groups.get(&key).cloned())
            .unwrap_or_default();
        parent.attach(storage_key, wrap(subset));
    }
}
