//! Row materialization.
//!
//! Rows become entities only when the first row's column set is exactly the
//! entity's attribute set. Anything else (a projection, a join, an aggregate)
//! comes back as raw rows.

use crate::entity::{EntityDef, Records};
use crate::error::Result;
use crate::row::Row;
use std::collections::BTreeSet;

/// Whether rows shaped like `row` can fill `entity`
pub fn shape_matches(entity: &EntityDef, row: &Row) -> bool {
    let expected: BTreeSet<&str> = entity.attributes().iter().copied().collect();
    row.column_set() == expected
}

/// Turn a SELECT result into a collection.
///
/// Empty input yields an empty entity collection without touching the
/// entity. Only the first row's shape is inspected.
///
/// # Errors
///
/// Value conversion errors raised while filling an instance.
pub fn materialize(entity: &EntityDef, rows: Vec<Row>) -> Result<Records> {
    let Some(first) = rows.first() else {
        return Ok(Records::Models(Vec::new()));
    };

    if !shape_matches(entity, first) {
        log::debug!(
            "columns {:?} do not match {} attributes {:?}, returning raw rows",
            first.column_set(),
            entity.name(),
            entity.attributes()
        );
        return Ok(Records::Rows(rows));
    }

    let models = rows
        .iter()
        .map(|row| {
            let mut model = entity.instantiate();
            model.fill_attributes(row)?;
            Ok(model)
        })
        .collect::<Result<Vec<_>>>()?;
    log::debug!("materialized {} {} instance(s)", models.len(), entity.name());
    Ok(Records::Models(models))
}
