//! # Quarry
//!
//! Fluent relation query builder and row materializer over sea-query, with a
//! PostgreSQL connection for the `may` coroutine runtime.
//!
//! A [`Relation`] is bound to an [`Entity`] and builds one statement through
//! chained calls: filters, joins inferred from table names, ordering,
//! grouping, windows and `EXISTS` sub-selects. Executing a SELECT returns
//! [`Records`]: entity instances when the rows carry exactly the entity's
//! attributes, raw [`Row`]s otherwise. One related collection can be eager
//! loaded per query with [`Relation::includes`], and rows can be addressed by
//! ordinal (`first()`, `ordinal("twenty-first")`).

pub mod config;
pub mod connection;
pub mod entity;
pub mod error;
pub mod executor;
pub mod include;
pub mod join;
pub mod materialize;
pub mod naming;
pub mod ordinal;
pub mod predicate;
pub mod relation;
pub mod row;
pub mod statement;
pub mod value;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
#[cfg(feature = "tracing")]
mod tracing_helpers;

pub use config::DatabaseConfig;
pub use connection::{establish, established, Connection, Outcome, SharedConnection};
pub use entity::{register, Entity, EntityDef, Model, Record, Records};
pub use error::{QuarryError, Result};
pub use executor::PgConnection;
pub use join::JoinSpec;
pub use predicate::{Conditions, Params};
pub use relation::{Executed, Relation};
pub use row::Row;
pub use statement::{JoinCondition, JoinKind, Operation, OrderTerm, Statement};
pub use value::{FromValue, ValueError};
