//! The fluent relation builder.
//!
//! A [`Relation`] owns one [`Statement`] bound to an entity. Builder calls
//! take and return the relation by value; terminal calls (`all`, `execute`,
//! `range`, `page`, the ordinal accessors) borrow it, so the same relation can
//! be run more than once.
//!
//! ```
//! use quarry::{Conditions, Entity, Model, Relation, Result, Row};
//! use sea_query::Value;
//!
//! #[derive(Debug, Clone, Default)]
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! impl Model for User {
//!     fn fill_attributes(&mut self, row: &Row) -> Result<()> {
//!         self.id = row.try_get("id")?;
//!         self.name = row.try_get("name")?;
//!         Ok(())
//!     }
//!
//!     fn attribute(&self, name: &str) -> Option<Value> {
//!         match name {
//!             "id" => Some(self.id.into()),
//!             "name" => Some(self.name.clone().into()),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! impl Entity for User {
//!     fn attributes() -> &'static [&'static str] {
//!         &["id", "name"]
//!     }
//! }
//!
//! let sql = User::query()
//!     .filter(Conditions::new().eq("name", "Ann"))
//!     .order_by(("id", -1))
//!     .take(2)
//!     .to_sql()
//!     .unwrap();
//! assert_eq!(
//!     sql,
//!     r#"SELECT * FROM "users" WHERE "users"."name" = 'Ann' ORDER BY "id" DESC LIMIT 2"#
//! );
//! ```

use crate::connection::SharedConnection;
use crate::entity::{self, Entity, EntityDef, Record, Records};
use crate::error::{QuarryError, Result};
use crate::include::{self, Include};
use crate::join::{self, JoinSpec, Source};
use crate::materialize;
use crate::naming;
use crate::ordinal;
use crate::predicate::{Conditions, Params, Predicate};
use crate::statement::{JoinCondition, JoinKind, Operation, OrderTerm, Statement, Window};
use sea_query::{Expr, Value};

/// Result of a terminal call
#[derive(Debug, Clone)]
pub enum Executed {
    /// SELECT result
    Records(Records),
    /// Affected-row count of INSERT, UPDATE or DELETE
    Affected(u64),
}

impl Executed {
    pub fn records(self) -> Option<Records> {
        match self {
            Executed::Records(records) => Some(records),
            Executed::Affected(_) => None,
        }
    }

    pub fn affected(&self) -> Option<u64> {
        match self {
            Executed::Affected(n) => Some(*n),
            Executed::Records(_) => None,
        }
    }
}

/// Generates the named ordinal accessors
macro_rules! ordinal_accessors {
    ($($name:ident => $position:literal),* $(,)?) => {
        $(
            #[doc = concat!("Row at position ", stringify!($position), ", fetched with a one-row window")]
            pub fn $name(&self) -> Result<Option<Record>> {
                self.nth_row($position)
            }
        )*
    };
}

/// Statement builder bound to an entity
#[derive(Clone)]
pub struct Relation {
    entity: EntityDef,
    statement: Statement,
    connection: Option<SharedConnection>,
    include: Option<Include>,
    /// First builder misuse, reported by the next terminal call
    deferred: Option<Deferred>,
}

/// Builder error held until a terminal call can return it
#[derive(Debug, Clone)]
struct Deferred {
    error: fn(String) -> QuarryError,
    message: String,
}

impl Deferred {
    fn to_error(&self) -> QuarryError {
        (self.error)(self.message.clone())
    }
}

impl std::fmt::Debug for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relation")
            .field("entity", &self.entity)
            .field("statement", &self.statement)
            .field("include", &self.include)
            .field("bound_connection", &self.connection.is_some())
            .finish()
    }
}

impl Relation {
    /// SELECT relation on `E`
    pub fn new<E: Entity>() -> Self {
        Self::from_def(E::definition(), Operation::Select)
    }

    /// Relation on `E` for an operation given by code (1..=4) or name
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` for unknown codes or names.
    pub fn for_kind<E, K>(kind: K) -> Result<Self>
    where
        E: Entity,
        K: TryInto<Operation, Error = QuarryError>,
    {
        Ok(Self::from_def(E::definition(), kind.try_into()?))
    }

    pub fn from_def(entity: EntityDef, kind: Operation) -> Self {
        Relation {
            statement: Statement::new(kind, entity.table()),
            entity,
            connection: None,
            include: None,
            deferred: None,
        }
    }

    /// Run on `connection` instead of the entity's connection
    pub fn with_connection(mut self, connection: SharedConnection) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn entity(&self) -> &EntityDef {
        &self.entity
    }

    pub fn include(&self) -> Option<&Include> {
        self.include.as_ref()
    }

    /// The connection terminal calls will use
    ///
    /// # Errors
    ///
    /// `NoConnection` when neither the relation nor the entity has one.
    pub fn connection(&self) -> Result<SharedConnection> {
        match &self.connection {
            Some(connection) => Ok(connection.clone()),
            None => self.entity.connection(),
        }
    }

    fn defer(&mut self, error: fn(String) -> QuarryError, message: String) {
        log::warn!("{message}");
        self.deferred.get_or_insert(Deferred { error, message });
    }

    fn require(&mut self, kinds: &[Operation], call: &str) -> bool {
        let kind = self.statement.kind();
        if kinds.contains(&kind) {
            return true;
        }
        self.defer(
            QuarryError::UnsupportedOperation,
            format!("{call}() on a {kind} relation"),
        );
        false
    }

    /// Project columns. The first call replaces the default `*`, later calls
    /// extend the list.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for column in columns {
            self.statement.project(column);
        }
        self
    }

    pub fn select_column(self, column: impl Into<String>) -> Self {
        self.select([column])
    }

    /// Associative filter: snake_cased keys, equality for scalars, `IN` for
    /// sets, nested raw fragments passed through
    pub fn filter(mut self, conditions: Conditions) -> Self {
        for predicate in Predicate::from_conditions(conditions) {
            self.statement.and_where(predicate);
        }
        self
    }

    /// Raw predicate with `?` or `:name` placeholders
    pub fn where_raw(mut self, fragment: impl Into<String>, params: Params) -> Self {
        self.statement.and_where(Predicate::Raw {
            fragment: fragment.into(),
            params,
        });
        self
    }

    /// Predicate built directly with sea-query
    pub fn where_expr(mut self, expr: Expr) -> Self {
        self.statement.and_where(Predicate::Expr(expr));
        self
    }

    /// Rows to delete, same argument handling as [`Relation::filter`]
    pub fn delete(mut self, conditions: Conditions) -> Self {
        self.require(&[Operation::Delete], "delete");
        self.filter(conditions)
    }

    /// Rows to delete, same argument handling as [`Relation::where_raw`]
    pub fn delete_raw(mut self, fragment: impl Into<String>, params: Params) -> Self {
        self.require(&[Operation::Delete], "delete_raw");
        self.where_raw(fragment, params)
    }

    /// Column values for an INSERT; an empty map leaves the statement untouched
    pub fn insert<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.assign(values, Operation::Insert, "insert");
        self
    }

    /// Column values for an UPDATE; an empty map leaves the statement untouched
    pub fn set<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.assign(values, Operation::Update, "set");
        self
    }

    fn assign<I, K, V>(&mut self, values: I, kind: Operation, call: &str)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut values = values.into_iter().peekable();
        if values.peek().is_none() || !self.require(&[kind], call) {
            return;
        }
        for (column, value) in values {
            self.statement
                .assign(naming::snake_case(column.as_ref()), value.into());
        }
    }

    /// Inner join
    pub fn join(self, spec: impl Into<JoinSpec>) -> Self {
        self.join_as(spec, JoinKind::Inner)
    }

    pub fn inner_join(self, spec: impl Into<JoinSpec>) -> Self {
        self.join_as(spec, JoinKind::Inner)
    }

    pub fn left_join(self, spec: impl Into<JoinSpec>) -> Self {
        self.join_as(spec, JoinKind::Left)
    }

    pub fn full_join(self, spec: impl Into<JoinSpec>) -> Self {
        self.join_as(spec, JoinKind::Full)
    }

    /// Join hanging off the base table (or its alias)
    pub fn join_as(mut self, spec: impl Into<JoinSpec>, kind: JoinKind) -> Self {
        let table = self.statement.table().to_string();
        let source = Source {
            table: &table,
            qualifier: self.statement.qualifier(),
        };
        let clauses = join::expand(&spec.into(), kind, source);
        for clause in clauses {
            self.statement.join(clause);
        }
        self
    }

    /// Join hanging off `source`, an already joined table
    pub fn join_from(mut self, spec: impl Into<JoinSpec>, kind: JoinKind, source: &str) -> Self {
        for clause in join::expand(&spec.into(), kind, Source::table(source)) {
            self.statement.join(clause);
        }
        self
    }

    /// Explicit ON-predicate for the most recent join. The first one replaces
    /// the naming convention, later ones are AND-ed.
    pub fn on(mut self, condition: impl Into<JoinCondition>) -> Self {
        if !self.statement.on(condition.into()) {
            self.defer(
                QuarryError::UnsupportedOperation,
                "on() without a preceding join".to_string(),
            );
        }
        self
    }

    /// Alias the base table
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.statement.set_alias(name);
        self
    }

    pub fn order<I, T>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OrderTerm>,
    {
        for term in terms {
            self.statement.order(term.into());
        }
        self
    }

    pub fn order_by(self, term: impl Into<OrderTerm>) -> Self {
        self.order([term])
    }

    pub fn group_by(mut self, attribute: impl Into<String>) -> Self {
        self.statement.group_by(attribute);
        self
    }

    /// `EXISTS (sub)`
    pub fn exists(mut self, sub: Relation) -> Self {
        self.statement.exists(sub.statement, false);
        self
    }

    /// `NOT EXISTS (sub)`
    pub fn not_exists(mut self, sub: Relation) -> Self {
        self.statement.exists(sub.statement, true);
        self
    }

    /// Eager-load the related collection named `related` (`"comments"`),
    /// attached to each instance under that name. Replaces an earlier include.
    pub fn includes(mut self, related: &str) -> Self {
        match entity::resolve_related(&self.entity, related) {
            Ok(def) => self.include = Some(Include::new(def, related)),
            Err(QuarryError::UnknownRelatedType(name)) => {
                self.defer(QuarryError::UnknownRelatedType, name)
            }
            Err(err) => self.defer(QuarryError::UnsupportedOperation, err.to_string()),
        }
        self
    }

    /// Rebind the base table and entity
    #[allow(clippy::should_implement_trait)]
    pub fn from(mut self, entity: EntityDef) -> Self {
        self.statement.set_table(entity.table());
        self.entity = entity;
        self
    }

    /// Skip `offset` rows
    pub fn skip(mut self, offset: u64) -> Self {
        let window = self.statement.window();
        self.statement.set_window(Window { offset, ..window });
        self
    }

    /// Return at most `length` rows
    pub fn take(mut self, length: u64) -> Self {
        let window = self.statement.window();
        self.statement.set_window(Window {
            length: Some(length),
            ..window
        });
        self
    }

    /// Render through the connection's renderer, or the default PostgreSQL
    /// rendering when no connection is bound
    ///
    /// # Errors
    ///
    /// Deferred builder misuse, then build errors from lowering the statement.
    pub fn to_sql(&self) -> Result<String> {
        if let Some(deferred) = &self.deferred {
            return Err(deferred.to_error());
        }
        match self.connection() {
            Ok(connection) => connection.render(&self.statement),
            Err(QuarryError::NoConnection) => self.statement.to_sql(),
            Err(err) => Err(err),
        }
    }

    /// Execute and return the materialized SELECT result
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` for non-SELECT relations and deferred builder
    /// misuse, plus connection errors.
    pub fn all(&self) -> Result<Records> {
        if let Some(deferred) = &self.deferred {
            return Err(deferred.to_error());
        }
        if self.statement.kind() != Operation::Select {
            return Err(self.not_a_select("all"));
        }
        match self.run(&self.statement)? {
            Executed::Records(records) => Ok(records),
            Executed::Affected(_) => Err(self.not_a_select("all")),
        }
    }

    /// Execute the statement
    ///
    /// # Errors
    ///
    /// Deferred builder misuse and connection errors.
    pub fn execute(&self) -> Result<Executed> {
        self.run(&self.statement)
    }

    /// Set the window to (`offset`, `length`) and execute
    ///
    /// # Errors
    ///
    /// As [`Relation::all`].
    pub fn range(&self, offset: u64, length: u64) -> Result<Records> {
        self.clone().skip(offset).take(length).all()
    }

    /// 1-based page of `per_page` rows
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` when the page offset overflows, otherwise as
    /// [`Relation::all`].
    pub fn page(&self, number: u64, per_page: u64) -> Result<Records> {
        let offset = number.saturating_sub(1).checked_mul(per_page).ok_or_else(|| {
            QuarryError::UnsupportedOperation(format!(
                "page {number} of {per_page} rows is past the addressable offset"
            ))
        })?;
        self.range(offset, per_page)
    }

    /// Row at 1-based `position`, `None` past the end
    ///
    /// # Errors
    ///
    /// `AttributeNotFound` for position 0, otherwise as [`Relation::all`].
    pub fn nth_row(&self, position: usize) -> Result<Option<Record>> {
        let offset = position
            .checked_sub(1)
            .ok_or_else(|| QuarryError::AttributeNotFound(format!("row {position}")))?;
        Ok(self.range(offset as u64, 1)?.into_first())
    }

    /// Row named by an ordinal word: `"third"`, `"twenty-first"`
    ///
    /// # Errors
    ///
    /// `AttributeNotFound` when `name` is not an ordinal.
    pub fn ordinal(&self, name: &str) -> Result<Option<Record>> {
        let position =
            ordinal::resolve(name).ok_or_else(|| QuarryError::AttributeNotFound(name.to_string()))?;
        self.nth_row(position)
    }

    ordinal_accessors! {
        first => 1,
        second => 2,
        third => 3,
        fourth => 4,
        fifth => 5,
        sixth => 6,
        seventh => 7,
        eighth => 8,
        ninth => 9,
        tenth => 10,
    }

    fn not_a_select(&self, call: &str) -> QuarryError {
        QuarryError::UnsupportedOperation(format!(
            "{call}() on a {} relation; use execute()",
            self.statement.kind()
        ))
    }

    fn run(&self, statement: &Statement) -> Result<Executed> {
        if let Some(deferred) = &self.deferred {
            return Err(deferred.to_error());
        }
        match statement.kind() {
            Operation::Select => {
                let connection = self.connection()?;
                let rows = connection.execute(statement)?.into_rows();
                let records = materialize::materialize(&self.entity, rows)?;
                let records = match &self.include {
                    Some(include) => include::resolve(
                        records,
                        &self.entity,
                        include,
                        self.connection.as_ref(),
                    )?,
                    None => records,
                };
                Ok(Executed::Records(records))
            }
            Operation::Insert | Operation::Update if statement.assignments().is_empty() => {
                log::debug!("{} without assignments, nothing to execute", statement.kind());
                Ok(Executed::Affected(0))
            }
            Operation::Insert | Operation::Update | Operation::Delete => {
                let connection = self.connection()?;
                Ok(Executed::Affected(connection.execute(statement)?.affected()))
            }
        }
    }
}
