//! Entity types and materialized result collections.
//!
//! An [`Entity`] is bound to one table and knows the attribute set a row must
//! carry to be turned into an instance. [`Model`] is its object-safe instance
//! side, which lets a [`Records`] collection hold entities of a type only known
//! at runtime (related entities resolved through the registry).

use crate::connection::{self, SharedConnection};
use crate::error::{QuarryError, Result};
use crate::naming;
use crate::relation::Relation;
use crate::row::Row;
use once_cell::sync::Lazy;
use sea_query::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

/// Access to `Any` through a trait object
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Clone through a trait object
pub trait CloneModel {
    fn clone_model(&self) -> Box<dyn Model>;
}

impl<T: Model + Clone> CloneModel for T {
    fn clone_model(&self) -> Box<dyn Model> {
        Box::new(self.clone())
    }
}

/// Instance side of an entity.
///
/// Implementations fill their fields from a [`Row`] whose column set has
/// already been checked against [`Entity::attributes`].
pub trait Model: AsAny + CloneModel + fmt::Debug + Send {
    /// Populate the instance from a row. No other hooks run.
    ///
    /// # Errors
    ///
    /// Value conversion errors from [`Row::try_get`].
    fn fill_attributes(&mut self, row: &Row) -> Result<()>;

    /// Read an attribute by column name, `None` if there is no such attribute
    fn attribute(&self, name: &str) -> Option<Value>;

    /// Receive eagerly loaded children stored under `key`
    fn attach(&mut self, key: &str, records: Records) {
        log::debug!(
            "{} ignores {} included record(s) under `{key}`",
            std::any::type_name::<Self>(),
            records.len()
        );
    }
}

impl Clone for Box<dyn Model> {
    fn clone(&self) -> Self {
        self.clone_model()
    }
}

/// Static side of an entity: table binding and expected row shape.
///
/// ```
/// use quarry::{Entity, Model, Result, Row};
/// use sea_query::Value;
///
/// #[derive(Debug, Clone, Default)]
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// impl Model for User {
///     fn fill_attributes(&mut self, row: &Row) -> Result<()> {
///         self.id = row.try_get("id")?;
///         self.name = row.try_get("name")?;
///         Ok(())
///     }
///
///     fn attribute(&self, name: &str) -> Option<Value> {
///         match name {
///             "id" => Some(self.id.into()),
///             "name" => Some(self.name.clone().into()),
///             _ => None,
///         }
///     }
/// }
///
/// impl Entity for User {
///     fn attributes() -> &'static [&'static str] {
///         &["id", "name"]
///     }
/// }
///
/// assert_eq!(User::table_name(), "users");
/// assert_eq!(User::primary_key(), "id");
/// ```
pub trait Entity: Model + Default + Clone + 'static {
    /// Table name; defaults to the pluralized snake_case type name
    fn table_name() -> String {
        naming::tableize(short_name(std::any::type_name::<Self>()))
    }

    fn primary_key() -> &'static str {
        "id"
    }

    /// Column names a row must carry, exactly, to become an instance
    fn attributes() -> &'static [&'static str];

    /// Connection used by relations on this entity
    fn connection() -> Result<SharedConnection> {
        connection::established()
    }

    fn definition() -> EntityDef {
        EntityDef::of::<Self>()
    }

    /// SELECT relation on this entity
    fn query() -> Relation {
        Relation::new::<Self>()
    }
}

/// `crate::models::BlogPost` → `BlogPost`, generics stripped
fn short_name(type_name: &str) -> &str {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base)
}

/// `crate::models::BlogPost` → `crate::models`
fn module_path(type_name: &str) -> &str {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit_once("::").map(|(module, _)| module).unwrap_or("")
}

fn instantiate<E: Entity>() -> Box<dyn Model> {
    Box::<E>::default()
}

/// Runtime handle on an entity type
#[derive(Clone, Copy)]
pub struct EntityDef {
    type_name: &'static str,
    table: fn() -> String,
    primary_key: fn() -> &'static str,
    attributes: fn() -> &'static [&'static str],
    construct: fn() -> Box<dyn Model>,
    connection: fn() -> Result<SharedConnection>,
}

impl EntityDef {
    pub fn of<E: Entity>() -> Self {
        EntityDef {
            type_name: std::any::type_name::<E>(),
            table: E::table_name,
            primary_key: E::primary_key,
            attributes: E::attributes,
            construct: instantiate::<E>,
            connection: E::connection,
        }
    }

    /// Fully qualified type name
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Bare type name, as `includes` names it
    pub fn name(&self) -> &'static str {
        short_name(self.type_name)
    }

    pub fn module_path(&self) -> &'static str {
        module_path(self.type_name)
    }

    pub fn table(&self) -> String {
        (self.table)()
    }

    pub fn primary_key(&self) -> &'static str {
        (self.primary_key)()
    }

    pub fn attributes(&self) -> &'static [&'static str] {
        (self.attributes)()
    }

    /// Fresh default instance
    pub fn instantiate(&self) -> Box<dyn Model> {
        (self.construct)()
    }

    pub fn connection(&self) -> Result<SharedConnection> {
        (self.connection)()
    }

    pub fn is<E: Entity>(&self) -> bool {
        self.type_name == std::any::type_name::<E>()
    }
}

impl fmt::Debug for EntityDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDef")
            .field("type", &self.type_name)
            .field("table", &self.table())
            .finish()
    }
}

impl PartialEq for EntityDef {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name
    }
}

static REGISTRY: Lazy<RwLock<BTreeMap<&'static str, EntityDef>>> =
    Lazy::new(|| RwLock::new(BTreeMap::new()));

/// Make `E` resolvable by name from `includes`
pub fn register<E: Entity>() -> EntityDef {
    let def = E::definition();
    REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(def.type_name, def);
    log::debug!("registered entity {} on table {}", def.type_name, def.table());
    def
}

/// Resolve a related name (`comments`, `Comment`) relative to `current`.
///
/// The type living next to `current` wins; otherwise any registered type
/// with that bare name.
///
/// # Errors
///
/// `UnknownRelatedType` when nothing registered matches.
pub fn resolve_related(current: &EntityDef, name: &str) -> Result<EntityDef> {
    let class = naming::classify(name);
    let registry = REGISTRY.read().unwrap_or_else(PoisonError::into_inner);

    let sibling = format!("{}::{}", current.module_path(), class);
    if let Some(def) = registry.get(sibling.as_str()) {
        return Ok(*def);
    }
    registry
        .values()
        .find(|def| def.name() == class)
        .copied()
        .ok_or(QuarryError::UnknownRelatedType(class))
}

/// Result of a SELECT: raw rows or materialized entities, never both.
#[derive(Debug, Clone)]
pub enum Records {
    Rows(Vec<Row>),
    Models(Vec<Box<dyn Model>>),
}

impl Default for Records {
    fn default() -> Self {
        Records::Rows(Vec::new())
    }
}

impl Records {
    pub fn len(&self) -> usize {
        match self {
            Records::Rows(rows) => rows.len(),
            Records::Models(models) => models.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether rows were turned into entities
    pub fn is_materialized(&self) -> bool {
        matches!(self, Records::Models(_))
    }

    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            Records::Rows(rows) => Some(rows),
            Records::Models(_) => None,
        }
    }

    pub fn models(&self) -> Option<&[Box<dyn Model>]> {
        match self {
            Records::Models(models) => Some(models),
            Records::Rows(_) => None,
        }
    }

    /// Borrow the entities of type `E`; empty for raw rows or other types
    pub fn entities<E: Entity>(&self) -> Vec<&E> {
        self.models()
            .unwrap_or_default()
            .iter()
            .filter_map(|model| (**model).as_any().downcast_ref::<E>())
            .collect()
    }

    /// Take the entities out as `E`. `None` if the collection holds raw rows
    /// or any element is of another type.
    pub fn into_entities<E: Entity>(self) -> Option<Vec<E>> {
        match self {
            Records::Models(models) => models
                .into_iter()
                .map(|model| model.into_any().downcast::<E>().ok().map(|boxed| *boxed))
                .collect(),
            Records::Rows(_) => None,
        }
    }

    /// First element, keeping the collection's element kind
    pub(crate) fn into_first(self) -> Option<Record> {
        match self {
            Records::Rows(rows) => rows.into_iter().next().map(Record::Row),
            Records::Models(models) => models.into_iter().next().map(Record::Model),
        }
    }
}

/// Single element of a [`Records`] collection
#[derive(Debug, Clone)]
pub enum Record {
    Row(Row),
    Model(Box<dyn Model>),
}

impl Record {
    pub fn as_row(&self) -> Option<&Row> {
        match self {
            Record::Row(row) => Some(row),
            Record::Model(_) => None,
        }
    }

    pub fn as_entity<E: Entity>(&self) -> Option<&E> {
        match self {
            Record::Model(model) => (**model).as_any().downcast_ref::<E>(),
            Record::Row(_) => None,
        }
    }

    pub fn into_entity<E: Entity>(self) -> Option<E> {
        match self {
            Record::Model(model) => model.into_any().downcast::<E>().ok().map(|boxed| *boxed),
            Record::Row(_) => None,
        }
    }

    /// Attribute (or column) value regardless of the element kind
    pub fn get(&self, name: &str) -> Option<Value> {
        match self {
            Record::Row(row) => row.get(name).cloned(),
            Record::Model(model) => model.attribute(name),
        }
    }
}
