//! The statement under construction.
//!
//! A [`Statement`] records builder calls as plain data and is lowered into a
//! sea-query statement only when it is rendered or executed. Keeping the staged
//! form lets `on()` amend the most recent join and lets the include resolver
//! and tests inspect what was built.

use crate::error::{QuarryError, Result};
use crate::predicate::Predicate;
use sea_query::{
    Asterisk, DeleteStatement, Expr, ExprTrait, Iden, InsertStatement, JoinType, Order,
    PostgresQueryBuilder, Query, QueryStatementWriter, SelectStatement, UpdateStatement, Value,
    Values,
};
use std::fmt;
use std::str::FromStr;

/// Identifier built from a runtime string
#[derive(Debug, Clone)]
pub(crate) struct Ident(String);

impl Ident {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Ident(name.into())
    }
}

impl Iden for Ident {
    fn unquoted(&self) -> &str {
        &self.0
    }
}

/// Column expression, qualified when a table (or alias) is given
pub(crate) fn column_ref(qualifier: Option<&str>, column: &str) -> Expr {
    match qualifier {
        Some(table) => Expr::col((Ident::new(table), Ident::new(column))),
        None => Expr::col(Ident::new(column)),
    }
}

/// Column named by the caller: `name`, `posts.title`, `*` or `posts.*`
fn named_column(name: &str) -> Expr {
    match name.split_once('.') {
        Some((table, "*")) => Expr::cust(format!("\"{table}\".*")),
        Some((table, column)) => column_ref(Some(table), column),
        None if name == "*" => Expr::col(Asterisk),
        None => column_ref(None, name),
    }
}

/// Statement kind, fixed for the lifetime of a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operation {
    #[default]
    Select,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Select => "select",
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Numeric operation codes: 1 select, 2 insert, 3 update, 4 delete
impl TryFrom<i64> for Operation {
    type Error = QuarryError;

    fn try_from(code: i64) -> Result<Self> {
        match code {
            1 => Ok(Operation::Select),
            2 => Ok(Operation::Insert),
            3 => Ok(Operation::Update),
            4 => Ok(Operation::Delete),
            other => Err(QuarryError::UnsupportedOperation(format!(
                "unknown operation code {other}"
            ))),
        }
    }
}

impl TryFrom<&str> for Operation {
    type Error = QuarryError;

    fn try_from(name: &str) -> Result<Self> {
        name.parse()
    }
}

impl FromStr for Operation {
    type Err = QuarryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "select" => Ok(Operation::Select),
            "insert" => Ok(Operation::Insert),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            _ => Err(QuarryError::UnsupportedOperation(s.to_string())),
        }
    }
}

/// Join flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
    Full,
}

impl From<JoinKind> for JoinType {
    fn from(kind: JoinKind) -> Self {
        match kind {
            JoinKind::Inner => JoinType::InnerJoin,
            JoinKind::Left => JoinType::LeftJoin,
            JoinKind::Right => JoinType::RightJoin,
            JoinKind::Full => JoinType::FullOuterJoin,
        }
    }
}

/// Explicit ON-predicate supplied through `on()`
#[derive(Debug, Clone, PartialEq)]
pub enum JoinCondition {
    Raw(String),
    Expr(Expr),
}

impl From<&str> for JoinCondition {
    fn from(s: &str) -> Self {
        JoinCondition::Raw(s.to_string())
    }
}

impl From<String> for JoinCondition {
    fn from(s: String) -> Self {
        JoinCondition::Raw(s)
    }
}

impl From<Expr> for JoinCondition {
    fn from(expr: Expr) -> Self {
        JoinCondition::Expr(expr)
    }
}

/// One join of the statement
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub table: String,
    pub kind: JoinKind,
    /// Table (or alias) the join hangs off
    pub source: String,
    /// Column on `table` that references `source.id` by convention
    pub foreign_key: String,
    /// Explicit predicates; when empty the convention applies
    pub explicit: Vec<JoinCondition>,
}

impl JoinClause {
    pub fn is_conventional(&self) -> bool {
        self.explicit.is_empty()
    }

    /// `table.foreign_key = source.id`, or the explicit predicates AND-ed
    pub fn condition(&self) -> Expr {
        let mut conditions = self.explicit.iter().map(|c| match c {
            JoinCondition::Raw(sql) => Expr::cust(sql.clone()),
            JoinCondition::Expr(expr) => expr.clone(),
        });
        match conditions.next() {
            Some(first) => conditions.fold(first, |acc, next| acc.and(next)),
            None => column_ref(Some(&self.table), &self.foreign_key)
                .equals((Ident::new(&self.source), Ident::new("id"))),
        }
    }
}

/// Order term; ascending unless built from a non-positive magnitude
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    pub column: String,
    pub ascending: bool,
}

impl From<&str> for OrderTerm {
    fn from(column: &str) -> Self {
        OrderTerm {
            column: column.to_string(),
            ascending: true,
        }
    }
}

impl From<String> for OrderTerm {
    fn from(column: String) -> Self {
        OrderTerm {
            column,
            ascending: true,
        }
    }
}

impl<S: Into<String>> From<(S, i64)> for OrderTerm {
    fn from((column, magnitude): (S, i64)) -> Self {
        OrderTerm {
            column: column.into(),
            ascending: magnitude > 0,
        }
    }
}

impl<S: Into<String>> From<(S, Order)> for OrderTerm {
    fn from((column, order): (S, Order)) -> Self {
        OrderTerm {
            column: column.into(),
            ascending: !matches!(order, Order::Desc),
        }
    }
}

/// Row window: skip `offset` rows, return at most `length` (unbounded if `None`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    pub offset: u64,
    pub length: Option<u64>,
}

/// EXISTS / NOT EXISTS sub-select
#[derive(Debug, Clone, PartialEq)]
pub struct Exists {
    pub negated: bool,
    pub statement: Box<Statement>,
}

/// Statement lowered into sea-query
#[derive(Debug, Clone)]
pub enum Lowered {
    Select(SelectStatement),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
}

impl Lowered {
    /// SQL with `$n` placeholders plus the values to bind
    pub fn build(&self) -> (String, Values) {
        match self {
            Lowered::Select(s) => s.build(PostgresQueryBuilder),
            Lowered::Insert(s) => s.build(PostgresQueryBuilder),
            Lowered::Update(s) => s.build(PostgresQueryBuilder),
            Lowered::Delete(s) => s.build(PostgresQueryBuilder),
        }
    }

    /// SQL with values inlined, for display and logging
    pub fn to_inline_sql(&self) -> String {
        match self {
            Lowered::Select(s) => s.to_string(PostgresQueryBuilder),
            Lowered::Insert(s) => s.to_string(PostgresQueryBuilder),
            Lowered::Update(s) => s.to_string(PostgresQueryBuilder),
            Lowered::Delete(s) => s.to_string(PostgresQueryBuilder),
        }
    }
}

/// One SQL operation before rendering.
///
/// Owned by exactly one relation; the operation kind never changes after
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    kind: Operation,
    table: String,
    alias: Option<String>,
    projections: Vec<String>,
    predicates: Vec<Predicate>,
    exists: Vec<Exists>,
    joins: Vec<JoinClause>,
    groups: Vec<String>,
    orders: Vec<OrderTerm>,
    window: Window,
    assignments: Vec<(String, Value)>,
}

impl Statement {
    pub fn new(kind: Operation, table: impl Into<String>) -> Self {
        Self {
            kind,
            table: table.into(),
            alias: None,
            projections: Vec::new(),
            predicates: Vec::new(),
            exists: Vec::new(),
            joins: Vec::new(),
            groups: Vec::new(),
            orders: Vec::new(),
            window: Window::default(),
            assignments: Vec::new(),
        }
    }

    pub fn kind(&self) -> Operation {
        self.kind
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Name other clauses use to refer to the base table
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }

    pub fn projections(&self) -> &[String] {
        &self.projections
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn orders(&self) -> &[OrderTerm] {
        &self.orders
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn assignments(&self) -> &[(String, Value)] {
        &self.assignments
    }

    pub fn subqueries(&self) -> &[Exists] {
        &self.exists
    }

    pub fn set_table(&mut self, table: impl Into<String>) {
        self.table = table.into();
    }

    pub fn set_alias(&mut self, alias: impl Into<String>) {
        self.alias = Some(alias.into());
    }

    pub fn project(&mut self, column: impl Into<String>) {
        self.projections.push(column.into());
    }

    pub fn and_where(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn exists(&mut self, statement: Statement, negated: bool) {
        self.exists.push(Exists {
            negated,
            statement: Box::new(statement),
        });
    }

    pub fn join(&mut self, clause: JoinClause) {
        self.joins.push(clause);
    }

    /// Add an explicit predicate to the most recent join. Returns `false` when
    /// there is no join to attach it to.
    pub fn on(&mut self, condition: JoinCondition) -> bool {
        match self.joins.last_mut() {
            Some(join) => {
                join.explicit.push(condition);
                true
            }
            None => false,
        }
    }

    pub fn order(&mut self, term: OrderTerm) {
        self.orders.push(term);
    }

    pub fn group_by(&mut self, column: impl Into<String>) {
        self.groups.push(column.into());
    }

    pub fn set_window(&mut self, window: Window) {
        self.window = window;
    }

    /// Column assignment for INSERT and UPDATE; a repeated column is replaced
    pub fn assign(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        match self.assignments.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.assignments.push((column, value)),
        }
    }

    fn where_exprs(&self, qualifier: Option<&str>) -> Result<Vec<Expr>> {
        let mut exprs = self
            .predicates
            .iter()
            .map(|p| p.to_expr(qualifier))
            .collect::<Result<Vec<_>>>()?;
        for sub in &self.exists {
            let select = sub.statement.lower_select()?;
            let exists = Expr::exists(select);
            exprs.push(if sub.negated { exists.not() } else { exists });
        }
        Ok(exprs)
    }

    fn lower_select(&self) -> Result<SelectStatement> {
        match self.lower()? {
            Lowered::Select(select) => Ok(select),
            _ => Err(QuarryError::UnsupportedOperation(format!(
                "{} statement used as a sub-select",
                self.kind
            ))),
        }
    }

    /// Lower into the matching sea-query statement
    ///
    /// # Errors
    ///
    /// `MissingParameter` for unbound named placeholders, `Build` when
    /// sea-query rejects the assignments, `UnsupportedOperation` when a
    /// non-SELECT statement is used as an EXISTS sub-select.
    pub fn lower(&self) -> Result<Lowered> {
        match self.kind {
            Operation::Select => {
                let mut select = Query::select();
                match &self.alias {
                    Some(alias) => select.from_as(Ident::new(&self.table), Ident::new(alias)),
                    None => select.from(Ident::new(&self.table)),
                };
                if self.projections.is_empty() {
                    select.column(Asterisk);
                } else {
                    for column in &self.projections {
                        select.expr(named_column(column));
                    }
                }
                for join in &self.joins {
                    select.join(join.kind.into(), Ident::new(&join.table), join.condition());
                }
                for expr in self.where_exprs(Some(self.qualifier()))? {
                    select.and_where(expr);
                }
                if !self.groups.is_empty() {
                    select.add_group_by(self.groups.iter().map(|g| named_column(g)));
                }
                for term in &self.orders {
                    let order = if term.ascending { Order::Asc } else { Order::Desc };
                    select.order_by_expr(named_column(&term.column), order);
                }
                if self.window.offset > 0 {
                    select.offset(self.window.offset);
                }
                if let Some(length) = self.window.length {
                    select.limit(length);
                }
                Ok(Lowered::Select(select))
            }
            Operation::Insert => {
                let mut insert = Query::insert();
                insert
                    .into_table(Ident::new(&self.table))
                    .columns(self.assignments.iter().map(|(c, _)| Ident::new(c)));
                insert.values(self.assignments.iter().map(|(_, v)| Expr::val(v.clone())))?;
                Ok(Lowered::Insert(insert))
            }
            Operation::Update => {
                let mut update = Query::update();
                update.table(Ident::new(&self.table));
                for (column, value) in &self.assignments {
                    update.value(Ident::new(column), Expr::val(value.clone()));
                }
                for expr in self.where_exprs(None)? {
                    update.and_where(expr);
                }
                Ok(Lowered::Update(update))
            }
            Operation::Delete => {
                let mut delete = Query::delete();
                delete.from_table(Ident::new(&self.table));
                for expr in self.where_exprs(None)? {
                    delete.and_where(expr);
                }
                Ok(Lowered::Delete(delete))
            }
        }
    }

    /// SQL with `$n` placeholders and the values to bind
    pub fn build(&self) -> Result<(String, Values)> {
        Ok(self.lower()?.build())
    }

    /// SQL with values inlined
    pub fn to_sql(&self) -> Result<String> {
        Ok(self.lower()?.to_inline_sql())
    }
}
