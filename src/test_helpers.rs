//! In-memory connection for tests.
//!
//! [`RecordingConnection`] answers statements from a queue of canned
//! outcomes and records the SQL of every round trip.

use crate::connection::{Connection, Outcome};
use crate::error::Result;
use crate::row::Row;
use crate::statement::{Operation, Statement};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// Connection that replays queued outcomes and records executed SQL.
///
/// When the queue is empty a SELECT returns no rows and anything else
/// affects no rows.
#[derive(Debug, Default)]
pub struct RecordingConnection {
    outcomes: Mutex<VecDeque<Outcome>>,
    executed: Mutex<Vec<Statement>>,
}

impl RecordingConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a SELECT result
    pub fn with_rows(self, rows: Vec<Row>) -> Self {
        self.push(Outcome::Rows(rows));
        self
    }

    /// Queue an affected-row count
    pub fn with_affected(self, count: u64) -> Self {
        self.push(Outcome::Affected(count));
        self
    }

    pub fn push(&self, outcome: Outcome) {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(outcome);
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Statements executed so far, in order
    pub fn statements(&self) -> Vec<Statement> {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// SQL of the executed statements, values inlined
    pub fn executed_sql(&self) -> Vec<String> {
        self.statements()
            .iter()
            .filter_map(|statement| statement.to_sql().ok())
            .collect()
    }

    pub fn round_trips(&self) -> usize {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Connection for RecordingConnection {
    fn execute(&self, statement: &Statement) -> Result<Outcome> {
        let sql = statement.to_sql()?;
        log::debug!("recording: {sql}");
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(statement.clone());

        let queued = self
            .outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        Ok(queued.unwrap_or(match statement.kind() {
            Operation::Select => Outcome::Rows(Vec::new()),
            _ => Outcome::Affected(0),
        }))
    }
}
