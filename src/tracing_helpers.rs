//! Spans around connection round trips, enabled by the `tracing` feature.

use tracing::{span, Level, Span};

/// Span covering connection establishment
pub fn acquire_connection_span() -> Span {
    span!(Level::DEBUG, "quarry.connect")
}

/// Span covering one statement round trip
pub fn execute_statement_span(operation: &str, sql: &str) -> Span {
    span!(Level::DEBUG, "quarry.execute", operation, sql)
}

/// Span covering the eager-include query of a materialization
pub fn include_span(related: &str, parents: usize) -> Span {
    span!(Level::DEBUG, "quarry.include", related, parents)
}
