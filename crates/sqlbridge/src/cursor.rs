//! Cursor trait and row materialization
//!
//! A cursor executes one parameterized statement against an already-open
//! handle and returns every matching row, fully materialized, in the shape
//! the cursor is configured for. There is no streaming: each `execute` call
//! fetches the complete result before returning.
//!
//! Placeholder syntax is the backend's own (`?` for SQLite and MySQL,
//! `:1`-style positional binds for Oracle) and is not translated between
//! backends; callers write backend-specific statements.

use std::collections::HashMap;

use crate::error::Result;
use crate::types::{Row, RowShape, Value};

/// The allowed-shape set of keyed-only cursor variants
pub(crate) const KEYED_ONLY: &[RowShape] = &[RowShape::Keyed];

/// A cursor over an open connection handle
pub trait Cursor {
    /// Execute a statement, binding `params` positionally, and return all
    /// resulting rows.
    ///
    /// An empty `params` slice executes the statement with no bindings at
    /// all; in at least the MySQL backend that takes a different native path
    /// than binding an empty parameter set, and placeholder characters
    /// inside string literals stay inert.
    ///
    /// Fails with a configuration error when no handle is attached, and with
    /// a row-shape error when the cursor's configured shape is outside its
    /// allowed set.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;
}

/// Zip column names with each row's values into key/value mappings.
///
/// Keys are the column names in declared order, values the corresponding row
/// values in the same order. Given no rows, returns no mappings. Used by
/// backends whose native driver has no keyed-row facility of its own.
pub fn materialize_keyed(
    columns: &[String],
    rows: Vec<Vec<Value>>,
) -> Vec<HashMap<String, Value>> {
    rows.into_iter()
        .map(|values| columns.iter().cloned().zip(values).collect())
        .collect()
}

/// Shape raw positional rows into the requested [`RowShape`].
pub(crate) fn shape_rows(columns: &[String], rows: Vec<Vec<Value>>, shape: RowShape) -> Vec<Row> {
    match shape {
        RowShape::Positional => rows.into_iter().map(Row::Positional).collect(),
        RowShape::Keyed => materialize_keyed(columns, rows)
            .into_iter()
            .map(Row::Keyed)
            .collect(),
    }
}
