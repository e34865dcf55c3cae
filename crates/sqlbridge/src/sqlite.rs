//! SQLite backend implementation for sqlbridge
//!
//! Wraps `rusqlite`:
//! - SqliteConnection: path + commit-mode configuration, validated at open
//! - SqliteHandle: owned native connection tagged with the commit mode
//! - SqliteCursor / SqliteKeyedCursor: statement execution with row shaping

use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};

use crate::connection::{CommitMode, Connection};
use crate::cursor::{shape_rows, Cursor, KEYED_ONLY};
use crate::error::{Error, Result};
use crate::types::{Row, RowShape, Value};

/// Convert a sqlbridge Value to a SQLite bind value
impl rusqlite::types::ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            Value::Int64(n) => ToSqlOutput::Owned(SqlValue::Integer(*n)),
            Value::Float64(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Value::Decimal(d) => ToSqlOutput::Owned(SqlValue::Text(d.to_string())),
            Value::String(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            Value::Date(d) => ToSqlOutput::Owned(SqlValue::Text(d.format("%Y-%m-%d").to_string())),
            Value::Time(t) => {
                ToSqlOutput::Owned(SqlValue::Text(t.format("%H:%M:%S%.f").to_string()))
            }
            Value::DateTime(dt) => ToSqlOutput::Owned(SqlValue::Text(
                dt.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            )),
        })
    }
}

/// Convert a SQLite column value to a sqlbridge Value
///
/// Text decodes as UTF-8 with a lossy fallback, so callers always see
/// strings for text columns.
fn sqlite_value_to_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::Int64(n),
        ValueRef::Real(f) => Value::Float64(f),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
    }
}

/// SQLite connection configuration
///
/// `path` accepts a filename or `:memory:`. All fields stay mutable through
/// their accessor pairs until `open` is called.
#[derive(Debug, Clone, Default)]
pub struct SqliteConnection {
    path: Option<String>,
    commit_mode: CommitMode,
}

impl SqliteConnection {
    /// Create an unconfigured connection
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the database path, builder style
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the commit mode, builder style
    pub fn with_commit_mode(mut self, mode: CommitMode) -> Self {
        self.commit_mode = mode;
        self
    }

    /// Database path, if set
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Assign the database path
    pub fn set_path(&mut self, path: Option<String>) {
        self.path = path;
    }

    /// Commit mode applied to explicit transactions on the handle
    pub fn commit_mode(&self) -> CommitMode {
        self.commit_mode
    }

    /// Assign the commit mode
    pub fn set_commit_mode(&mut self, mode: CommitMode) {
        self.commit_mode = mode;
    }
}

impl Connection for SqliteConnection {
    type Handle = SqliteHandle;

    fn open(&self) -> Result<SqliteHandle> {
        let path = self
            .path
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::config("database path not set (use a filename or :memory:)"))?;

        let conn = rusqlite::Connection::open(path)
            .map_err(|e| Error::connection_with_source("failed to open SQLite database", e))?;

        tracing::debug!(path, commit_mode = %self.commit_mode, "opened sqlite database");

        Ok(SqliteHandle {
            conn,
            commit_mode: self.commit_mode,
        })
    }

    fn exception_kind(&self) -> &'static str {
        "rusqlite::Error"
    }

    #[allow(deprecated)]
    fn quote_fn(&self) -> fn(&str) -> String {
        crate::quoting::legacy_quote
    }
}

/// An open SQLite handle, owned by the caller for its entire lifetime
///
/// Carries the commit mode it was opened with so downstream code can inspect
/// the transactional mode without re-deriving it.
#[derive(Debug)]
pub struct SqliteHandle {
    conn: rusqlite::Connection,
    commit_mode: CommitMode,
}

impl SqliteHandle {
    /// The commit mode this handle was opened with
    pub fn commit_mode(&self) -> CommitMode {
        self.commit_mode
    }

    /// The transaction-begin behavior matching the commit mode, for callers
    /// starting explicit transactions
    pub fn transaction_behavior(&self) -> rusqlite::TransactionBehavior {
        match self.commit_mode {
            CommitMode::Default | CommitMode::Deferred => rusqlite::TransactionBehavior::Deferred,
            CommitMode::Immediate => rusqlite::TransactionBehavior::Immediate,
            CommitMode::Exclusive => rusqlite::TransactionBehavior::Exclusive,
        }
    }

    /// Borrow the native connection
    pub fn native(&self) -> &rusqlite::Connection {
        &self.conn
    }

    /// Take back the native connection, e.g. for teardown
    pub fn into_native(self) -> rusqlite::Connection {
        self.conn
    }
}

/// Run one statement against the handle and shape the results.
fn run_query(
    handle: &SqliteHandle,
    sql: &str,
    params: &[Value],
    shape: RowShape,
) -> Result<Vec<Row>> {
    let mut stmt = handle
        .native()
        .prepare(sql)
        .map_err(|e| Error::query_with_sql(format!("failed to prepare statement: {e}"), sql))?;

    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let mut rows = stmt
        .query(rusqlite::params_from_iter(params.iter()))
        .map_err(|e| Error::query_with_sql(format!("failed to execute statement: {e}"), sql))?;

    let mut raw = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|e| Error::query_with_sql(format!("failed to fetch row: {e}"), sql))?
    {
        let mut values = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            let value = row
                .get_ref(idx)
                .map_err(|e| Error::query_with_sql(format!("failed to read column: {e}"), sql))?;
            values.push(sqlite_value_to_value(value));
        }
        raw.push(values);
    }

    Ok(shape_rows(&columns, raw, shape))
}

/// Shape-selectable SQLite cursor, positional rows by default
pub struct SqliteCursor<'h> {
    handle: Option<&'h SqliteHandle>,
    shape: RowShape,
}

impl<'h> SqliteCursor<'h> {
    /// Create a cursor over an open handle
    pub fn new(handle: &'h SqliteHandle) -> Self {
        Self {
            handle: Some(handle),
            shape: RowShape::Positional,
        }
    }

    /// Create a cursor with no handle attached; `execute` fails until
    /// [`set_handle`](Self::set_handle) is called
    pub fn detached() -> Self {
        Self {
            handle: None,
            shape: RowShape::Positional,
        }
    }

    /// Attach or replace the handle
    pub fn set_handle(&mut self, handle: &'h SqliteHandle) {
        self.handle = Some(handle);
    }

    /// Row shape this cursor produces
    pub fn shape(&self) -> RowShape {
        self.shape
    }

    /// Select the row shape for subsequent `execute` calls
    pub fn set_shape(&mut self, shape: RowShape) {
        self.shape = shape;
    }

    /// Select the row shape, builder style
    pub fn with_shape(mut self, shape: RowShape) -> Self {
        self.shape = shape;
        self
    }
}

impl Cursor for SqliteCursor<'_> {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let handle = self
            .handle
            .ok_or_else(|| Error::config("connection handle not set"))?;
        run_query(handle, sql, params, self.shape)
    }
}

/// SQLite cursor fixed to keyed rows
pub struct SqliteKeyedCursor<'h> {
    handle: Option<&'h SqliteHandle>,
    shape: RowShape,
}

impl<'h> SqliteKeyedCursor<'h> {
    /// Create a keyed cursor over an open handle
    pub fn new(handle: &'h SqliteHandle) -> Self {
        Self {
            handle: Some(handle),
            shape: RowShape::Keyed,
        }
    }

    /// Create a keyed cursor with no handle attached
    pub fn detached() -> Self {
        Self {
            handle: None,
            shape: RowShape::Keyed,
        }
    }

    /// Attach or replace the handle
    pub fn set_handle(&mut self, handle: &'h SqliteHandle) {
        self.handle = Some(handle);
    }

    /// Row shape this cursor produces
    pub fn shape(&self) -> RowShape {
        self.shape
    }

    /// Reassign the row shape; anything but [`RowShape::Keyed`] makes the
    /// next `execute` fail with a row-shape error
    pub fn set_shape(&mut self, shape: RowShape) {
        self.shape = shape;
    }
}

impl Cursor for SqliteKeyedCursor<'_> {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let handle = self
            .handle
            .ok_or_else(|| Error::config("connection handle not set"))?;
        if self.shape != RowShape::Keyed {
            return Err(Error::row_shape(self.shape, KEYED_ONLY));
        }
        run_query(handle, sql, params, RowShape::Keyed)
    }
}
