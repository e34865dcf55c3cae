//! Oracle backend implementation for sqlbridge
//!
//! Wraps the `oracle` client:
//! - OracleConnection: host/user/password/sid configuration, validated at
//!   open, with the canonical `user/password@host/sid` logon composition
//! - OracleHandle: owned native connection with the driver-level autocommit
//!   property assigned
//! - OracleCursor / OracleKeyedCursor: statement execution; keyed rows are
//!   produced by the row materializer since the driver has no keyed-row
//!   facility of its own

use ::oracle::sql_type::{OracleType, ToSql};
use ::oracle::SqlValue;
use std::fmt;

use crate::connection::Connection;
use crate::cursor::{shape_rows, Cursor, KEYED_ONLY};
use crate::error::{Error, Result};
use crate::types::{Row, RowShape, Value};

/// Convert a sqlbridge Value to an Oracle bind parameter
fn value_to_oracle(value: &Value) -> Box<dyn ToSql> {
    match value {
        Value::Null => Box::new(None::<String>),
        // Oracle has no SQL boolean; bind as 0/1 the way its clients do.
        Value::Bool(b) => Box::new(i64::from(*b)),
        Value::Int64(n) => Box::new(*n),
        Value::Float64(f) => Box::new(*f),
        Value::Decimal(d) => Box::new(d.to_string()),
        Value::String(s) => Box::new(s.clone()),
        Value::Bytes(b) => Box::new(b.clone()),
        Value::Date(d) => Box::new(*d),
        // No time-only Oracle type; bind as text.
        Value::Time(t) => Box::new(t.format("%H:%M:%S").to_string()),
        Value::DateTime(dt) => Box::new(*dt),
    }
}

/// Convert an Oracle column value to a sqlbridge Value, driven by the
/// column's declared type
fn oracle_to_value(value: &SqlValue) -> Result<Value> {
    let conv = |e: ::oracle::Error| Error::query(format!("failed to convert column value: {e}"));

    if value.is_null().map_err(conv)? {
        return Ok(Value::Null);
    }

    let converted = match value.oracle_type().map_err(conv)? {
        OracleType::Number(_, scale) if *scale == 0 => match value.get::<i64>() {
            Ok(n) => Value::Int64(n),
            // NUMBER(38) can exceed i64; fall back to the textual form.
            Err(_) => decimal_or_string(value.get::<String>().map_err(conv)?),
        },
        OracleType::Number(..) => decimal_or_string(value.get::<String>().map_err(conv)?),
        OracleType::Float(_) | OracleType::BinaryFloat | OracleType::BinaryDouble => {
            Value::Float64(value.get::<f64>().map_err(conv)?)
        }
        OracleType::Int64 => Value::Int64(value.get::<i64>().map_err(conv)?),
        OracleType::UInt64 => Value::Int64(value.get::<u64>().map_err(conv)? as i64),
        OracleType::Boolean => Value::Bool(value.get::<bool>().map_err(conv)?),
        OracleType::Date
        | OracleType::Timestamp(_)
        | OracleType::TimestampTZ(_)
        | OracleType::TimestampLTZ(_) => {
            Value::DateTime(value.get::<chrono::NaiveDateTime>().map_err(conv)?)
        }
        OracleType::Raw(_) | OracleType::BLOB | OracleType::LongRaw => {
            Value::Bytes(value.get::<Vec<u8>>().map_err(conv)?)
        }
        _ => Value::String(value.get::<String>().map_err(conv)?),
    };

    Ok(converted)
}

/// Parse a NUMBER's textual form into a decimal, keeping the text when it
/// does not parse
fn decimal_or_string(text: String) -> Value {
    match text.parse::<rust_decimal::Decimal>() {
        Ok(d) => Value::Decimal(d),
        Err(_) => Value::String(text),
    }
}

/// Oracle connection configuration
///
/// All fields stay mutable through their accessor pairs until `open` is
/// called; validation happens there, not at construction.
#[derive(Clone, Default)]
pub struct OracleConnection {
    host: Option<String>,
    user: Option<String>,
    password: Option<String>,
    sid: Option<String>,
    autocommit: Option<bool>,
}

impl fmt::Debug for OracleConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Redact the password so configs can be logged safely.
        f.debug_struct("OracleConnection")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("sid", &self.sid)
            .field("autocommit", &self.autocommit)
            .finish()
    }
}

impl OracleConnection {
    /// Create an unconfigured connection
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server hostname, builder style
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the username, builder style
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Set the password, builder style
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the system identifier / service name, builder style
    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    /// Set the autocommit flag, builder style
    pub fn with_autocommit(mut self, autocommit: bool) -> Self {
        self.autocommit = Some(autocommit);
        self
    }

    /// Server hostname, if set
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Assign the server hostname
    pub fn set_host(&mut self, host: Option<String>) {
        self.host = host;
    }

    /// Username, if set
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Assign the username
    pub fn set_user(&mut self, user: Option<String>) {
        self.user = user;
    }

    /// Password, if set
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Assign the password
    pub fn set_password(&mut self, password: Option<String>) {
        self.password = password;
    }

    /// System identifier / service name, if set
    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }

    /// Assign the system identifier / service name
    pub fn set_sid(&mut self, sid: Option<String>) {
        self.sid = sid;
    }

    /// Autocommit flag (enabled unless assigned otherwise)
    pub fn autocommit(&self) -> bool {
        self.autocommit.unwrap_or(true)
    }

    /// Assign the autocommit flag
    pub fn set_autocommit(&mut self, autocommit: bool) {
        self.autocommit = Some(autocommit);
    }

    /// The canonical logon string, composed as
    /// `{user}/{password}@{host}/{sid}` — the format the Oracle client
    /// tooling expects.
    ///
    /// Fails with a configuration error when any component is unset.
    pub fn dsn(&self) -> Result<String> {
        let (host, user, password, sid) = self.credentials()?;
        Ok(format!("{user}/{password}@{host}/{sid}"))
    }

    fn credentials(&self) -> Result<(&str, &str, &str, &str)> {
        let host = self
            .host
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::config("host not set"))?;
        let user = self
            .user
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::config("user not set"))?;
        let password = self
            .password
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::config("password not set"))?;
        let sid = self
            .sid
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::config("sid not set"))?;
        Ok((host, user, password, sid))
    }
}

impl Connection for OracleConnection {
    type Handle = OracleHandle;

    fn open(&self) -> Result<OracleHandle> {
        let (host, user, password, sid) = self.credentials()?;

        let connect_string = format!("//{host}/{sid}");
        let mut conn = ::oracle::Connection::connect(user, password, &connect_string)
            .map_err(|e| Error::connection_with_source("failed to connect to Oracle", e))?;
        conn.set_autocommit(self.autocommit());

        tracing::debug!(host, sid, "opened oracle connection");

        Ok(OracleHandle { conn })
    }

    fn exception_kind(&self) -> &'static str {
        "oracle::Error"
    }

    #[allow(deprecated)]
    fn quote_fn(&self) -> fn(&str) -> String {
        crate::quoting::legacy_quote
    }
}

/// An open Oracle handle, owned by the caller for its entire lifetime
///
/// The autocommit flag lives on the native connection itself; this wrapper
/// exposes it by delegation.
pub struct OracleHandle {
    conn: ::oracle::Connection,
}

impl OracleHandle {
    /// The autocommit state of the native connection
    pub fn autocommit(&self) -> bool {
        self.conn.autocommit()
    }

    /// Borrow the native connection
    pub fn native(&self) -> &::oracle::Connection {
        &self.conn
    }

    /// Take back the native connection, e.g. for teardown
    pub fn into_native(self) -> ::oracle::Connection {
        self.conn
    }
}

/// Run one statement against the handle and shape the results.
///
/// Statements that produce no rows (DDL, DML) execute and return an empty
/// sequence.
fn run_query(
    handle: &OracleHandle,
    sql: &str,
    params: &[Value],
    shape: RowShape,
) -> Result<Vec<Row>> {
    let boxed: Vec<Box<dyn ToSql>> = params.iter().map(value_to_oracle).collect();
    let refs: Vec<&dyn ToSql> = boxed.iter().map(|b| b.as_ref()).collect();

    let mut stmt = handle
        .native()
        .statement(sql)
        .build()
        .map_err(|e| Error::query_with_sql(format!("failed to prepare statement: {e}"), sql))?;

    if !stmt.is_query() {
        stmt.execute(&refs)
            .map_err(|e| Error::query_with_sql(format!("failed to execute statement: {e}"), sql))?;
        return Ok(Vec::new());
    }

    let result_set = stmt
        .query(&refs)
        .map_err(|e| Error::query_with_sql(format!("failed to execute statement: {e}"), sql))?;

    // Oracle reports column names upper-cased; preserved as-is.
    let columns: Vec<String> = result_set
        .column_info()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let mut raw = Vec::new();
    for row_result in result_set {
        let row = row_result
            .map_err(|e| Error::query_with_sql(format!("failed to fetch row: {e}"), sql))?;
        let values = row
            .sql_values()
            .iter()
            .map(oracle_to_value)
            .collect::<Result<Vec<_>>>()?;
        raw.push(values);
    }

    Ok(shape_rows(&columns, raw, shape))
}

/// Shape-selectable Oracle cursor, positional rows by default
///
/// When toggled to keyed rows the materializer runs over the raw rows, the
/// same post-processing the keyed-only variant applies.
pub struct OracleCursor<'h> {
    handle: Option<&'h OracleHandle>,
    shape: RowShape,
}

impl<'h> OracleCursor<'h> {
    /// Create a cursor over an open handle
    pub fn new(handle: &'h OracleHandle) -> Self {
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
    pub fn set_handle(&mut self, handle: &'h OracleHandle) {
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

impl Cursor for OracleCursor<'_> {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let handle = self
            .handle
            .ok_or_else(|| Error::config("connection handle not set"))?;
        run_query(handle, sql, params, self.shape)
    }
}

/// Oracle cursor fixed to keyed rows
pub struct OracleKeyedCursor<'h> {
    handle: Option<&'h OracleHandle>,
    shape: RowShape,
}

impl<'h> OracleKeyedCursor<'h> {
    /// Create a keyed cursor over an open handle
    pub fn new(handle: &'h OracleHandle) -> Self {
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
    pub fn set_handle(&mut self, handle: &'h OracleHandle) {
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

impl Cursor for OracleKeyedCursor<'_> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn test_dsn_composition_is_exact() {
        let conn = OracleConnection::new()
            .with_host("db.example.com")
            .with_user("scott")
            .with_password("tiger")
            .with_sid("XE");
        assert_eq!(conn.dsn().unwrap(), "scott/tiger@db.example.com/XE");
    }

    #[test]
    fn test_open_validates_each_field() {
        let err = OracleConnection::new().open().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.to_string().contains("host"));

        let err = OracleConnection::new()
            .with_host("127.0.0.1")
            .open()
            .unwrap_err();
        assert!(err.to_string().contains("user"));

        let err = OracleConnection::new()
            .with_host("127.0.0.1")
            .with_user("test")
            .open()
            .unwrap_err();
        assert!(err.to_string().contains("password"));

        let err = OracleConnection::new()
            .with_host("127.0.0.1")
            .with_user("test")
            .with_password("test")
            .open()
            .unwrap_err();
        assert!(err.to_string().contains("sid"));
    }

    #[test]
    fn test_accessor_round_trip() {
        let mut conn = OracleConnection::new();
        assert_eq!(conn.sid(), None);
        assert!(conn.autocommit());

        conn.set_host(Some("127.0.0.1".into()));
        conn.set_user(Some("test".into()));
        conn.set_password(Some("secret".into()));
        conn.set_sid(Some("XE".into()));
        conn.set_autocommit(false);

        assert_eq!(conn.host(), Some("127.0.0.1"));
        assert_eq!(conn.user(), Some("test"));
        assert_eq!(conn.password(), Some("secret"));
        assert_eq!(conn.sid(), Some("XE"));
        assert!(!conn.autocommit());

        conn.set_sid(None);
        assert_eq!(conn.sid(), None);
    }

    #[test]
    fn test_debug_redacts_password() {
        let conn = OracleConnection::new().with_password("secret");
        let debug = format!("{conn:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_exception_kind() {
        assert_eq!(OracleConnection::new().exception_kind(), "oracle::Error");
    }

    #[test]
    fn test_cursor_without_handle_fails() {
        let mut cursor = OracleCursor::detached();
        let err = cursor.execute("SELECT 1 FROM dual", &[]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);

        let mut cursor = OracleKeyedCursor::detached();
        let err = cursor.execute("SELECT 1 FROM dual", &[]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_decimal_or_string() {
        assert_eq!(
            decimal_or_string("123.45".to_string()),
            Value::Decimal("123.45".parse().unwrap())
        );
        assert_eq!(
            decimal_or_string("not-a-number".to_string()),
            Value::String("not-a-number".into())
        );
    }
}
