//! MySQL backend implementation for sqlbridge
//!
//! Wraps the synchronous `mysql` client:
//! - MySqlConnection: host/user/password/database configuration, validated
//!   at open
//! - MySqlHandle: owned native connection tagged with the autocommit flag
//! - MySqlCursor / MySqlKeyedCursor: statement execution with row shaping

use ::mysql::prelude::Queryable;
use ::mysql::{Conn, OptsBuilder, Params};
use chrono::{Datelike, Timelike};
use std::fmt;

use crate::connection::Connection;
use crate::cursor::{shape_rows, Cursor, KEYED_ONLY};
use crate::error::{Error, Result};
use crate::types::{Row, RowShape, Value};

/// Convert a sqlbridge Value to a MySQL compatible parameter
fn value_to_mysql(value: &Value) -> ::mysql::Value {
    match value {
        Value::Null => ::mysql::Value::NULL,
        Value::Bool(b) => ::mysql::Value::from(*b),
        Value::Int64(n) => ::mysql::Value::from(*n),
        Value::Float64(f) => ::mysql::Value::from(*f),
        Value::Decimal(d) => {
            // Convert to string for MySQL DECIMAL
            ::mysql::Value::from(d.to_string())
        }
        Value::String(s) => ::mysql::Value::from(s.clone()),
        Value::Bytes(b) => ::mysql::Value::from(b.clone()),
        Value::Date(d) => {
            ::mysql::Value::Date(d.year() as u16, d.month() as u8, d.day() as u8, 0, 0, 0, 0)
        }
        Value::Time(t) => ::mysql::Value::Time(
            false,
            0,
            t.hour() as u8,
            t.minute() as u8,
            t.second() as u8,
            t.nanosecond() / 1000,
        ),
        Value::DateTime(dt) => {
            let (date, time) = (dt.date(), dt.time());
            ::mysql::Value::Date(
                date.year() as u16,
                date.month() as u8,
                date.day() as u8,
                time.hour() as u8,
                time.minute() as u8,
                time.second() as u8,
                time.nanosecond() / 1000,
            )
        }
    }
}

/// Convert a MySQL value to a sqlbridge Value
///
/// Text columns arrive as bytes; they decode as UTF-8 strings with raw
/// bytes kept only when decoding fails.
fn mysql_to_value(value: ::mysql::Value) -> Value {
    match value {
        ::mysql::Value::NULL => Value::Null,
        ::mysql::Value::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(s) => Value::String(s),
            Err(e) => Value::Bytes(e.into_bytes()),
        },
        ::mysql::Value::Int(n) => Value::Int64(n),
        ::mysql::Value::UInt(n) => Value::Int64(n as i64),
        ::mysql::Value::Float(f) => Value::Float64(f64::from(f)),
        ::mysql::Value::Double(d) => Value::Float64(d),
        ::mysql::Value::Date(year, month, day, hour, min, sec, micro) => {
            match chrono::NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
            {
                Some(date) if hour == 0 && min == 0 && sec == 0 && micro == 0 => Value::Date(date),
                Some(date) => match chrono::NaiveTime::from_hms_micro_opt(
                    u32::from(hour),
                    u32::from(min),
                    u32::from(sec),
                    micro,
                ) {
                    Some(time) => Value::DateTime(chrono::NaiveDateTime::new(date, time)),
                    None => Value::Null,
                },
                None => Value::Null,
            }
        }
        ::mysql::Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let wall_hours = days * 24 + u32::from(hours);
            if !negative && wall_hours < 24 {
                match chrono::NaiveTime::from_hms_micro_opt(
                    wall_hours,
                    u32::from(minutes),
                    u32::from(seconds),
                    micros,
                ) {
                    Some(time) => Value::Time(time),
                    None => Value::Null,
                }
            } else {
                // Durations outside a single day have no time-of-day form.
                let sign = if negative { "-" } else { "" };
                Value::String(format!(
                    "{sign}{wall_hours:02}:{minutes:02}:{seconds:02}.{micros:06}"
                ))
            }
        }
    }
}

/// MySQL connection configuration
///
/// All fields stay mutable through their accessor pairs until `open` is
/// called; validation happens there, not at construction.
#[derive(Clone, Default)]
pub struct MySqlConnection {
    host: Option<String>,
    user: Option<String>,
    password: Option<String>,
    database: Option<String>,
    autocommit: Option<bool>,
}

impl fmt::Debug for MySqlConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Redact the password so configs can be logged safely.
        f.debug_struct("MySqlConnection")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .field("autocommit", &self.autocommit)
            .finish()
    }
}

impl MySqlConnection {
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

    /// Set the database name, builder style
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
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

    /// Database name, if set
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Assign the database name
    pub fn set_database(&mut self, database: Option<String>) {
        self.database = database;
    }

    /// Autocommit flag (enabled unless assigned otherwise)
    pub fn autocommit(&self) -> bool {
        self.autocommit.unwrap_or(true)
    }

    /// Assign the autocommit flag
    pub fn set_autocommit(&mut self, autocommit: bool) {
        self.autocommit = Some(autocommit);
    }
}

impl Connection for MySqlConnection {
    type Handle = MySqlHandle;

    fn open(&self) -> Result<MySqlHandle> {
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
        let database = self
            .database
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::config("database not set"))?;

        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(host))
            .user(Some(user))
            .pass(Some(password))
            .db_name(Some(database));

        let conn = Conn::new(opts)
            .map_err(|e| Error::connection_with_source("failed to connect to MySQL", e))?;

        tracing::debug!(host, database, "opened mysql connection");

        Ok(MySqlHandle {
            conn,
            autocommit: self.autocommit(),
        })
    }

    fn exception_kind(&self) -> &'static str {
        "mysql::Error"
    }

    #[allow(deprecated)]
    fn quote_fn(&self) -> fn(&str) -> String {
        crate::quoting::legacy_quote
    }
}

/// An open MySQL handle, owned by the caller for its entire lifetime
///
/// Carries the autocommit flag it was opened with so downstream code can
/// inspect the transactional mode without re-deriving it.
pub struct MySqlHandle {
    conn: Conn,
    autocommit: bool,
}

impl MySqlHandle {
    /// The autocommit flag this handle was opened with
    pub fn autocommit(&self) -> bool {
        self.autocommit
    }

    /// Borrow the native connection mutably
    pub fn native_mut(&mut self) -> &mut Conn {
        &mut self.conn
    }

    /// Take back the native connection, e.g. for teardown
    pub fn into_native(self) -> Conn {
        self.conn
    }
}

/// Run one statement against the handle and shape the results.
///
/// An empty params slice goes through the text-protocol query path, where
/// placeholder characters inside string literals are inert; a non-empty
/// slice goes through the prepared-statement path with positional binds.
fn run_query(
    handle: &mut MySqlHandle,
    sql: &str,
    params: &[Value],
    shape: RowShape,
) -> Result<Vec<Row>> {
    let conn = handle.native_mut();

    let native_rows: Vec<::mysql::Row> = if params.is_empty() {
        conn.query(sql)
    } else {
        let bound: Vec<::mysql::Value> = params.iter().map(value_to_mysql).collect();
        conn.exec(sql, Params::Positional(bound))
    }
    .map_err(|e| Error::query_with_sql(format!("failed to execute statement: {e}"), sql))?;

    let columns: Vec<String> = native_rows
        .first()
        .map(|row| {
            row.columns_ref()
                .iter()
                .map(|c| c.name_str().into_owned())
                .collect()
        })
        .unwrap_or_default();

    let raw: Vec<Vec<Value>> = native_rows
        .into_iter()
        .map(|row| {
            (0..row.len())
                .map(|i| {
                    let value: ::mysql::Value =
                        row.get(i).unwrap_or(::mysql::Value::NULL);
                    mysql_to_value(value)
                })
                .collect()
        })
        .collect();

    Ok(shape_rows(&columns, raw, shape))
}

/// Shape-selectable MySQL cursor, positional rows by default
pub struct MySqlCursor<'h> {
    handle: Option<&'h mut MySqlHandle>,
    shape: RowShape,
}

impl<'h> MySqlCursor<'h> {
    /// Create a cursor over an open handle
    pub fn new(handle: &'h mut MySqlHandle) -> Self {
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
    pub fn set_handle(&mut self, handle: &'h mut MySqlHandle) {
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

impl Cursor for MySqlCursor<'_> {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let handle = self
            .handle
            .as_deref_mut()
            .ok_or_else(|| Error::config("connection handle not set"))?;
        run_query(handle, sql, params, self.shape)
    }
}

/// MySQL cursor fixed to keyed rows
pub struct MySqlKeyedCursor<'h> {
    handle: Option<&'h mut MySqlHandle>,
    shape: RowShape,
}

impl<'h> MySqlKeyedCursor<'h> {
    /// Create a keyed cursor over an open handle
    pub fn new(handle: &'h mut MySqlHandle) -> Self {
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
    pub fn set_handle(&mut self, handle: &'h mut MySqlHandle) {
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

impl Cursor for MySqlKeyedCursor<'_> {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let handle = self
            .handle
            .as_deref_mut()
            .ok_or_else(|| Error::config("connection handle not set"))?;
        if self.shape != RowShape::Keyed {
            return Err(Error::row_shape(self.shape, KEYED_ONLY));
        }
        run_query(handle, sql, params, RowShape::Keyed)
    }
}
