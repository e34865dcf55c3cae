//! Connection trait and factory for sqlbridge
//!
//! Core abstractions for opening backend handles:
//! - Connection: open-time validation and handle production per backend
//! - CommitMode: SQLite transaction-begin behavior
//! - BackendKind: backend identifier
//! - connection_for: name-based factory dispatch

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A configurable connection to one database backend
///
/// Implementations validate their required fields when [`open`](Self::open)
/// is called, not at construction, so callers may assemble credentials
/// incrementally through the accessor pairs. A successful `open` hands the
/// caller an owned handle; the connection value retains nothing and performs
/// no cleanup of handles it produced.
pub trait Connection {
    /// Handle type produced by a successful [`open`](Self::open)
    type Handle;

    /// Validate required fields and connect through the native client.
    ///
    /// Missing fields fail with a configuration error naming the field;
    /// native failures fail with a connection error preserving the driver's
    /// message.
    fn open(&self) -> Result<Self::Handle>;

    /// Identifier of the native driver's top-level error type, which this
    /// backend's failures wrap.
    fn exception_kind(&self) -> &'static str;

    /// The legacy quote-escaping helper for this backend.
    ///
    /// Retained for compatibility with callers that interpolate statement
    /// text; new code binds parameters through the cursor instead.
    fn quote_fn(&self) -> fn(&str) -> String;
}

/// SQLite transaction-begin behavior, applied when a caller starts an
/// explicit transaction on the handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommitMode {
    /// Driver default behavior
    #[default]
    Default,
    /// BEGIN DEFERRED
    Deferred,
    /// BEGIN IMMEDIATE
    Immediate,
    /// BEGIN EXCLUSIVE
    Exclusive,
}

impl CommitMode {
    /// Lower-case name of this mode
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Deferred => "deferred",
            Self::Immediate => "immediate",
            Self::Exclusive => "exclusive",
        }
    }
}

impl fmt::Display for CommitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CommitMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "deferred" => Ok(Self::Deferred),
            "immediate" => Ok(Self::Immediate),
            "exclusive" => Ok(Self::Exclusive),
            other => Err(Error::config(format!(
                "commit mode '{other}' is not one of default, deferred, immediate, exclusive"
            ))),
        }
    }
}

/// Database backend identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// SQLite (file-based embedded engine)
    Sqlite,
    /// MySQL/MariaDB
    MySql,
    /// Oracle
    Oracle,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => write!(f, "SQLite"),
            Self::MySql => write!(f, "MySQL"),
            Self::Oracle => write!(f, "Oracle"),
        }
    }
}

/// A connection variant produced by [`connection_for`], dispatched by tag
#[derive(Debug)]
pub enum AnyConnection {
    /// SQLite connection
    #[cfg(feature = "sqlite")]
    Sqlite(crate::sqlite::SqliteConnection),
    /// MySQL connection
    #[cfg(feature = "mysql")]
    MySql(crate::mysql::MySqlConnection),
    /// Oracle connection
    #[cfg(feature = "oracle")]
    Oracle(crate::oracle::OracleConnection),
}

impl AnyConnection {
    /// Which backend this variant connects to
    pub fn kind(&self) -> BackendKind {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => BackendKind::Sqlite,
            #[cfg(feature = "mysql")]
            Self::MySql(_) => BackendKind::MySql,
            #[cfg(feature = "oracle")]
            Self::Oracle(_) => BackendKind::Oracle,
        }
    }

    /// Unwrap into the SQLite variant
    #[cfg(feature = "sqlite")]
    #[allow(unreachable_patterns)]
    pub fn into_sqlite(self) -> Option<crate::sqlite::SqliteConnection> {
        match self {
            Self::Sqlite(conn) => Some(conn),
            _ => None,
        }
    }

    /// Unwrap into the MySQL variant
    #[cfg(feature = "mysql")]
    #[allow(unreachable_patterns)]
    pub fn into_mysql(self) -> Option<crate::mysql::MySqlConnection> {
        match self {
            Self::MySql(conn) => Some(conn),
            _ => None,
        }
    }

    /// Unwrap into the Oracle variant
    #[cfg(feature = "oracle")]
    #[allow(unreachable_patterns)]
    pub fn into_oracle(self) -> Option<crate::oracle::OracleConnection> {
        match self {
            Self::Oracle(conn) => Some(conn),
            _ => None,
        }
    }
}

/// Construct a connection variant by backend name.
///
/// Matching is case-insensitive substring containment against `mysql`,
/// `oracle`, `sqlite`, checked in that fixed order; the first match wins.
/// An empty name, a name matching no backend, and a name matching a backend
/// whose feature is not compiled in all fail with a configuration error.
///
/// The returned variant carries empty credentials; populate it through its
/// accessors before calling `open`.
pub fn connection_for(name: &str) -> Result<AnyConnection> {
    if name.is_empty() {
        return Err(Error::config("connection name required"));
    }

    let lowered = name.to_lowercase();

    if lowered.contains("mysql") {
        #[cfg(feature = "mysql")]
        {
            tracing::debug!(name, backend = %BackendKind::MySql, "resolved connection backend");
            return Ok(AnyConnection::MySql(crate::mysql::MySqlConnection::new()));
        }
        #[cfg(not(feature = "mysql"))]
        return Err(Error::config(
            "mysql backend requested but the `mysql` feature is not enabled",
        ));
    }

    if lowered.contains("oracle") {
        #[cfg(feature = "oracle")]
        {
            tracing::debug!(name, backend = %BackendKind::Oracle, "resolved connection backend");
            return Ok(AnyConnection::Oracle(crate::oracle::OracleConnection::new()));
        }
        #[cfg(not(feature = "oracle"))]
        return Err(Error::config(
            "oracle backend requested but the `oracle` feature is not enabled",
        ));
    }

    if lowered.contains("sqlite") {
        #[cfg(feature = "sqlite")]
        {
            tracing::debug!(name, backend = %BackendKind::Sqlite, "resolved connection backend");
            return Ok(AnyConnection::Sqlite(crate::sqlite::SqliteConnection::new()));
        }
        #[cfg(not(feature = "sqlite"))]
        return Err(Error::config(
            "sqlite backend requested but the `sqlite` feature is not enabled",
        ));
    }

    Err(Error::config(format!(
        "no connection available for '{name}'"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn test_commit_mode_parse() {
        assert_eq!("default".parse::<CommitMode>().unwrap(), CommitMode::Default);
        assert_eq!("DEFERRED".parse::<CommitMode>().unwrap(), CommitMode::Deferred);
        assert_eq!("Immediate".parse::<CommitMode>().unwrap(), CommitMode::Immediate);
        assert_eq!("exclusive".parse::<CommitMode>().unwrap(), CommitMode::Exclusive);
    }

    #[test]
    fn test_commit_mode_rejects_unknown() {
        let err = "chaos".parse::<CommitMode>().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.to_string().contains("chaos"));
    }

    #[test]
    fn test_commit_mode_display() {
        assert_eq!(CommitMode::Default.to_string(), "default");
        assert_eq!(CommitMode::Immediate.to_string(), "immediate");
    }

    #[test]
    fn test_backend_kind_display() {
        assert_eq!(BackendKind::Sqlite.to_string(), "SQLite");
        assert_eq!(BackendKind::MySql.to_string(), "MySQL");
        assert_eq!(BackendKind::Oracle.to_string(), "Oracle");
    }

    #[test]
    fn test_factory_rejects_empty_name() {
        let err = connection_for("").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_factory_rejects_unknown_name() {
        let err = connection_for("postgres").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.to_string().contains("postgres"));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_factory_matches_sqlite_substring_any_case() {
        for name in ["sqlite", "SQLite", "SQLITE", "my-sqlite-db"] {
            let conn = connection_for(name).unwrap();
            assert_eq!(conn.kind(), BackendKind::Sqlite);
            assert!(conn.into_sqlite().is_some());
        }
    }

    #[cfg(feature = "mysql")]
    #[test]
    fn test_factory_matches_mysql_substring_any_case() {
        for name in ["mysql", "MySQL", "prod-MYSQL-eu"] {
            let conn = connection_for(name).unwrap();
            assert_eq!(conn.kind(), BackendKind::MySql);
        }
    }

    #[cfg(feature = "oracle")]
    #[test]
    fn test_factory_matches_oracle_substring_any_case() {
        for name in ["oracle", "Oracle", "ORACLE-xe"] {
            let conn = connection_for(name).unwrap();
            assert_eq!(conn.kind(), BackendKind::Oracle);
        }
    }

    #[cfg(all(feature = "mysql", feature = "oracle"))]
    #[test]
    fn test_factory_match_order_is_fixed() {
        // A name containing both substrings resolves to mysql, first in the
        // match order.
        let conn = connection_for("mysql-oracle-mirror").unwrap();
        assert_eq!(conn.kind(), BackendKind::MySql);
    }
}
