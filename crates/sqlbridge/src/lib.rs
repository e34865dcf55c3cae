//! # sqlbridge
//!
//! A uniform, synchronous facade over three relational database client
//! libraries: SQLite (embedded, file-based), MySQL and Oracle
//! (client/server).
//!
//! Two abstractions cover the whole surface: a [`Connection`] opens a
//! backend handle from engine-specific credentials, and a [`Cursor`]
//! executes a parameterized statement against an open handle, returning
//! fully materialized rows in either positional or keyed shape. Everything
//! else — wire protocols, SQL parsing, pooling, transactions — stays with
//! the native client crates.
//!
//! [`Connection`]: connection::Connection
//! [`Cursor`]: cursor::Cursor
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sqlbridge::prelude::*;
//!
//! // Open an embedded database
//! let handle = SqliteConnection::new().with_path(":memory:").open()?;
//!
//! // Execute with bound parameters, keyed rows
//! let mut cursor = SqliteCursor::new(&handle).with_shape(RowShape::Keyed);
//! let rows = cursor.execute(
//!     "SELECT * FROM test WHERE name = ?",
//!     &[Value::from("Glenn")],
//! )?;
//! println!("{:?}", rows[0].get_named("name"));
//!
//! // Or resolve a backend by name
//! let conn = connection_for("mysql")?;
//! ```
//!
//! ## Feature Flags
//!
//! - `sqlite` - SQLite support via rusqlite (default)
//! - `mysql` - MySQL/MariaDB support via mysql
//! - `oracle` - Oracle support via oracle
//! - `full` - All backends enabled
//!
//! ## Sharing handles
//!
//! Row shape is per-cursor state applied per call; no cursor mutates
//! handle-level state, so cursors of different shapes may target the same
//! handle, subject to each driver's own borrowing rules.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod connection;
pub mod cursor;
pub mod error;
pub mod quoting;
pub mod types;

// Backend implementations (conditionally compiled)
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(feature = "oracle")]
pub mod oracle;

#[cfg(not(any(feature = "sqlite", feature = "mysql", feature = "oracle")))]
compile_error!("at least one backend feature (`sqlite`, `mysql`, `oracle`) must be enabled");

/// Prelude module for convenient imports
pub mod prelude {
    // Error types
    pub use crate::error::{Error, ErrorCategory, Result};

    // Value and row types
    pub use crate::types::{Row, RowShape, Value};

    // Connection trait, factory and config vocabulary
    pub use crate::connection::{
        connection_for, AnyConnection, BackendKind, CommitMode, Connection,
    };

    // Cursor trait and row materializer
    pub use crate::cursor::{materialize_keyed, Cursor};

    // Backends
    #[cfg(feature = "sqlite")]
    pub use crate::sqlite::{SqliteConnection, SqliteCursor, SqliteHandle, SqliteKeyedCursor};

    #[cfg(feature = "mysql")]
    pub use crate::mysql::{MySqlConnection, MySqlCursor, MySqlHandle, MySqlKeyedCursor};

    #[cfg(feature = "oracle")]
    pub use crate::oracle::{OracleConnection, OracleCursor, OracleHandle, OracleKeyedCursor};
}

// Re-export commonly used items at crate root
pub use error::{Error, Result};
pub use types::{Row, Value};
