//! Error types for sqlbridge
//!
//! Four failure kinds, matching what callers can act on:
//! - Configuration: a required field or handle is missing at the point of use
//! - RowShape: a cursor was asked for a row shape outside its allowed set
//! - Connection: the native client library could not establish the link
//! - Query: the native client library rejected or failed a statement

use std::fmt;
use thiserror::Error;

use crate::types::RowShape;

/// Result type for sqlbridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Required credential, path or handle missing at the point of use
    Configuration,
    /// Requested row shape outside the cursor's allowed set
    RowShape,
    /// Native client library could not establish a connection (retriable)
    Connection,
    /// Statement execution failed in the native client library
    Query,
}

impl ErrorCategory {
    /// Whether errors in this category are generally retriable
    #[inline]
    pub const fn is_retriable(self) -> bool {
        matches!(self, Self::Connection)
    }
}

/// Main error type for sqlbridge
#[derive(Error, Debug)]
pub enum Error {
    /// Required field or handle missing when it was needed
    #[error("configuration error: {message}")]
    Configuration {
        /// What was missing, by name
        message: String,
    },

    /// Requested row shape outside the variant's allowed set
    #[error("invalid row shape: {requested} (allowed: {allowed:?})")]
    RowShape {
        /// The shape the cursor was configured with
        requested: RowShape,
        /// The shapes this cursor variant accepts
        allowed: &'static [RowShape],
    },

    /// Native client library could not establish or use a connection
    #[error("connection error: {message}")]
    Connection {
        /// Failure description, carrying the driver's own message
        message: String,
        /// The underlying driver error, when available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Statement execution failed
    #[error("query error: {message}")]
    Query {
        /// Failure description, carrying the driver's own message
        message: String,
        /// The statement that failed, when known
        sql: Option<String>,
    },
}

impl Error {
    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::RowShape { .. } => ErrorCategory::RowShape,
            Self::Connection { .. } => ErrorCategory::Connection,
            Self::Query { .. } => ErrorCategory::Query,
        }
    }

    /// Whether this error is retriable
    #[inline]
    pub fn is_retriable(&self) -> bool {
        self.category().is_retriable()
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a row-shape error
    pub fn row_shape(requested: RowShape, allowed: &'static [RowShape]) -> Self {
        Self::RowShape { requested, allowed }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection error wrapping the driver error
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection {
            message: format!("{}: {}", message.into(), source),
            source: Some(Box::new(source)),
        }
    }

    /// Create a query error
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            sql: None,
        }
    }

    /// Create a query error with the offending SQL
    pub fn query_with_sql(message: impl Into<String>, sql: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            sql: Some(sql.into()),
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::RowShape => write!(f, "row_shape"),
            Self::Connection => write!(f, "connection"),
            Self::Query => write!(f, "query"),
        }
    }
}
