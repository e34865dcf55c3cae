//! Value and row types for sqlbridge
//!
//! A single [`Value`] enum covers what the three backends exchange; a [`Row`]
//! is either an ordered value sequence or a column-name keyed mapping,
//! selected per cursor via [`RowShape`].

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// SQL value that can hold any column value the supported backends produce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer (INTEGER, BIGINT)
    Int64(i64),
    /// 64-bit floating point (REAL, DOUBLE PRECISION)
    Float64(f64),
    /// Arbitrary precision decimal (NUMERIC, DECIMAL)
    Decimal(Decimal),
    /// Text string (VARCHAR, TEXT, CHAR)
    String(String),
    /// Binary data (BLOB, RAW, VARBINARY)
    Bytes(Vec<u8>),
    /// Date without time (DATE)
    Date(NaiveDate),
    /// Time without date (TIME)
    Time(NaiveTime),
    /// Timestamp without timezone (TIMESTAMP, DATETIME)
    DateTime(NaiveDateTime),
}

impl Value {
    /// Check if value is NULL
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to convert to bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int64(n) => Some(*n != 0),
            _ => None,
        }
    }

    /// Try to convert to i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Int64(n) => Some(*n),
            Self::Float64(n) => {
                if n.is_finite() {
                    Some(*n as i64)
                } else {
                    None
                }
            }
            Self::Decimal(d) => d.to_string().parse().ok(),
            Self::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Try to convert to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int64(n) => Some(*n as f64),
            Self::Float64(n) => Some(*n),
            Self::Decimal(d) => d.to_string().parse().ok(),
            Self::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Try to view as a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Try to view as raw bytes
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b.as_slice()),
            Self::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Convert to an owned string representation
    pub fn as_string(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Int64(n) => Some(n.to_string()),
            Self::Float64(n) => Some(n.to_string()),
            Self::Decimal(d) => Some(d.to_string()),
            Self::Date(d) => Some(d.to_string()),
            Self::Time(t) => Some(t.to_string()),
            Self::DateTime(dt) => Some(dt.to_string()),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int64(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Self::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Self::Null,
        }
    }
}

/// Whether a query result row is an ordered value sequence or a
/// column-name keyed mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RowShape {
    /// Ordered sequence of column values
    #[default]
    Positional,
    /// Mapping from column name to value
    Keyed,
}

impl fmt::Display for RowShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positional => write!(f, "positional"),
            Self::Keyed => write!(f, "keyed"),
        }
    }
}

/// A single query result row, in the shape the cursor was configured for
///
/// Column-name casing follows the native driver's own convention (Oracle
/// reports upper-case names, the other backends report names as declared).
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    /// Ordered column values
    Positional(Vec<Value>),
    /// Column-name keyed values
    Keyed(HashMap<String, Value>),
}

impl Row {
    /// The shape this row was materialized in
    pub fn shape(&self) -> RowShape {
        match self {
            Self::Positional(_) => RowShape::Positional,
            Self::Keyed(_) => RowShape::Keyed,
        }
    }

    /// Number of columns in the row
    pub fn len(&self) -> usize {
        match self {
            Self::Positional(values) => values.len(),
            Self::Keyed(map) => map.len(),
        }
    }

    /// Check if the row has no columns
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a value by column index; `None` on keyed rows
    pub fn get(&self, idx: usize) -> Option<&Value> {
        match self {
            Self::Positional(values) => values.get(idx),
            Self::Keyed(_) => None,
        }
    }

    /// Get a value by column name; `None` on positional rows
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Positional(_) => None,
            Self::Keyed(map) => map.get(name),
        }
    }
}
