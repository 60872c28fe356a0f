//! Query definitions and result models.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// A single decoded column value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    /// SQL NULL
    Null,
    /// Boolean column
    Bool(bool),
    /// Integer column
    Int(i64),
    /// Floating point column
    Float(f64),
    /// Text, including binary values decoded as text
    Text(String),
}

impl ColumnValue {
    /// Decode a binary value into its text form.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::Text(String::from_utf8_lossy(bytes).into_owned())
    }
}

impl Serialize for ColumnValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int(v) => serializer.serialize_i64(*v),
            // JSON has no NaN or infinity
            Self::Float(v) if v.is_finite() => serializer.serialize_f64(*v),
            Self::Float(v) => serializer.serialize_str(&v.to_string()),
            Self::Text(v) => serializer.serialize_str(v),
        }
    }
}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ColumnValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ColumnValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for ColumnValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// One result row: column name to value, in result column order.
pub type Row = IndexMap<String, ColumnValue>;

/// All rows produced by one query execution.
pub type ResultSet = Vec<Row>;

/// Query name to result set, in the order names first appeared.
pub type ResultMap = IndexMap<String, ResultSet>;

/// A named query that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryEntry {
    /// 1-based line number in the config file
    pub line_number: usize,
    /// Query name (the first token of the line)
    pub name: String,
    /// Query text, unchanged from the config file
    pub sql: String,
}

/// Classification of one config file line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLine {
    /// Empty or whitespace-only line
    Blank,
    /// Line without a name and query separated by a space
    Malformed {
        /// The trimmed line
        text: String,
    },
    /// Line whose query text is not an allowed read query
    Rejected {
        /// Query name
        name: String,
        /// The rejected query text
        sql: String,
    },
    /// Valid query definition
    Query(QueryEntry),
}
