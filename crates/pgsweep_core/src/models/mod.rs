//! Data models for pgsweep.
//!
//! - `connection` - ConnectionConfig, SslMode
//! - `query` - QueryEntry, ConfigLine, ColumnValue, Row, ResultSet, ResultMap

pub mod connection;
pub mod query;

pub use connection::{ConnectionConfig, SslMode};
pub use query::{ColumnValue, ConfigLine, QueryEntry, ResultMap, ResultSet, Row};
