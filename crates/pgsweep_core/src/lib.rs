//! Core types and services for pgsweep.
//!
//! pgsweep runs a fixed battery of named read-only queries against one
//! PostgreSQL database and logs the collected results as structured JSON.
//!
//! - **error**: Error handling with PostgreSQL-specific details
//! - **models**: Connection parameters, query definitions, result rows
//! - **services**: Config loading, query guard, connection, runner, report
//! - **logging**: Structured JSON logging setup

pub mod error;
pub mod logging;
pub mod models;
pub mod services;


pub use error::SweepError;
pub use models::{
    ColumnValue, ConfigLine, ConnectionConfig, QueryEntry, ResultMap, ResultSet, Row, SslMode,
};
pub use services::{Database, QueryExecutor, QueryFile, QueryRunner, RowStream};
