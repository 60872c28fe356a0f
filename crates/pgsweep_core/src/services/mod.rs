//! Services for pgsweep.
//!
//! - `config` - Query config file loading and whole-file validation
//! - `sanitize` - Read-only query guard
//! - `database` - The single PostgreSQL connection (tokio-postgres)
//! - `decode` - Row decoding into column values
//! - `runner` - Sequential query execution into a result map
//! - `report` - Final structured output record

pub mod config;
pub mod database;
pub mod decode;
pub mod report;
pub mod runner;
pub mod sanitize;

pub use config::QueryFile;
pub use database::Database;
pub use runner::{QueryExecutor, QueryRunner, RowStream};
pub use sanitize::sanitize_query;
