//! Sequential execution of the configured queries.
//!
//! Failure policy:
//! - an execution error skips that query with a warning
//! - an error while reading the rows of an executed query aborts the run

use crate::error::SweepError;
use crate::models::{ConfigLine, QueryEntry, ResultMap, ResultSet, Row};
use crate::services::config::QueryFile;

use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use std::future::Future;
use std::time::Instant;

/// Rows of an executed query, read one at a time.
pub struct RowStream {
    /// Column names in result order
    pub columns: Vec<String>,
    /// Decoded rows; an `Err` item ends the run
    pub rows: BoxStream<'static, Result<Row, SweepError>>,
}

impl std::fmt::Debug for RowStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowStream").field("columns", &self.columns).finish_non_exhaustive()
    }
}

/// Something that can execute a query text and stream back its rows.
pub trait QueryExecutor {
    /// Execute `sql`. An `Err` here means the query itself failed.
    fn execute(&self, sql: &str) -> impl Future<Output = Result<RowStream, SweepError>>;
}

/// Runs every query of a config file against one executor.
pub struct QueryRunner<'a, E> {
    executor: &'a E,
}

impl<'a, E: QueryExecutor> QueryRunner<'a, E> {
    /// Create a runner over the given executor.
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    /// Execute each valid line in file order and collect the results.
    ///
    /// Lines are re-checked here even after the whole-file pre-pass;
    /// malformed or rejected lines are skipped with a warning.
    pub async fn run(&self, file: &QueryFile) -> Result<ResultMap, SweepError> {
        let mut results = ResultMap::new();

        for (line_number, line) in file.lines() {
            let entry = match line {
                ConfigLine::Blank => continue,
                ConfigLine::Malformed { text } => {
                    tracing::warn!(
                        line = line_number,
                        text = %text,
                        "Invalid line format in config file"
                    );
                    continue;
                }
                ConfigLine::Rejected { name, sql } => {
                    tracing::warn!(
                        line = line_number,
                        name = %name,
                        query = %sql,
                        "Invalid query in config file"
                    );
                    continue;
                }
                ConfigLine::Query(entry) => entry,
            };

            let Some(rows) = self.run_entry(&entry).await? else {
                continue;
            };

            if results.insert(entry.name.clone(), rows).is_some() {
                tracing::warn!(
                    line = line_number,
                    name = %entry.name,
                    "Duplicate query name, earlier result replaced"
                );
            }
        }

        Ok(results)
    }

    /// Execute one query. `Ok(None)` means it failed and was skipped.
    async fn run_entry(&self, entry: &QueryEntry) -> Result<Option<ResultSet>, SweepError> {
        let start = Instant::now();

        let stream = match self.executor.execute(&entry.sql).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(
                    line = entry.line_number,
                    name = %entry.name,
                    error = %e,
                    code = e.pg_code().unwrap_or_default(),
                    "Error executing query"
                );
                return Ok(None);
            }
        };

        let RowStream { columns, mut rows } = stream;
        let mut result = ResultSet::new();
        while let Some(row) = rows.next().await {
            result.push(row.map_err(|e| e.in_query(&entry.name))?);
        }

        tracing::debug!(
            name = %entry.name,
            columns = columns.len(),
            row_count = result.len(),
            execution_time_ms = start.elapsed().as_millis() as u64,
            "Query completed"
        );

        Ok(Some(result))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedExecutor;
    use super::*;
    use crate::models::ColumnValue;

    #[tokio::test]
    async fn test_collects_rows_in_file_order() {
        let executor = ScriptedExecutor::new()
            .rows("SELECT 1 AS one", &["one"], vec![vec![ColumnValue::Int(1)]])
            .rows(
                "SELECT name FROM t",
                &["name"],
                vec![vec!["a".into()], vec!["b".into()]],
            );
        let file =
            QueryFile::from_contents("config.txt", "q1 SELECT 1 AS one\nq2 SELECT name FROM t\n");

        let results = QueryRunner::new(&executor).run(&file).await.unwrap();

        let names: Vec<&str> = results.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["q1", "q2"]);
        assert_eq!(results["q1"][0]["one"], ColumnValue::Int(1));
        assert_eq!(results["q2"].len(), 2);
        assert_eq!(results["q2"][1]["name"], ColumnValue::Text("b".to_string()));
    }

    #[tokio::test]
    async fn test_empty_result_still_recorded() {
        let executor = ScriptedExecutor::new().rows("SELECT * FROM empty", &["id"], vec![]);
        let file = QueryFile::from_contents("config.txt", "none SELECT * FROM empty");

        let results = QueryRunner::new(&executor).run(&file).await.unwrap();
        assert_eq!(results.get("none").map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn test_execution_error_skips_query() {
        let executor = ScriptedExecutor::new()
            .exec_error("SELECT broken", "syntax error")
            .rows("SELECT 2", &["?column?"], vec![vec![ColumnValue::Int(2)]]);
        let file = QueryFile::from_contents("config.txt", "bad SELECT broken\nq2 SELECT 2");

        let results = QueryRunner::new(&executor).run(&file).await.unwrap();

        assert!(!results.contains_key("bad"));
        assert!(results.contains_key("q2"));
        assert_eq!(executor.executed.borrow().len(), 2);
    }

    #[tokio::test]
    async fn test_row_error_aborts_run() {
        let executor = ScriptedExecutor::new()
            .row_error("SELECT x", &["x"], vec![vec![ColumnValue::Int(1)]], "decode failed")
            .rows("SELECT 2", &["n"], vec![vec![ColumnValue::Int(2)]]);
        let file = QueryFile::from_contents("config.txt", "q1 SELECT x\nq2 SELECT 2");

        let err = QueryRunner::new(&executor).run(&file).await.unwrap_err();

        match err {
            SweepError::RowRead { query, message, .. } => {
                assert_eq!(query, "q1");
                assert_eq!(message, "decode failed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(*executor.executed.borrow(), vec!["SELECT x".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_lines_skipped_without_execution() {
        let executor = ScriptedExecutor::new().rows("SELECT 1", &["n"], vec![vec![ColumnValue::Int(1)]]);
        let file = QueryFile::from_contents(
            "config.txt",
            "orphan\nbad DELETE FROM t\nq1 SELECT 1\n",
        );

        let results = QueryRunner::new(&executor).run(&file).await.unwrap();

        assert_eq!(results.len(), 1);
        assert!(!results.contains_key("orphan"));
        assert!(!results.contains_key("bad"));
        assert_eq!(*executor.executed.borrow(), vec!["SELECT 1".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_name_last_write_wins() {
        let executor = ScriptedExecutor::new()
            .rows("SELECT 'first'", &["v"], vec![vec!["first".into()]])
            .rows("SELECT 'other'", &["v"], vec![vec!["other".into()]])
            .rows("SELECT 'second'", &["v"], vec![vec!["second".into()]]);
        let file = QueryFile::from_contents(
            "config.txt",
            "dup SELECT 'first'\nmid SELECT 'other'\ndup SELECT 'second'",
        );

        let results = QueryRunner::new(&executor).run(&file).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results["dup"][0]["v"], ColumnValue::Text("second".to_string()));
        // The replaced entry keeps its original position
        let names: Vec<&str> = results.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["dup", "mid"]);
    }
}
