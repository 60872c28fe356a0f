//! Query config file loading and validation.
//!
//! The file holds one `<name> <query>` definition per line. The first space
//! separates the name from the query text; blank lines are ignored.

use crate::error::SweepError;
use crate::models::{ConfigLine, QueryEntry};
use crate::services::sanitize::sanitize_query;

use std::path::{Path, PathBuf};

/// Default config file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.txt";

/// The raw lines of a query config file.
#[derive(Debug, Clone)]
pub struct QueryFile {
    path: PathBuf,
    lines: Vec<String>,
}

impl QueryFile {
    /// Read a config file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SweepError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SweepError::config_with_source(
                format!("can't read {} or it doesn't exist: {e}", path.display()),
                e,
            )
        })?;

        tracing::debug!(path = %path.display(), "Config file read");
        Ok(Self::from_contents(path, &contents))
    }

    /// Build from in-memory contents.
    pub fn from_contents(path: impl Into<PathBuf>, contents: &str) -> Self {
        Self { path: path.into(), lines: contents.split('\n').map(String::from).collect() }
    }

    /// Get the path the file was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Classify every line, paired with its 1-based line number.
    pub fn lines(&self) -> impl Iterator<Item = (usize, ConfigLine)> + '_ {
        self.lines.iter().enumerate().map(|(i, raw)| (i + 1, classify_line(i + 1, raw)))
    }

    /// Get the valid query definitions in file order.
    pub fn entries(&self) -> Vec<QueryEntry> {
        self.lines()
            .filter_map(|(_, line)| match line {
                ConfigLine::Query(entry) => Some(entry),
                _ => None,
            })
            .collect()
    }

    /// Whole-file pre-pass: fail on the first malformed or rejected line.
    pub fn validate(&self) -> Result<(), SweepError> {
        for (line_number, line) in self.lines() {
            match line {
                ConfigLine::Blank | ConfigLine::Query(_) => {}
                ConfigLine::Malformed { text } => {
                    tracing::warn!(
                        line = line_number,
                        text = %text,
                        "Invalid line format in config file"
                    );
                    return Err(SweepError::validation(
                        line_number,
                        format!("expected '<name> <query>', got {text:?}"),
                    ));
                }
                ConfigLine::Rejected { name, sql } => {
                    tracing::warn!(
                        line = line_number,
                        name = %name,
                        query = %sql,
                        "Invalid query in config file"
                    );
                    return Err(SweepError::validation(
                        line_number,
                        format!("query {name:?} is not a SELECT statement"),
                    ));
                }
            }
        }

        tracing::debug!(
            path = %self.path.display(),
            queries = self.entries().len(),
            "Config file validated"
        );
        Ok(())
    }
}

/// Classify a single raw config line.
pub fn classify_line(line_number: usize, raw: &str) -> ConfigLine {
    let line = raw.trim();
    if line.is_empty() {
        return ConfigLine::Blank;
    }

    let Some((name, query)) = line.split_once(' ') else {
        return ConfigLine::Malformed { text: line.to_string() };
    };

    match sanitize_query(query) {
        Some(sql) => ConfigLine::Query(QueryEntry {
            line_number,
            name: name.to_string(),
            sql: sql.to_string(),
        }),
        None => ConfigLine::Rejected { name: name.to_string(), sql: query.to_string() },
    }
}
