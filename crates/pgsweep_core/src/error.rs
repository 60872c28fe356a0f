//! Error types for pgsweep.
//!
//! Every failure in the library surfaces as a [`SweepError`]. The binary
//! decides which ones terminate the process.

use thiserror::Error;

/// Main error type for pgsweep.
#[derive(Debug, Error)]
pub enum SweepError {
    /// Invalid flags or an unreadable config file.
    #[error("Config error: {message}")]
    Config {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A config file line failed the whole-file pre-pass.
    #[error("Invalid config line {line}: {reason}")]
    Validation {
        /// 1-based line number in the config file.
        line: usize,
        /// Why the line was rejected.
        reason: String,
    },

    /// Database connection failed or was lost.
    #[error("Connection error: {message}")]
    Connection {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Authentication failed.
    #[error("Authentication error: {message}")]
    Authentication {
        /// Human-readable error message.
        message: String,
        /// Actionable hint for the operator.
        hint: Option<String>,
    },

    /// SSL/TLS setup error.
    #[error("SSL error: {message}")]
    Ssl {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Query execution error with PostgreSQL-specific details.
    #[error("{message}")]
    Query {
        /// PostgreSQL error message.
        message: String,
        /// Additional detail from PostgreSQL.
        detail: Option<String>,
        /// PostgreSQL hint.
        hint: Option<String>,
        /// Position in query (1-indexed).
        position: Option<usize>,
        /// SQLSTATE code (e.g., "42P01").
        code: Option<String>,
    },

    /// Reading or decoding the rows of an executed query failed.
    #[error("Row read error in query {query}: {message}")]
    RowRead {
        /// Name of the query whose rows were being read.
        query: String,
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serializing the final result map failed.
    #[error("Report error: {message}")]
    Report {
        /// Human-readable error message.
        message: String,
    },
}

impl SweepError {
    // ========== Constructors ==========

    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a new config error with source.
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(Box::new(source)) }
    }

    /// Create a new line validation error.
    pub fn validation(line: usize, reason: impl Into<String>) -> Self {
        Self::Validation { line, reason: reason.into() }
    }

    /// Create a new connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection { message: message.into(), source: None }
    }

    /// Create a new connection error with source.
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection { message: message.into(), source: Some(Box::new(source)) }
    }

    /// Create a new SSL error with source.
    pub fn ssl_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Ssl { message: message.into(), source: Some(Box::new(source)) }
    }

    /// Create a new query error with full PostgreSQL details.
    pub fn query(
        message: impl Into<String>,
        detail: Option<String>,
        hint: Option<String>,
        position: Option<usize>,
        code: Option<String>,
    ) -> Self {
        Self::Query { message: message.into(), detail, hint, position, code }
    }

    /// Create a new row read error.
    pub fn row_read(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RowRead { query: query.into(), message: message.into(), source: None }
    }

    /// Create a new row read error with source.
    pub fn row_read_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::RowRead {
            query: String::new(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a row read error from a failure of the row stream.
    pub fn row_stream(err: tokio_postgres::Error) -> Self {
        Self::row_read_with_source(describe_pg_error(&err), err)
    }

    /// Attach the query name to a row read error produced below the runner.
    pub fn in_query(self, name: &str) -> Self {
        match self {
            Self::RowRead { message, source, .. } => {
                Self::RowRead { query: name.to_string(), message, source }
            }
            other => Self::RowRead {
                query: name.to_string(),
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }

    /// Create a new report error.
    pub fn report(message: impl Into<String>) -> Self {
        Self::Report { message: message.into() }
    }

    // ========== Methods ==========

    /// Get the error category name.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "Config",
            Self::Validation { .. } => "Validation",
            Self::Connection { .. } => "Connection",
            Self::Authentication { .. } => "Authentication",
            Self::Ssl { .. } => "SSL",
            Self::Query { .. } => "Query",
            Self::RowRead { .. } => "RowRead",
            Self::Report { .. } => "Report",
        }
    }

    /// Get actionable hint for the operator.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Config { .. } => None,
            Self::Validation { .. } => {
                Some("Each line must be '<name> <query>' and the query must start with SELECT")
            }
            Self::Connection { .. } => Some("Check that the database server is running"),
            Self::Authentication { hint, .. } => hint.as_deref(),
            Self::Ssl { .. } => Some("Verify SSL certificate configuration"),
            Self::Query { hint, .. } => hint.as_deref(),
            Self::RowRead { .. } => None,
            Self::Report { .. } => None,
        }
    }

    /// Get the SQLSTATE code (if applicable).
    pub fn pg_code(&self) -> Option<&str> {
        match self {
            Self::Query { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

// ========== Error Conversions ==========

/// Convert from tokio_postgres::Error to SweepError.
impl From<tokio_postgres::Error> for SweepError {
    fn from(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let message = db_err.message().to_string();
            let detail = db_err.detail().map(String::from);
            let hint = db_err.hint().map(String::from);
            let position = db_err.position().and_then(|p| match p {
                tokio_postgres::error::ErrorPosition::Original(pos) => Some(*pos as usize),
                tokio_postgres::error::ErrorPosition::Internal { .. } => None,
            });
            let code_str = db_err.code().code();

            return match code_str {
                "28P01" => SweepError::Authentication {
                    message,
                    hint: Some("Invalid password - check your credentials".to_string()),
                },
                "28000" => SweepError::Authentication {
                    message,
                    hint: Some(
                        "Authentication failed - check username and permissions".to_string(),
                    ),
                },
                _ if code_str.starts_with("08") => {
                    SweepError::Connection { message, source: Some(Box::new(err)) }
                }
                _ => SweepError::Query {
                    message,
                    detail,
                    hint,
                    position,
                    code: Some(code_str.to_string()),
                },
            };
        }

        if err.is_closed() {
            return SweepError::Connection {
                message: "Connection closed".to_string(),
                source: Some(Box::new(err)),
            };
        }

        SweepError::Connection { message: describe_pg_error(&err), source: Some(Box::new(err)) }
    }
}

/// Render a driver error with the server message and SQLSTATE when the
/// server sent one, or with the underlying cause otherwise.
pub fn describe_pg_error(err: &tokio_postgres::Error) -> String {
    if let Some(db_err) = err.as_db_error() {
        return server_message(db_err.message(), db_err.code().code());
    }
    match std::error::Error::source(err) {
        Some(cause) => format!("{err}: {cause}"),
        None => err.to_string(),
    }
}

fn server_message(message: &str, code: &str) -> String {
    format!("{message} (SQLSTATE {code})")
}

/// Convert from serde_json::Error to SweepError.
impl From<serde_json::Error> for SweepError {
    fn from(err: serde_json::Error) -> Self {
        SweepError::Report { message: format!("JSON error: {err}") }
    }
}
