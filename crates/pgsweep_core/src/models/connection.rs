//! Connection parameters.

use crate::error::SweepError;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// SSL mode for the database connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    /// No SSL
    #[default]
    Disable,
    /// Require SSL, accept any certificate
    Require,
    /// Require SSL, verify CA
    VerifyCa,
    /// Require SSL, verify CA and hostname
    VerifyFull,
}

impl SslMode {
    /// Convert to the libpq-style string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disable => "disable",
            Self::Require => "require",
            Self::VerifyCa => "verify-ca",
            Self::VerifyFull => "verify-full",
        }
    }

    /// Whether the server certificate chain is checked.
    pub fn verifies_certificate(&self) -> bool {
        matches!(self, Self::VerifyCa | Self::VerifyFull)
    }
}

impl FromStr for SslMode {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disable" => Ok(Self::Disable),
            "require" => Ok(Self::Require),
            "verify-ca" => Ok(Self::VerifyCa),
            "verify-full" => Ok(Self::VerifyFull),
            other => Err(SweepError::config(format!(
                "unsupported sslmode {other:?}; use disable, require, verify-ca, or verify-full"
            ))),
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for the single database connection of a run.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Server hostname or IP
    pub host: String,
    /// Server port
    pub port: u16,
    /// Login username
    pub user: String,
    /// Login password
    pub password: String,
    /// Database name
    pub database: String,
    /// SSL configuration
    pub ssl_mode: SslMode,
    /// Extra PEM root certificate for the verifying SSL modes
    pub ssl_root_cert: Option<PathBuf>,
}

impl ConnectionConfig {
    /// Get the display connection string (without password).
    pub fn display_url(&self) -> String {
        format!(
            "postgresql://{}@{}:{}/{}?sslmode={}",
            self.user, self.host, self.port, self.database, self.ssl_mode
        )
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5432,
            user: "USERNAME".to_string(),
            password: "PASSWORD".to_string(),
            database: "DBNAME".to_string(),
            ssl_mode: SslMode::default(),
            ssl_root_cert: None,
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("ssl_mode", &self.ssl_mode)
            .field("ssl_root_cert", &self.ssl_root_cert)
            .finish()
    }
}
