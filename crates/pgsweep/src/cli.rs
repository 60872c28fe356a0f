use clap::Parser;
use pgsweep_core::{ConnectionConfig, SslMode, SweepError};
use std::ffi::OsString;
use std::path::PathBuf;

/// Long flags that may also be written with a single dash (`-ip`, `-ssl=require`).
const LONG_FLAGS: &[&str] = &["ip", "port", "user", "password", "db", "ssl", "sslrootcert", "config"];

#[derive(Parser, Debug)]
#[command(
    name = "pgsweep",
    version,
    about = "Run a battery of named read-only queries against PostgreSQL and log the results",
    args_override_self = true
)]
pub struct Cli {
    /// Database IP address
    #[arg(long, default_value = "127.0.0.1", env = "PGSWEEP_HOST")]
    pub ip: String,

    /// Database port
    #[arg(long, default_value_t = 5432, env = "PGSWEEP_PORT")]
    pub port: u16,

    /// Database user
    #[arg(long, default_value = "USERNAME", env = "PGSWEEP_USER")]
    pub user: String,

    /// Database password
    #[arg(long, default_value = "PASSWORD", env = "PGSWEEP_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Database name
    #[arg(long, default_value = "DBNAME", env = "PGSWEEP_DB")]
    pub db: String,

    /// SSL mode (disable, require, verify-ca, verify-full)
    #[arg(long, default_value = "disable", env = "PGSWEEP_SSL")]
    pub ssl: String,

    /// PEM root certificate for verify-ca and verify-full
    #[arg(long, env = "PGSWEEP_SSLROOTCERT")]
    pub sslrootcert: Option<PathBuf>,

    /// Query config file
    #[arg(long, default_value = pgsweep_core::services::config::DEFAULT_CONFIG_PATH, env = "PGSWEEP_CONFIG")]
    pub config: PathBuf,
}

impl Cli {
    /// Parse the process arguments, accepting single-dash long flags.
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    /// Build the connection parameters, rejecting an unknown SSL mode.
    pub fn connection_config(&self) -> Result<ConnectionConfig, SweepError> {
        let ssl_mode: SslMode = self.ssl.parse()?;

        Ok(ConnectionConfig {
            host: self.ip.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.password.clone(),
            database: self.db.clone(),
            ssl_mode,
            ssl_root_cert: self.sslrootcert.clone(),
        })
    }
}

/// Rewrite `-name` and `-name=value` to `--name...` for the known long flags.
///
/// Arguments after a bare `--` are left alone.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut past_terminator = false;

    args.into_iter()
        .map(|arg| {
            if past_terminator {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                past_terminator = true;
                return arg;
            }

            match text.strip_prefix('-') {
                Some(rest) if !rest.starts_with('-') => {
                    let name = rest.split_once('=').map_or(rest, |(name, _)| name);
                    if LONG_FLAGS.contains(&name) {
                        OsString::from(format!("-{text}"))
                    } else {
                        arg
                    }
                }
                _ => arg,
            }
        })
        .collect()
}
