//! The single database connection of a run.
//!
//! Provides:
//! - TLS selection per SSL mode (native-tls)
//! - Liveness check right after connecting
//! - Query execution with streamed rows in the server's text format

use crate::error::{describe_pg_error, SweepError};
use crate::models::{ConnectionConfig, SslMode};
use crate::services::decode::{decode_row, ResultColumn};
use crate::services::runner::{QueryExecutor, RowStream};

use futures_util::{future, StreamExt};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio::task::JoinHandle;
use tokio_postgres::tls::MakeTlsConnect;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage, Socket};

/// Application name reported to PostgreSQL.
const APPLICATION_NAME: &str = "pgsweep";

/// An open, verified database connection.
///
/// Dropping it closes the connection; [`Database::close`] also waits for
/// the connection task to finish.
pub struct Database {
    client: Client,
    connection: JoinHandle<()>,
}

impl Database {
    /// Open the connection and verify it with a liveness check.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, SweepError> {
        let pg_config = pg_config(config);

        let (client, connection) = match config.ssl_mode {
            SslMode::Disable => open(&pg_config, NoTls).await?,
            mode => open(&pg_config, tls_connector(mode, config)?).await?,
        };

        let database = Self { client, connection };

        database
            .client
            .execute("SELECT 1", &[])
            .await
            .map_err(|e| {
                SweepError::connection_with_source(
                    format!("Liveness check failed: {}", describe_pg_error(&e)),
                    e,
                )
            })?;

        tracing::info!(
            url = %config.display_url(),
            host = %config.host,
            port = config.port,
            database = %config.database,
            user = %config.user,
            ssl_mode = %config.ssl_mode,
            "connected to database"
        );

        Ok(database)
    }

    /// Close the connection and wait for the connection task to exit.
    pub async fn close(self) {
        let Self { client, connection } = self;
        drop(client);
        if let Err(e) = connection.await {
            tracing::warn!(error = %e, "Connection task did not shut down cleanly");
        }
        tracing::debug!("Database connection closed");
    }
}

impl QueryExecutor for Database {
    async fn execute(&self, sql: &str) -> Result<RowStream, SweepError> {
        // Column types come from the prepared statement; values are read as text
        let statement = self.client.prepare(sql).await?;
        let columns: Vec<ResultColumn> =
            statement.columns().iter().map(ResultColumn::from_column).collect();

        let mut messages = Box::pin(self.client.simple_query_raw(sql).await?);

        // An error before the row description is a failure of the query itself
        loop {
            match messages.next().await {
                Some(Ok(SimpleQueryMessage::RowDescription(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(SweepError::from(e)),
            }
        }

        let names = columns.iter().map(|c| c.name.clone()).collect();
        let rows = messages.filter_map(move |message| {
            future::ready(match message {
                Ok(SimpleQueryMessage::Row(row)) => Some(decode_row(&row, &columns)),
                Ok(_) => None,
                Err(e) => Some(Err(SweepError::row_stream(e))),
            })
        });

        Ok(RowStream { columns: names, rows: rows.boxed() })
    }
}

/// Build the driver configuration.
fn pg_config(config: &ConnectionConfig) -> tokio_postgres::Config {
    let mut pg_config = tokio_postgres::Config::new();
    pg_config.host(&config.host);
    pg_config.port(config.port);
    pg_config.user(&config.user);
    pg_config.password(&config.password);
    pg_config.dbname(&config.database);
    pg_config.application_name(APPLICATION_NAME);
    pg_config.ssl_mode(match config.ssl_mode {
        SslMode::Disable => tokio_postgres::config::SslMode::Disable,
        _ => tokio_postgres::config::SslMode::Require,
    });
    pg_config
}

/// Connect and spawn the connection future on the current runtime.
async fn open<T>(
    pg_config: &tokio_postgres::Config,
    tls: T,
) -> Result<(Client, JoinHandle<()>), SweepError>
where
    T: MakeTlsConnect<Socket>,
    T::Stream: Send + 'static,
{
    let (client, connection) = pg_config.connect(tls).await?;

    let handle = tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::warn!(error = %e, "Database connection error");
        }
    });

    Ok((client, handle))
}

/// Build the TLS connector for a TLS-using SSL mode.
fn tls_connector(mode: SslMode, config: &ConnectionConfig) -> Result<MakeTlsConnector, SweepError> {
    let mut builder = TlsConnector::builder();

    match mode {
        // Encrypt only, like libpq's require
        SslMode::Require => {
            builder.danger_accept_invalid_certs(true);
            builder.danger_accept_invalid_hostnames(true);
        }
        SslMode::VerifyCa => {
            builder.danger_accept_invalid_hostnames(true);
        }
        SslMode::VerifyFull | SslMode::Disable => {}
    }

    if mode.verifies_certificate() {
        if let Some(path) = &config.ssl_root_cert {
            let pem = std::fs::read(path).map_err(|e| {
                SweepError::ssl_with_source(
                    format!("Failed to read CA certificate {}: {e}", path.display()),
                    e,
                )
            })?;
            let cert = native_tls::Certificate::from_pem(&pem).map_err(|e| {
                SweepError::ssl_with_source(
                    format!("Failed to parse CA certificate {}: {e}", path.display()),
                    e,
                )
            })?;
            builder.add_root_certificate(cert);
        }
    }

    let connector = builder
        .build()
        .map_err(|e| SweepError::ssl_with_source(format!("Failed to create TLS connector: {e}"), e))?;

    Ok(MakeTlsConnector::new(connector))
}
