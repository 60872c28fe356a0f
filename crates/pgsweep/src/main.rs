//! pgsweep - run a battery of named read-only queries and log the results.

mod cli;

use cli::Cli;
use pgsweep_core::logging::{init_logging, LogConfig};
use pgsweep_core::services::report::report;
use pgsweep_core::{Database, QueryFile, QueryRunner, SweepError};
use std::process;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse_normalized();

    let logging_guard = init_logging(LogConfig::new());

    if let Err(err) = run(&cli).await {
        tracing::error!(
            category = err.category(),
            hint = err.hint().unwrap_or_default(),
            "{err}"
        );
        // Flush before exiting; process::exit skips destructors
        drop(logging_guard);
        process::exit(1);
    }
}

/// The whole run: every error returned here is fatal.
async fn run(cli: &Cli) -> Result<(), SweepError> {
    let connection_config = cli.connection_config()?;

    let file = QueryFile::load(&cli.config)?;
    file.validate()?;

    let database = Database::connect(&connection_config).await?;

    let results = QueryRunner::new(&database).run(&file).await?;
    let outcome = report(&results);

    database.close().await;
    outcome
}
