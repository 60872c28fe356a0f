//! Structured JSON logging to stdout.
//!
//! Provides:
//! - One JSON object per record, event fields flattened to the top level
//! - Non-blocking stdout writer flushed when the guard drops
//! - Environment variable override via PGSWEEP_LOG or RUST_LOG
//!
//! The subscriber is installed as the default for the current thread only,
//! for as long as the returned [`LoggingGuard`] lives.

use tracing::subscriber::DefaultGuard;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Logging configuration.
#[derive(Debug, Default)]
pub struct LogConfig {
    /// Optional custom log filter
    pub log_filter: Option<String>,
}

impl LogConfig {
    /// Create a new logging configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom log filter.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }
}

/// Guard that must be held for the lifetime of the run.
///
/// Dropping this guard uninstalls the subscriber and flushes pending records.
pub struct LoggingGuard {
    // Field order matters: the subscriber goes away before the writer flushes.
    _default_guard: DefaultGuard,
    _worker_guard: WorkerGuard,
}

/// Initialize JSON logging with the given configuration and emit the
/// `Initialized` record.
pub fn init_logging(config: LogConfig) -> LoggingGuard {
    let (non_blocking, worker_guard) = tracing_appender::non_blocking(std::io::stdout());

    let default_guard = tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_writer(non_blocking)
        .with_env_filter(build_env_filter(config.log_filter.as_deref()))
        .with_target(false)
        .finish()
        .set_default();

    tracing::info!("Initialized");

    LoggingGuard { _default_guard: default_guard, _worker_guard: worker_guard }
}

/// Build the environment filter from config or defaults.
fn build_env_filter(custom_filter: Option<&str>) -> EnvFilter {
    // Priority: custom filter > PGSWEEP_LOG > RUST_LOG > default
    if let Some(filter) = custom_filter {
        return EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(default_log_filter()));
    }

    EnvFilter::try_from_env("PGSWEEP_LOG")
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter()))
}

/// Get the default log filter.
pub fn default_log_filter() -> &'static str {
    "info,tokio_postgres=warn"
}
