//! Boot diagnostics on stderr.
//!
//! The handler inherits stdout, so every bootstrap log line goes to stderr.
//! One global subscriber is installed per process. When configuration cannot
//! be resolved, [`LoggingConfig::default`] is installed instead so the
//! configuration error is still written as a structured line.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::Subscriber;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, time::UtcTime};

use handoff_config::{LogFormat, LoggingConfig};

static INSTALLED: OnceCell<()> = OnceCell::new();

type BoxedSubscriber = Box<dyn Subscriber + Send + Sync>;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The log filter expression did not parse.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Another global subscriber was already installed.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global subscriber described by `settings`.
///
/// Only the first successful call has an effect. Later calls return `Ok(())`
/// and keep the subscriber that is already in place, which lets the
/// configuration-failure path install defaults without checking whether
/// anything ran before it.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or a foreign
/// subscriber already owns the global default.
pub fn initialise(settings: &LoggingConfig) -> Result<(), TelemetryError> {
    INSTALLED
        .get_or_try_init(|| {
            let subscriber = build_subscriber(settings)?;
            tracing::subscriber::set_global_default(subscriber)
                .map_err(TelemetryError::Subscriber)
        })
        .map(|_| ())
}

fn build_subscriber(settings: &LoggingConfig) -> Result<BoxedSubscriber, TelemetryError> {
    let env_filter = EnvFilter::try_new(settings.filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let builder = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339())
        .with_target(true);

    let subscriber: BoxedSubscriber = match settings.format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };
    Ok(subscriber)
}
