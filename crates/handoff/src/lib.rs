//! Worker bootstrap that fetches a handler script and hands control to it.
//!
//! On boot the worker tries exactly once to download the latest handler from
//! a blob store. When that fails for any reason it installs the handler baked
//! into the image instead, so a worker with a valid image always comes up.
//! The chosen file is written to a fixed live path, its first line is logged
//! as an audit banner, and the configured interpreter takes over the process.
//!
//! The stages run strictly in order:
//!
//! 1. configuration from flags and environment ([`handoff_config`]),
//! 2. a single bounded fetch ([`fetch_artifact`]),
//! 3. the fallback decision ([`FallbackSelector`]),
//! 4. the handoff ([`ProcessExecutor`]).
//!
//! Only a configuration error, a missing fallback, or a failed exec stop the
//! worker. Each lifecycle event is reported through a [`HealthReporter`],
//! whose default implementation emits one structured log line per event.

mod bootstrap;
mod fallback;
mod fetch;
mod files;
mod health;
mod process;
mod telemetry;

use std::process::ExitCode;

pub use bootstrap::{
    BootstrapError, ConfigLoader, StaticConfigLoader, StoreProvider, SystemConfigLoader,
    SystemStoreProvider, bootstrap_with, resolve_handler,
};
pub use fallback::{
    BANNER_LIMIT, BootState, FallbackSelector, FallbackUnavailableError, HandlerSource,
    ResolvedHandler, read_first_line,
};
pub use fetch::{
    AwsCliStore, BlobStore, DirectoryStore, FetchError, FetchOutcome, ObjectLocation,
    STDERR_LIMIT, fetch_artifact,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{ExecError, HandoffExit, HandoffRequest, ProcessExecutor, SystemExecutor};
pub use telemetry::TelemetryError;

/// Runs the bootstrap against the real process environment.
///
/// Help and version requests exit successfully after printing. Fatal errors
/// have already been logged and map to a failing exit code.
#[must_use]
pub fn run() -> ExitCode {
    let reporter = StructuredHealthReporter::new();
    match bootstrap_with(
        &SystemConfigLoader,
        &SystemStoreProvider,
        &SystemExecutor,
        &reporter,
    ) {
        Ok(exit) => exit.into(),
        Err(BootstrapError::Configuration { source }) if source.is_informational() => {
            if source.print().is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(_) => ExitCode::FAILURE,
    }
}

#[cfg(test)]
mod tests;
