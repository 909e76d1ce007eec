//! Bootstrap orchestration.
//!
//! Runs the stages strictly in order: configuration, telemetry, the single
//! fetch attempt, the fallback decision, and finally the handoff. Every fatal
//! error is reported through the [`HealthReporter`] before it is returned.

use thiserror::Error;

use handoff_config::{BootstrapConfig, ConfigError, LoggingConfig, StoreBackend};

use crate::fallback::{FallbackSelector, FallbackUnavailableError, ResolvedHandler};
use crate::fetch::{AwsCliStore, BlobStore, DirectoryStore, fetch_artifact};
use crate::health::HealthReporter;
use crate::process::{ExecError, HandoffExit, HandoffRequest, ProcessExecutor};
use crate::telemetry::{self, TelemetryError};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the bootstrap configuration.
    fn load(&self) -> Result<BootstrapConfig, ConfigError>;
}

/// Loader that delegates to [`BootstrapConfig::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<BootstrapConfig, ConfigError> {
        BootstrapConfig::load()
    }
}

/// Loader returning a fixed result.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    result: Result<BootstrapConfig, ConfigError>,
}

impl StaticConfigLoader {
    /// Loader that always yields `config`.
    #[must_use]
    pub const fn new(config: BootstrapConfig) -> Self {
        Self { result: Ok(config) }
    }

    /// Loader that always fails with `error`.
    #[must_use]
    pub const fn failing(error: ConfigError) -> Self {
        Self { result: Err(error) }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<BootstrapConfig, ConfigError> {
        self.result.clone()
    }
}

/// Chooses the blob store for a configuration.
pub trait StoreProvider: Send + Sync {
    /// Builds the store selected by `config`.
    fn store_for(&self, config: &BootstrapConfig) -> Box<dyn BlobStore>;
}

/// Provider mapping [`StoreBackend`] onto the built-in stores.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemStoreProvider;

impl StoreProvider for SystemStoreProvider {
    fn store_for(&self, config: &BootstrapConfig) -> Box<dyn BlobStore> {
        match (config.store(), config.store_root()) {
            (StoreBackend::Directory, Some(root)) => Box::new(DirectoryStore::new(root)),
            // Configuration validation guarantees a root for the directory
            // store.
            _ => Box::new(AwsCliStore::new(config.aws_cli())),
        }
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Neither the fetched nor the baked handler is usable.
    #[error("no handler available: {source}")]
    FallbackUnavailable {
        /// Reason the baked handler could not be used.
        #[source]
        source: FallbackUnavailableError,
    },
    /// Control could not be handed to the interpreter.
    #[error("failed to hand off to handler: {source}")]
    Exec {
        /// Underlying exec error.
        #[source]
        source: ExecError,
    },
}

impl BootstrapError {
    /// Short machine-readable label used in structured logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "config",
            Self::Telemetry { .. } => "telemetry",
            Self::FallbackUnavailable { .. } => "fallback_unavailable",
            Self::Exec { .. } => "exec",
        }
    }

    /// Returns true when the parser produced help or version output instead
    /// of a failure.
    #[must_use]
    pub fn is_informational(&self) -> bool {
        matches!(self, Self::Configuration { source } if source.is_informational())
    }
}

/// Runs the fetch attempt and fallback decision for `config`.
///
/// # Errors
///
/// Returns [`BootstrapError::FallbackUnavailable`] when the fetch failed and
/// no baked handler could be installed.
pub fn resolve_handler(
    config: &BootstrapConfig,
    store: &dyn BlobStore,
    reporter: &dyn HealthReporter,
) -> Result<ResolvedHandler, BootstrapError> {
    let outcome = fetch_artifact(config, store, reporter);
    FallbackSelector::new(config, reporter)
        .resolve(outcome)
        .map_err(|source| BootstrapError::FallbackUnavailable { source })
}

/// Bootstraps the worker using the supplied collaborators.
///
/// In replace mode a successful handoff does not return. Otherwise the
/// handler's exit status is returned.
///
/// # Errors
///
/// Returns [`BootstrapError`] for configuration, telemetry, fallback, or
/// handoff failures. Help and version requests are returned unreported.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    stores: &dyn StoreProvider,
    executor: &dyn ProcessExecutor,
    reporter: &dyn HealthReporter,
) -> Result<HandoffExit, BootstrapError> {
    let fail = |error: BootstrapError| {
        reporter.bootstrap_failed(&error);
        error
    };

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) if source.is_informational() => {
            return Err(BootstrapError::Configuration { source });
        }
        Err(source) => {
            // Install defaults so the failure still reaches the log stream.
            drop(telemetry::initialise(&LoggingConfig::default()));
            return Err(fail(BootstrapError::Configuration { source }));
        }
    };

    if let Err(source) = telemetry::initialise(config.logging()) {
        drop(telemetry::initialise(&LoggingConfig::default()));
        return Err(fail(BootstrapError::Telemetry { source }));
    }

    reporter.bootstrap_starting();
    reporter.config_resolved(&config);

    let store = stores.store_for(&config);
    let handler = resolve_handler(&config, store.as_ref(), reporter).map_err(fail)?;

    let request = HandoffRequest::new(&config, &handler);
    reporter.handoff_starting(&request);
    executor
        .hand_off(&request)
        .map_err(|source| fail(BootstrapError::Exec { source }))
}
