//! Configuration for the `handoff` worker bootstrap.
//!
//! The bootstrap reads its inputs once, at startup, from command-line flags
//! and environment variables (see [`BootstrapArgs`]). [`BootstrapConfig`] is
//! the validated, read-only result that every later stage receives by
//! reference. Validation never touches the filesystem or the network, so a
//! misconfigured worker fails before paying for a blob store round trip.
//!
//! Required fields are checked in a fixed order (`bucket`, `artifact_key`,
//! then `store_root` for the directory store) and the first missing one is
//! reported by name.

mod args;
mod defaults;
mod error;
mod launch;
mod logging;
mod store;

use std::ffi::{OsStr, OsString};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;

pub use args::BootstrapArgs;
pub use defaults::{
    DEFAULT_AWS_CLI, DEFAULT_BAKED_PATH, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_IMAGE_VERSION,
    DEFAULT_INTERPRETER_PATH, DEFAULT_LIVE_PATH, DEFAULT_LOG_FILTER, DEFAULT_REGION,
    default_baked_path, default_fetch_timeout, default_interpreter_path, default_launch_mode,
    default_live_path, default_log_format, default_store_backend,
};
pub use error::ConfigError;
pub use launch::{LaunchMode, LaunchModeParseError};
pub use logging::{LogFormat, LogFormatParseError, LoggingConfig};
pub use store::{StoreBackend, StoreBackendParseError};

/// Environment variable holding the AWS access key id.
pub const ACCESS_KEY_ENV: &str = "AWS_ACCESS_KEY_ID";

/// Environment variable holding the AWS secret access key.
pub const SECRET_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";

/// Records whether blob store credentials are present, never their values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CredentialPresence {
    /// `AWS_ACCESS_KEY_ID` is set.
    pub access_key_id: bool,
    /// `AWS_SECRET_ACCESS_KEY` is set.
    pub secret_access_key: bool,
}

impl CredentialPresence {
    /// Inspects the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            access_key_id: is_set(ACCESS_KEY_ENV),
            secret_access_key: is_set(SECRET_KEY_ENV),
        }
    }
}

fn is_set(key: &str) -> bool {
    std::env::var_os(key).is_some_and(|value| !value.is_empty())
}

/// Validated bootstrap configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    region: String,
    bucket: String,
    artifact_key: String,
    live_path: Utf8PathBuf,
    baked_path: Utf8PathBuf,
    interpreter_path: Utf8PathBuf,
    fetch_timeout: Duration,
    store: StoreBackend,
    store_root: Option<Utf8PathBuf>,
    aws_cli: String,
    launch_mode: LaunchMode,
    logging: LoggingConfig,
    image_version: String,
    handler_args: Vec<OsString>,
    credentials: CredentialPresence,
}

impl BootstrapConfig {
    /// Parses the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing fails or a required field is
    /// missing.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Parses the supplied arguments, falling back to the environment for
    /// anything not given as a flag.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing fails or a required field is
    /// missing.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let parsed = BootstrapArgs::try_parse_from(args)?;
        let config = Self::from_args(parsed)?;
        Ok(config.with_credentials(CredentialPresence::from_env()))
    }

    /// Validates raw arguments and applies defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] naming the first absent required
    /// field, or [`ConfigError::ZeroTimeout`].
    pub fn from_args(args: BootstrapArgs) -> Result<Self, ConfigError> {
        let bucket = require(args.bucket, "bucket", "S3_BUCKET", "bucket")?;
        let artifact_key = require(args.artifact_key, "artifact_key", "HANDLER_KEY", "key")?;
        let store = args.store.unwrap_or_else(default_store_backend);
        let store_root = non_blank_path(args.store_root);
        if store == StoreBackend::Directory && store_root.is_none() {
            return Err(ConfigError::MissingField {
                field: "store_root",
                env: "HANDLER_STORE_ROOT",
                flag: "store-root",
            });
        }

        let fetch_timeout = match args.fetch_timeout_secs {
            Some(0) => return Err(ConfigError::ZeroTimeout),
            Some(secs) => Duration::from_secs(secs),
            None => default_fetch_timeout(),
        };

        let logging = LoggingConfig::new(
            non_blank(args.log_filter).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned()),
            args.log_format.unwrap_or_else(default_log_format),
        );

        Ok(Self {
            region: non_blank(args.region).unwrap_or_else(|| DEFAULT_REGION.to_owned()),
            bucket,
            artifact_key,
            live_path: non_blank_path(args.live_path).unwrap_or_else(default_live_path),
            baked_path: non_blank_path(args.baked_path).unwrap_or_else(default_baked_path),
            interpreter_path: non_blank_path(args.interpreter_path)
                .unwrap_or_else(default_interpreter_path),
            fetch_timeout,
            store,
            store_root,
            aws_cli: non_blank(args.aws_cli).unwrap_or_else(|| DEFAULT_AWS_CLI.to_owned()),
            launch_mode: args.launch_mode.unwrap_or_else(default_launch_mode),
            logging,
            image_version: non_blank(args.image_version)
                .unwrap_or_else(|| DEFAULT_IMAGE_VERSION.to_owned()),
            handler_args: args.handler_args,
            credentials: CredentialPresence::default(),
        })
    }

    /// Attaches the credential presence snapshot.
    #[must_use]
    pub const fn with_credentials(mut self, credentials: CredentialPresence) -> Self {
        self.credentials = credentials;
        self
    }

    /// Overrides the handoff strategy.
    #[must_use]
    pub const fn with_launch_mode(mut self, mode: LaunchMode) -> Self {
        self.launch_mode = mode;
        self
    }

    /// Blob store region.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Bucket holding the handler artifact.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key of the handler artifact.
    #[must_use]
    pub fn artifact_key(&self) -> &str {
        &self.artifact_key
    }

    /// Path the resolved handler is installed to.
    #[must_use]
    pub fn live_path(&self) -> &Utf8Path {
        &self.live_path
    }

    /// Handler copy baked into the image.
    #[must_use]
    pub fn baked_path(&self) -> &Utf8Path {
        &self.baked_path
    }

    /// Interpreter the handler is handed to.
    #[must_use]
    pub fn interpreter_path(&self) -> &Utf8Path {
        &self.interpreter_path
    }

    /// Upper bound on the fetch attempt.
    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// Selected blob store backend.
    #[must_use]
    pub const fn store(&self) -> StoreBackend {
        self.store
    }

    /// Root of the directory store, when configured.
    #[must_use]
    pub fn store_root(&self) -> Option<&Utf8Path> {
        self.store_root.as_deref()
    }

    /// Program used by the AWS CLI store.
    #[must_use]
    pub fn aws_cli(&self) -> &OsStr {
        OsStr::new(&self.aws_cli)
    }

    /// Handoff strategy.
    #[must_use]
    pub const fn launch_mode(&self) -> LaunchMode {
        self.launch_mode
    }

    /// Telemetry settings.
    #[must_use]
    pub const fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    /// Image version reported in the boot log.
    #[must_use]
    pub fn image_version(&self) -> &str {
        &self.image_version
    }

    /// Extra arguments appended after the handler path.
    #[must_use]
    pub fn handler_args(&self) -> &[OsString] {
        &self.handler_args
    }

    /// Credential presence snapshot.
    #[must_use]
    pub const fn credentials(&self) -> CredentialPresence {
        self.credentials
    }
}

fn require(
    value: Option<String>,
    field: &'static str,
    env: &'static str,
    flag: &'static str,
) -> Result<String, ConfigError> {
    non_blank(value).ok_or(ConfigError::MissingField { field, env, flag })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn non_blank_path(value: Option<Utf8PathBuf>) -> Option<Utf8PathBuf> {
    value.filter(|path| !path.as_str().trim().is_empty())
}
