use std::io;
use std::sync::Arc;

use clap::error::ErrorKind;
use thiserror::Error;

/// Errors raised while resolving the bootstrap configuration.
///
/// All variants are fatal and are raised before the filesystem or network is
/// touched.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// A required field was absent or blank.
    #[error("missing required configuration field '{field}' (set {env} or --{flag})")]
    MissingField {
        /// Name of the first missing field.
        field: &'static str,
        /// Environment variable that supplies the field.
        env: &'static str,
        /// Command-line flag that supplies the field.
        flag: &'static str,
    },
    /// The fetch timeout was configured as zero.
    #[error("fetch timeout must be greater than zero seconds")]
    ZeroTimeout,
    /// Flags or environment values could not be parsed.
    #[error("invalid arguments: {0}")]
    Arguments(#[source] Arc<clap::Error>),
}

impl ConfigError {
    /// Returns true when the parser asked for help or version output rather
    /// than reporting a genuine failure.
    #[must_use]
    pub fn is_informational(&self) -> bool {
        match self {
            Self::Arguments(error) => matches!(
                error.kind(),
                ErrorKind::DisplayHelp
                    | ErrorKind::DisplayVersion
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ),
            _ => false,
        }
    }

    /// Writes the parser's formatted output: help and version text to stdout,
    /// usage errors to stderr. Other variants print nothing.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while writing.
    pub fn print(&self) -> io::Result<()> {
        match self {
            Self::Arguments(error) => error.print(),
            _ => Ok(()),
        }
    }

    /// Name of the missing field, when the error reports one.
    #[must_use]
    pub const fn missing_field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField { field, .. } => Some(*field),
            _ => None,
        }
    }
}

impl From<clap::Error> for ConfigError {
    fn from(error: clap::Error) -> Self {
        Self::Arguments(Arc::new(error))
    }
}
