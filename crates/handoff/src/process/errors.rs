//! Defines the error surface for the process handoff.

use std::io;
use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while handing control to the interpreter.
///
/// All variants are fatal and occur before any handler code runs.
#[derive(Debug, Clone, Error)]
pub enum ExecError {
    /// The interpreter does not exist.
    #[error("interpreter '{path}' does not exist")]
    InterpreterMissing {
        /// Configured interpreter path.
        path: Utf8PathBuf,
    },
    /// Replacing the process image failed.
    #[error("failed to exec interpreter '{path}': {source}")]
    Replace {
        /// Configured interpreter path.
        path: Utf8PathBuf,
        /// Underlying OS error.
        #[source]
        source: Arc<io::Error>,
    },
    /// Spawning the supervised interpreter failed.
    #[error("failed to spawn interpreter '{path}': {source}")]
    Spawn {
        /// Configured interpreter path.
        path: Utf8PathBuf,
        /// Underlying OS error.
        #[source]
        source: Arc<io::Error>,
    },
    /// Installing the signal forwarder failed.
    #[error("failed to install signal forwarding: {source}")]
    Signals {
        /// Underlying OS error.
        #[source]
        source: Arc<io::Error>,
    },
    /// Waiting on the supervised interpreter failed.
    #[error("failed to wait for interpreter: {source}")]
    Wait {
        /// Underlying OS error.
        #[source]
        source: Arc<io::Error>,
    },
}
