//! Error types for artifact retrieval.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

/// Reasons a fetch attempt failed.
///
/// A fetch failure is never fatal on its own; the fallback selector decides
/// whether the baked handler can stand in.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The blob store client could not be launched.
    #[error("blob store client '{program}' is unavailable: {source}")]
    ToolUnavailable {
        /// Program that failed to start.
        program: String,
        /// Underlying spawn error.
        #[source]
        source: Arc<io::Error>,
    },
    /// The attempt exceeded the configured timeout and was abandoned.
    #[error("fetching {location} timed out after {timeout_secs}s")]
    Timeout {
        /// Remote object being fetched.
        location: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The blob store client exited unsuccessfully.
    #[error("fetching {location} failed ({status}): {stderr}")]
    CommandFailed {
        /// Remote object being fetched.
        location: String,
        /// Exit status description.
        status: String,
        /// Truncated standard error of the client.
        stderr: String,
    },
    /// The object does not exist in the store.
    #[error("object {location} was not found")]
    NotFound {
        /// Remote object being fetched.
        location: String,
    },
    /// The object key cannot be mapped onto the store safely.
    #[error("object key '{key}' is not a valid relative key")]
    InvalidKey {
        /// Rejected key.
        key: String,
    },
    /// The store returned a zero-length object.
    #[error("object {location} is empty")]
    EmptyArtifact {
        /// Remote object being fetched.
        location: String,
    },
    /// Local filesystem work around the fetch failed.
    #[error("I/O error at '{path}' while fetching: {source}")]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
}

impl FetchError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source: Arc::new(source),
        }
    }

    /// Short machine-readable label used in structured logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ToolUnavailable { .. } => "tool_unavailable",
            Self::Timeout { .. } => "timeout",
            Self::CommandFailed { .. } => "command_failed",
            Self::NotFound { .. } => "not_found",
            Self::InvalidKey { .. } => "invalid_key",
            Self::EmptyArtifact { .. } => "empty_artifact",
            Self::Io { .. } => "io",
        }
    }
}
