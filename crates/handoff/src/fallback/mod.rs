//! Decides which handler the worker runs.
//!
//! [`FallbackSelector`] consumes the single [`FetchOutcome`] and drives a small
//! state machine:
//!
//! ```text
//! Fetching ──▶ FetchSucceeded ──────────────────▶ Ready
//!    │                                             ▲
//!    └──────▶ FetchFailed ──▶ FallbackCopied ──────┘
//!                  │
//!                  └──────▶ FatalNoFallback
//! ```
//!
//! `Ready` guarantees the live path holds a non-empty executable handler.
//! `FatalNoFallback` is the only fatal runtime state.

mod banner;

use std::fs;
use std::io;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use strum::Display;
use thiserror::Error;

use handoff_config::BootstrapConfig;

use crate::fetch::FetchOutcome;
use crate::files::StagedFile;
use crate::health::HealthReporter;

pub use banner::{BANNER_LIMIT, read_first_line};

/// States of the bootstrap decision machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum BootState {
    /// Waiting on the fetch outcome.
    Fetching,
    /// The fetched artifact sits at the live path.
    FetchSucceeded,
    /// The fetch failed; the baked handler is needed.
    FetchFailed,
    /// The baked handler was copied over the live path.
    FallbackCopied,
    /// Neither source produced a handler.
    FatalNoFallback,
    /// The live path holds a valid handler.
    Ready,
}

impl BootState {
    /// Returns true when the machine may move from `self` to `next`.
    #[must_use]
    pub const fn permits(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Fetching, Self::FetchSucceeded | Self::FetchFailed)
                | (Self::FetchFailed, Self::FallbackCopied | Self::FatalNoFallback)
                | (Self::FetchSucceeded | Self::FallbackCopied, Self::Ready)
        )
    }

    /// Returns true for states with no outgoing transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::FatalNoFallback)
    }
}

/// Where the resolved handler came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum HandlerSource {
    /// Downloaded from the blob store during this boot.
    Fetched,
    /// Copied from the image's baked fallback.
    Baked,
}

/// The handler chosen for this boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHandler {
    path: Utf8PathBuf,
    source: HandlerSource,
    first_line: Option<String>,
}

impl ResolvedHandler {
    pub(crate) const fn new(
        path: Utf8PathBuf,
        source: HandlerSource,
        first_line: Option<String>,
    ) -> Self {
        Self {
            path,
            source,
            first_line,
        }
    }

    /// Path of the installed handler.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Origin of the handler.
    #[must_use]
    pub const fn source(&self) -> HandlerSource {
        self.source
    }

    /// Audit banner, absent when it could not be read.
    #[must_use]
    pub fn first_line(&self) -> Option<&str> {
        self.first_line.as_deref()
    }
}

/// The baked handler could not stand in for a failed fetch.
#[derive(Debug, Clone, Error)]
pub enum FallbackUnavailableError {
    /// No file exists at the baked path.
    #[error("baked handler '{path}' does not exist")]
    Missing {
        /// Configured baked path.
        path: Utf8PathBuf,
    },
    /// The baked handler exists but could not be read.
    #[error("baked handler '{path}' is unreadable: {source}")]
    Unreadable {
        /// Configured baked path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
    /// The baked handler is zero bytes long.
    #[error("baked handler '{path}' is empty")]
    Empty {
        /// Configured baked path.
        path: Utf8PathBuf,
    },
    /// Copying the baked handler to the live path failed.
    #[error("failed to install baked handler at '{path}': {source}")]
    Install {
        /// Live path being written.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
}

/// Drives the fetch outcome to a terminal state.
pub struct FallbackSelector<'a> {
    config: &'a BootstrapConfig,
    reporter: &'a dyn HealthReporter,
    state: BootState,
}

impl<'a> FallbackSelector<'a> {
    /// Builds a selector in the `Fetching` state.
    #[must_use]
    pub const fn new(config: &'a BootstrapConfig, reporter: &'a dyn HealthReporter) -> Self {
        Self {
            config,
            reporter,
            state: BootState::Fetching,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> BootState {
        self.state
    }

    /// Resolves the handler for `outcome`, installing the baked copy when the
    /// fetch failed, and reports the audit banner.
    ///
    /// # Errors
    ///
    /// Returns [`FallbackUnavailableError`] when the fetch failed and the baked
    /// handler cannot be installed.
    pub fn resolve(
        mut self,
        outcome: FetchOutcome,
    ) -> Result<ResolvedHandler, FallbackUnavailableError> {
        let (path, source) = match outcome {
            FetchOutcome::Success(path) => {
                self.transition(BootState::FetchSucceeded);
                (path, HandlerSource::Fetched)
            }
            FetchOutcome::Failure(_) => {
                self.transition(BootState::FetchFailed);
                match install_baked(self.config) {
                    Ok(bytes) => {
                        self.reporter.fallback_installed(
                            self.config.baked_path(),
                            self.config.live_path(),
                            bytes,
                        );
                        self.transition(BootState::FallbackCopied);
                        (self.config.live_path().to_path_buf(), HandlerSource::Baked)
                    }
                    Err(error) => {
                        self.transition(BootState::FatalNoFallback);
                        return Err(error);
                    }
                }
            }
        };
        self.transition(BootState::Ready);

        let first_line = match read_first_line(path.as_std_path()) {
            Ok(line) => Some(line),
            Err(error) => {
                self.reporter.banner_unreadable(&path, &error);
                None
            }
        };
        let handler = ResolvedHandler::new(path, source, first_line);
        self.reporter.handler_banner(&handler);
        Ok(handler)
    }

    fn transition(&mut self, next: BootState) {
        debug_assert!(
            self.state.permits(next),
            "illegal transition {} -> {next}",
            self.state
        );
        self.reporter.state_changed(self.state, next);
        self.state = next;
    }
}

fn install_baked(config: &BootstrapConfig) -> Result<u64, FallbackUnavailableError> {
    let baked = config.baked_path();
    let contents = fs::read(baked).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            FallbackUnavailableError::Missing {
                path: baked.to_path_buf(),
            }
        } else {
            FallbackUnavailableError::Unreadable {
                path: baked.to_path_buf(),
                source: Arc::new(source),
            }
        }
    })?;
    if contents.is_empty() {
        return Err(FallbackUnavailableError::Empty {
            path: baked.to_path_buf(),
        });
    }

    let live = config.live_path();
    let install_error = |source: io::Error| FallbackUnavailableError::Install {
        path: live.to_path_buf(),
        source: Arc::new(source),
    };
    let mut staged = StagedFile::beside(live.as_std_path()).map_err(install_error)?;
    staged.write_all(&contents).map_err(install_error)?;
    staged.install(live.as_std_path()).map_err(install_error)?;
    Ok(contents.len() as u64)
}
