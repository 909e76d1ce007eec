//! Single-attempt retrieval of the handler artifact.
//!
//! [`fetch_artifact`] makes exactly one attempt against a [`BlobStore`],
//! bounded by the configured timeout. The object is downloaded into a staging
//! file beside the live path and only renamed into place once it is complete
//! and non-empty, so a failed attempt never leaves a partial handler behind.
//! Failures are captured in [`FetchOutcome::Failure`] rather than returned as
//! errors and feed the fallback decision.

mod aws_cli;
mod directory;
mod error;

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;

use handoff_config::BootstrapConfig;

use crate::files::StagedFile;
use crate::health::HealthReporter;

pub use aws_cli::{AwsCliStore, STDERR_LIMIT};
pub use directory::DirectoryStore;
pub use error::FetchError;

/// Tracing target for fetch diagnostics.
pub(crate) const FETCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::fetch");

/// Address of an object in the blob store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    bucket: String,
    key: String,
    region: String,
}

impl ObjectLocation {
    /// Builds a location from its parts.
    #[must_use]
    pub fn new(bucket: impl Into<String>, key: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            region: region.into(),
        }
    }

    /// Location of the configured handler artifact.
    #[must_use]
    pub fn from_config(config: &BootstrapConfig) -> Self {
        Self::new(config.bucket(), config.artifact_key(), config.region())
    }

    /// Bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key within the bucket.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Region the bucket lives in.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// `s3://bucket/key` form of the location.
    #[must_use]
    pub fn uri(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// A source of handler artifacts.
pub trait BlobStore: Send + Sync {
    /// Short backend name used in logs.
    fn backend(&self) -> &'static str;

    /// Copies the object at `location` to `destination`, giving up once
    /// `timeout` has elapsed.
    ///
    /// Implementations make a single attempt and must not retry.
    fn fetch(
        &self,
        location: &ObjectLocation,
        destination: &Path,
        timeout: Duration,
    ) -> Result<(), FetchError>;
}

impl<T> BlobStore for Arc<T>
where
    T: BlobStore + ?Sized,
{
    fn backend(&self) -> &'static str {
        (**self).backend()
    }

    fn fetch(
        &self,
        location: &ObjectLocation,
        destination: &Path,
        timeout: Duration,
    ) -> Result<(), FetchError> {
        (**self).fetch(location, destination, timeout)
    }
}

/// Result of the single fetch attempt.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The artifact was installed at the contained live path.
    Success(Utf8PathBuf),
    /// The attempt failed; the live path was left untouched.
    Failure(FetchError),
}

impl FetchOutcome {
    /// Returns true for [`FetchOutcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Fetches the configured artifact into the live path.
///
/// Reports the attempt and its result through `reporter`. Exactly one call is
/// made to `store`.
#[must_use]
pub fn fetch_artifact(
    config: &BootstrapConfig,
    store: &dyn BlobStore,
    reporter: &dyn HealthReporter,
) -> FetchOutcome {
    let location = ObjectLocation::from_config(config);
    reporter.fetch_starting(&location, store.backend(), config.fetch_timeout());

    match attempt(config, store, &location) {
        Ok(bytes) => {
            reporter.fetch_succeeded(&location, config.live_path(), bytes);
            FetchOutcome::Success(config.live_path().to_path_buf())
        }
        Err(error) => {
            reporter.fetch_failed(&location, &error);
            FetchOutcome::Failure(error)
        }
    }
}

fn attempt(
    config: &BootstrapConfig,
    store: &dyn BlobStore,
    location: &ObjectLocation,
) -> Result<u64, FetchError> {
    let live = config.live_path().as_std_path();
    let staged = StagedFile::beside(live).map_err(|source| FetchError::io(live, source))?;

    store.fetch(location, staged.path(), config.fetch_timeout())?;

    let bytes = staged
        .len()
        .map_err(|source| FetchError::io(staged.path(), source))?;
    if bytes == 0 {
        return Err(FetchError::EmptyArtifact {
            location: location.to_string(),
        });
    }

    staged
        .install(live)
        .map_err(|source| FetchError::io(live, source))?;
    Ok(bytes)
}
