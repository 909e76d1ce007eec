//! Blob store backed by a local directory tree.
//!
//! Object keys are resolved relative to the root, with the bucket as the first
//! path component. Useful for mirrored artifacts on a mounted volume and for
//! exercising the bootstrap without network access.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};

use super::{BlobStore, FetchError, ObjectLocation};

/// Reads objects from `<root>/<bucket>/<key>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryStore {
    root: Utf8PathBuf,
}

impl DirectoryStore {
    /// Builds a store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Resolves the on-disk path of `location`, rejecting keys that would
    /// escape the root.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidKey`] for absolute keys or keys containing
    /// `..`.
    pub fn object_path(&self, location: &ObjectLocation) -> Result<PathBuf, FetchError> {
        let mut path = self.root.as_std_path().join(checked(location.bucket())?);
        path.push(checked(location.key())?);
        Ok(path)
    }
}

fn checked(segment: &str) -> Result<&Path, FetchError> {
    let path = Path::new(segment);
    let valid = !segment.is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
    if valid {
        Ok(path)
    } else {
        Err(FetchError::InvalidKey {
            key: segment.to_owned(),
        })
    }
}

impl BlobStore for DirectoryStore {
    fn backend(&self) -> &'static str {
        "directory"
    }

    fn fetch(
        &self,
        location: &ObjectLocation,
        destination: &Path,
        timeout: Duration,
    ) -> Result<(), FetchError> {
        let source = self.object_path(location)?;
        let target = destination.to_path_buf();

        // The copy is abandoned, not cancelled, once the timeout passes.
        let (sender, receiver) = mpsc::channel();
        let copy_source = source.clone();
        thread::spawn(move || {
            drop(sender.send(fs::copy(&copy_source, &target)));
        });

        await_copy(&receiver, location, &source, timeout)
    }
}

fn await_copy(
    receiver: &Receiver<io::Result<u64>>,
    location: &ObjectLocation,
    source: &Path,
    timeout: Duration,
) -> Result<(), FetchError> {
    match receiver.recv_timeout(timeout) {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(error)) if error.kind() == io::ErrorKind::NotFound => Err(FetchError::NotFound {
            location: location.to_string(),
        }),
        Ok(Err(error)) => Err(FetchError::io(source, error)),
        Err(RecvTimeoutError::Timeout) => Err(FetchError::Timeout {
            location: location.to_string(),
            timeout_secs: timeout.as_secs(),
        }),
        Err(RecvTimeoutError::Disconnected) => Err(FetchError::io(
            source,
            io::Error::other("copy worker exited without a result"),
        )),
    }
}
