//! In-memory blob store that counts how often it is contacted.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use handoff_config::BootstrapConfig;

use crate::bootstrap::StoreProvider;
use crate::fetch::{BlobStore, FetchError, ObjectLocation};

#[derive(Debug, Clone)]
enum Behaviour {
    Serve(Vec<u8>),
    Unreachable,
}

/// Blob store serving a fixed payload or failing every request.
#[derive(Debug)]
pub struct StubStore {
    behaviour: Mutex<Behaviour>,
    calls: AtomicUsize,
}

impl StubStore {
    /// Store serving `contents` for every key.
    #[must_use]
    pub fn serving(contents: &[u8]) -> Self {
        Self {
            behaviour: Mutex::new(Behaviour::Serve(contents.to_vec())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Switches to serving `contents`.
    pub fn serve(&self, contents: &[u8]) {
        *self.behaviour.lock().expect("store mutex poisoned") = Behaviour::Serve(contents.to_vec());
    }

    /// Switches to failing every request.
    pub fn make_unreachable(&self) {
        *self.behaviour.lock().expect("store mutex poisoned") = Behaviour::Unreachable;
    }

    /// Number of fetch calls received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BlobStore for StubStore {
    fn backend(&self) -> &'static str {
        "stub"
    }

    fn fetch(
        &self,
        location: &ObjectLocation,
        destination: &Path,
        _timeout: Duration,
    ) -> Result<(), FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behaviour = self.behaviour.lock().expect("store mutex poisoned").clone();
        match behaviour {
            Behaviour::Serve(contents) => {
                fs::write(destination, contents).map_err(|error| FetchError::io(destination, error))
            }
            Behaviour::Unreachable => Err(FetchError::CommandFailed {
                location: location.to_string(),
                status: "exit code 1".to_owned(),
                stderr: "Could not connect to the endpoint URL".to_owned(),
            }),
        }
    }
}

/// Provider handing out a shared [`StubStore`].
#[derive(Debug, Clone)]
pub struct FixedStoreProvider {
    store: Arc<StubStore>,
}

impl FixedStoreProvider {
    /// Wraps `store`.
    #[must_use]
    pub const fn new(store: Arc<StubStore>) -> Self {
        Self { store }
    }
}

impl StoreProvider for FixedStoreProvider {
    fn store_for(&self, _config: &BootstrapConfig) -> Box<dyn BlobStore> {
        Box::new(Arc::clone(&self.store))
    }
}
