//! BDD test world: a temporary worker filesystem plus recording collaborators.

use std::fs;
use std::sync::Arc;

use camino::Utf8PathBuf;
use tempfile::TempDir;

use handoff_config::{BootstrapArgs, BootstrapConfig};

use crate::bootstrap::{BootstrapError, StaticConfigLoader, bootstrap_with};
use crate::process::HandoffExit;

use super::executor::{RecordedHandoff, RecordingExecutor};
use super::reporter::RecordingHealthReporter;
use super::store::{FixedStoreProvider, StubStore};

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    _dir: TempDir,
    root: Utf8PathBuf,
    bucket: Option<String>,
    key: Option<String>,
    pub store: Arc<StubStore>,
    pub reporter: RecordingHealthReporter,
    pub executor: RecordingExecutor,
    result: Option<Result<HandoffExit, BootstrapError>>,
}

impl TestWorld {
    /// Builds a world with a reachable store and no baked handler.
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temporary worker root");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf())
            .expect("temporary worker root was not valid UTF-8");
        Self {
            _dir: dir,
            root,
            bucket: Some("headturner".to_owned()),
            key: Some("handlers/worker.bin".to_owned()),
            store: Arc::new(StubStore::serving(b"VERSION 7\n")),
            reporter: RecordingHealthReporter::default(),
            executor: RecordingExecutor::default(),
            result: None,
        }
    }

    /// Sets the configured bucket and key.
    pub fn configure(&mut self, bucket: &str, key: &str) {
        self.bucket = Some(bucket.to_owned());
        self.key = Some(key.to_owned());
    }

    /// Leaves the artifact key unset.
    pub fn clear_key(&mut self) {
        self.key = None;
    }

    /// Places `contents` at the baked path.
    pub fn bake(&self, contents: &str) {
        let baked = self.baked_path();
        fs::create_dir_all(baked.parent().expect("baked path has a parent"))
            .expect("failed to create baked directory");
        fs::write(&baked, contents).expect("failed to write baked handler");
    }

    /// Path the handler is installed to.
    #[must_use]
    pub fn live_path(&self) -> Utf8PathBuf {
        self.root.join("workspace/rp_handler.py")
    }

    /// Path of the image's baked handler.
    #[must_use]
    pub fn baked_path(&self) -> Utf8PathBuf {
        self.root.join("opt/handoff/rp_handler.py")
    }

    fn interpreter_path(&self) -> Utf8PathBuf {
        self.root.join("venv/bin/python")
    }

    /// Runs the bootstrap once.
    pub fn boot(&mut self) {
        if self.result.is_some() {
            return;
        }
        let args = BootstrapArgs {
            bucket: self.bucket.clone(),
            artifact_key: self.key.clone(),
            live_path: Some(self.live_path()),
            baked_path: Some(self.baked_path()),
            interpreter_path: Some(self.interpreter_path()),
            ..BootstrapArgs::default()
        };
        let loader = match BootstrapConfig::from_args(args) {
            Ok(config) => StaticConfigLoader::new(config),
            Err(error) => StaticConfigLoader::failing(error),
        };
        let stores = FixedStoreProvider::new(Arc::clone(&self.store));
        self.result = Some(bootstrap_with(
            &loader,
            &stores,
            &self.executor,
            &self.reporter,
        ));
    }

    /// Bootstrap error, if the run failed.
    #[must_use]
    pub fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.result.as_ref().and_then(|result| result.as_ref().err())
    }

    /// Returns true when the run completed a handoff.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(self.result, Some(Ok(_)))
    }

    /// Handoffs the executor received.
    #[must_use]
    pub fn handoffs(&self) -> Vec<RecordedHandoff> {
        self.executor.handoffs()
    }

    /// Reads the live handler, if present.
    #[must_use]
    pub fn live_contents(&self) -> Option<String> {
        fs::read_to_string(self.live_path()).ok()
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}
