//! Test double for [`HealthReporter`] that records structured events for assertions.

use std::io;
use std::sync::Mutex;
use std::time::Duration;

use camino::Utf8Path;

use handoff_config::BootstrapConfig;

use crate::bootstrap::BootstrapError;
use crate::fallback::{BootState, ResolvedHandler};
use crate::fetch::{FetchError, ObjectLocation};
use crate::health::HealthReporter;
use crate::process::HandoffRequest;

/// Structured health events tracked during tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Configuration validated.
    ConfigResolved,
    /// Fetch attempt started against the named backend.
    FetchStarting(String),
    /// Fetch installed the given number of bytes.
    FetchSucceeded(u64),
    /// Fetch failed with the given error kind.
    FetchFailed(String),
    /// State machine entered the given state.
    StateChanged(BootState),
    /// Baked handler installed.
    FallbackInstalled,
    /// Audit banner reported.
    Banner(Option<String>),
    /// Banner could not be read.
    BannerUnreadable,
    /// Handoff about to start.
    HandoffStarting,
    /// Bootstrap failed with the given error kind.
    BootstrapFailed(String),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// States entered, in order.
    #[must_use]
    pub fn transitions(&self) -> Vec<BootState> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HealthEvent::StateChanged(state) => Some(state),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn config_resolved(&self, _config: &BootstrapConfig) {
        self.record(HealthEvent::ConfigResolved);
    }

    fn fetch_starting(&self, _location: &ObjectLocation, backend: &str, _timeout: Duration) {
        self.record(HealthEvent::FetchStarting(backend.to_owned()));
    }

    fn fetch_succeeded(&self, _location: &ObjectLocation, _live_path: &Utf8Path, bytes: u64) {
        self.record(HealthEvent::FetchSucceeded(bytes));
    }

    fn fetch_failed(&self, _location: &ObjectLocation, error: &FetchError) {
        self.record(HealthEvent::FetchFailed(error.kind().to_owned()));
    }

    fn state_changed(&self, _from: BootState, to: BootState) {
        self.record(HealthEvent::StateChanged(to));
    }

    fn fallback_installed(&self, _baked_path: &Utf8Path, _live_path: &Utf8Path, _bytes: u64) {
        self.record(HealthEvent::FallbackInstalled);
    }

    fn handler_banner(&self, handler: &ResolvedHandler) {
        self.record(HealthEvent::Banner(handler.first_line().map(str::to_owned)));
    }

    fn banner_unreadable(&self, _path: &Utf8Path, _error: &io::Error) {
        self.record(HealthEvent::BannerUnreadable);
    }

    fn handoff_starting(&self, _request: &HandoffRequest<'_>) {
        self.record(HealthEvent::HandoffStarting);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.kind().to_owned()));
    }
}
