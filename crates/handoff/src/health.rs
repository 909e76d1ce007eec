//! Structured health reporting for bootstrap lifecycle events.

use std::io;
use std::time::Duration;

use camino::Utf8Path;

use handoff_config::BootstrapConfig;

use crate::bootstrap::BootstrapError;
use crate::fallback::{BootState, ResolvedHandler};
use crate::fetch::{FetchError, ObjectLocation};
use crate::process::HandoffRequest;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked once telemetry is available, before any stage runs.
    fn bootstrap_starting(&self);

    /// Invoked after configuration has been validated.
    fn config_resolved(&self, config: &BootstrapConfig);

    /// Invoked before the single fetch attempt.
    fn fetch_starting(&self, location: &ObjectLocation, backend: &str, timeout: Duration);

    /// Invoked when the artifact has been installed at the live path.
    fn fetch_succeeded(&self, location: &ObjectLocation, live_path: &Utf8Path, bytes: u64);

    /// Invoked when the fetch attempt failed.
    fn fetch_failed(&self, location: &ObjectLocation, error: &FetchError);

    /// Invoked on every state machine transition.
    fn state_changed(&self, from: BootState, to: BootState);

    /// Invoked when the baked handler has been copied over the live path.
    fn fallback_installed(&self, baked_path: &Utf8Path, live_path: &Utf8Path, bytes: u64);

    /// Invoked exactly once with the resolved handler's audit banner.
    fn handler_banner(&self, handler: &ResolvedHandler);

    /// Invoked when the banner could not be read. Never fatal.
    fn banner_unreadable(&self, path: &Utf8Path, error: &io::Error);

    /// Invoked immediately before control passes to the interpreter.
    fn handoff_starting(&self, request: &HandoffRequest<'_>);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting handler bootstrap"
        );
    }

    fn config_resolved(&self, config: &BootstrapConfig) {
        let credentials = config.credentials();
        tracing::info!(
            target: HEALTH_TARGET,
            event = "config_resolved",
            image_version = config.image_version(),
            region = config.region(),
            bucket = config.bucket(),
            key = config.artifact_key(),
            store = %config.store(),
            live_path = %config.live_path(),
            baked_path = %config.baked_path(),
            interpreter = %config.interpreter_path(),
            fetch_timeout_secs = config.fetch_timeout().as_secs(),
            launch_mode = %config.launch_mode(),
            aws_access_key_present = credentials.access_key_id,
            aws_secret_key_present = credentials.secret_access_key,
            "bootstrap configuration resolved"
        );
    }

    fn fetch_starting(&self, location: &ObjectLocation, backend: &str, timeout: Duration) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "fetch_starting",
            location = %location,
            region = location.region(),
            backend,
            timeout_secs = timeout.as_secs(),
            "fetching handler artifact"
        );
    }

    fn fetch_succeeded(&self, location: &ObjectLocation, live_path: &Utf8Path, bytes: u64) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "fetch_succeeded",
            location = %location,
            live_path = %live_path,
            bytes,
            "handler artifact installed"
        );
    }

    fn fetch_failed(&self, location: &ObjectLocation, error: &FetchError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "fetch_failed",
            location = %location,
            reason = error.kind(),
            error = %error,
            "handler artifact fetch failed"
        );
    }

    fn state_changed(&self, from: BootState, to: BootState) {
        tracing::debug!(
            target: HEALTH_TARGET,
            event = "state_changed",
            from = %from,
            to = %to,
            "bootstrap state transition"
        );
    }

    fn fallback_installed(&self, baked_path: &Utf8Path, live_path: &Utf8Path, bytes: u64) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "fallback_installed",
            baked_path = %baked_path,
            live_path = %live_path,
            bytes,
            "remote handler unavailable, using baked handler"
        );
    }

    fn handler_banner(&self, handler: &ResolvedHandler) {
        handler.first_line().map_or_else(
            || {
                tracing::info!(
                    target: HEALTH_TARGET,
                    event = "handler_banner",
                    source = %handler.source(),
                    path = %handler.path(),
                    first_line_available = false,
                    "resolved handler"
                );
            },
            |first_line| {
                tracing::info!(
                    target: HEALTH_TARGET,
                    event = "handler_banner",
                    source = %handler.source(),
                    path = %handler.path(),
                    first_line,
                    "resolved handler"
                );
            },
        );
    }

    fn banner_unreadable(&self, path: &Utf8Path, error: &io::Error) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "banner_unreadable",
            path = %path,
            error = %error,
            "could not read handler banner"
        );
    }

    fn handoff_starting(&self, request: &HandoffRequest<'_>) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "handoff_starting",
            interpreter = %request.interpreter(),
            handler = %request.handler().path(),
            source = %request.handler().source(),
            mode = %request.mode(),
            args = request.args().len(),
            "handing off to handler"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            kind = error.kind(),
            error = %error,
            "handler bootstrap failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;
    use crate::fallback::HandlerSource;
    use crate::tests::support::capture_logs;

    fn banner_output(first_line: Option<&str>) -> String {
        let handler = ResolvedHandler::new(
            Utf8PathBuf::from("/workspace/rp_handler.py"),
            HandlerSource::Baked,
            first_line.map(str::to_owned),
        );
        let ((), output) =
            capture_logs(|| StructuredHealthReporter::new().handler_banner(&handler));
        output
    }

    #[test]
    fn banner_line_carries_the_first_line() {
        let output = banner_output(Some("VERSION 6-BAKED"));

        assert!(output.contains("first_line=\"VERSION 6-BAKED\""), "{output}");
        assert!(!output.contains("first_line_available"), "{output}");
    }

    #[test]
    fn missing_banner_is_not_logged_as_empty() {
        let output = banner_output(None);

        assert!(output.contains("first_line_available=false"), "{output}");
        assert!(!output.contains("first_line=\"\""), "{output}");
        assert_eq!(output.lines().count(), 1, "{output}");
    }
}
