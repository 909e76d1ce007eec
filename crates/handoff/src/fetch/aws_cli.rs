//! Blob store backed by the AWS command-line client.
//!
//! Runs `aws s3 cp s3://<bucket>/<key> <destination> --region <region>` and
//! polls the child until it exits or the timeout elapses. A timed-out client
//! is killed and reaped before the error is returned.

use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

use super::{BlobStore, FETCH_TARGET, FetchError, ObjectLocation};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Number of characters of client stderr kept in errors.
pub const STDERR_LIMIT: usize = 500;

/// Fetches objects by shelling out to the AWS CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsCliStore {
    program: OsString,
}

impl AwsCliStore {
    /// Builds a store that invokes `program`.
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Program invoked for each fetch.
    #[must_use]
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    fn command(&self, location: &ObjectLocation, destination: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("s3")
            .arg("cp")
            .arg(location.uri())
            .arg(destination)
            .arg("--region")
            .arg(location.region())
            .arg("--only-show-errors")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        command
    }
}

impl BlobStore for AwsCliStore {
    fn backend(&self) -> &'static str {
        "aws_cli"
    }

    fn fetch(
        &self,
        location: &ObjectLocation,
        destination: &Path,
        timeout: Duration,
    ) -> Result<(), FetchError> {
        let mut child = self
            .command(location, destination)
            .spawn()
            .map_err(|source| FetchError::ToolUnavailable {
                program: self.program.to_string_lossy().into_owned(),
                source: Arc::new(source),
            })?;
        debug!(
            target: FETCH_TARGET,
            pid = child.id(),
            location = %location,
            "blob store client started"
        );

        let stderr_reader = drain_stderr(&mut child);
        // A killed client may leave descendants holding the pipe open, so the
        // reader is only joined after a normal exit.
        let status = wait_with_timeout(&mut child, location, destination, timeout)?;
        let stderr = collect_stderr(stderr_reader);

        if status.success() {
            return Ok(());
        }
        if is_not_found(&stderr) {
            return Err(FetchError::NotFound {
                location: location.to_string(),
            });
        }
        Err(FetchError::CommandFailed {
            location: location.to_string(),
            status: describe_status(status),
            stderr,
        })
    }
}

fn wait_with_timeout(
    child: &mut Child,
    location: &ObjectLocation,
    destination: &Path,
    timeout: Duration,
) -> Result<ExitStatus, FetchError> {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if start.elapsed() >= timeout {
                    debug!(
                        target: FETCH_TARGET,
                        pid = child.id(),
                        timeout_secs = timeout.as_secs(),
                        "killing blob store client"
                    );
                    drop(child.kill());
                    drop(child.wait());
                    return Err(FetchError::Timeout {
                        location: location.to_string(),
                        timeout_secs: timeout.as_secs(),
                    });
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(error) => return Err(FetchError::io(destination, error)),
        }
    }
}

/// Reads stderr on a separate thread so a chatty client cannot block on a
/// full pipe while it is being polled.
fn drain_stderr(child: &mut Child) -> Option<JoinHandle<String>> {
    let mut reader = child.stderr.take()?;
    Some(thread::spawn(move || {
        let mut buffer = Vec::new();
        drop(reader.read_to_end(&mut buffer));
        String::from_utf8_lossy(&buffer).into_owned()
    }))
}

fn collect_stderr(handle: Option<JoinHandle<String>>) -> String {
    let text = handle
        .and_then(|reader| reader.join().ok())
        .unwrap_or_default();
    truncate(text.trim(), STDERR_LIMIT)
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

fn is_not_found(stderr: &str) -> bool {
    stderr.contains("(404)") || stderr.contains("NoSuchKey") || stderr.contains("does not exist")
}

fn describe_status(status: ExitStatus) -> String {
    status
        .code()
        .map_or_else(|| status.to_string(), |code| format!("exit code {code}"))
}
