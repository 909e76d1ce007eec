//! Executor double that records handoffs instead of running the interpreter.

use std::fs;
use std::sync::{Arc, Mutex};

use camino::Utf8PathBuf;

use crate::fallback::HandlerSource;
use crate::process::{ExecError, HandoffExit, HandoffRequest, ProcessExecutor};

/// Snapshot of the live handler taken at handoff time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedHandoff {
    /// Interpreter that would have been launched.
    pub interpreter: Utf8PathBuf,
    /// Handler path passed to the interpreter.
    pub handler: Utf8PathBuf,
    /// Origin of the handler.
    pub source: HandlerSource,
    /// Bytes at the handler path.
    pub contents: Vec<u8>,
    /// Whether the handler carried execute permission.
    pub executable: bool,
}

/// Records each handoff and returns a fixed result.
#[derive(Debug, Clone)]
pub struct RecordingExecutor {
    handoffs: Arc<Mutex<Vec<RecordedHandoff>>>,
    missing_interpreter: bool,
}

impl Default for RecordingExecutor {
    fn default() -> Self {
        Self {
            handoffs: Arc::new(Mutex::new(Vec::new())),
            missing_interpreter: false,
        }
    }
}

impl RecordingExecutor {
    /// Executor that reports the interpreter as missing.
    #[must_use]
    pub fn missing_interpreter() -> Self {
        Self {
            missing_interpreter: true,
            ..Self::default()
        }
    }

    /// Handoffs received so far.
    #[must_use]
    pub fn handoffs(&self) -> Vec<RecordedHandoff> {
        self.handoffs.lock().expect("executor mutex poisoned").clone()
    }
}

impl ProcessExecutor for RecordingExecutor {
    fn hand_off(&self, request: &HandoffRequest<'_>) -> Result<HandoffExit, ExecError> {
        if self.missing_interpreter {
            return Err(ExecError::InterpreterMissing {
                path: request.interpreter().to_path_buf(),
            });
        }
        let path = request.handler().path();
        let contents = fs::read(path).expect("handler readable at handoff");
        let executable = is_executable(&fs::metadata(path).expect("handler metadata"));
        self.handoffs
            .lock()
            .expect("executor mutex poisoned")
            .push(RecordedHandoff {
                interpreter: request.interpreter().to_path_buf(),
                handler: path.to_path_buf(),
                source: request.handler().source(),
                contents,
                executable,
            });
        Ok(HandoffExit::new(0))
    }
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(metadata: &fs::Metadata) -> bool {
    metadata.is_file()
}
