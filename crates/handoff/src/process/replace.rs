//! Process image replacement.

use super::{ExecError, HandoffExit, HandoffRequest};

/// Replaces the current process image with the interpreter.
///
/// Only returns when `exec` itself fails.
#[cfg(unix)]
pub(super) fn exec(request: &HandoffRequest<'_>) -> Result<HandoffExit, ExecError> {
    use std::os::unix::process::CommandExt;
    use std::sync::Arc;

    let source = request.command().exec();
    Err(ExecError::Replace {
        path: request.interpreter().to_path_buf(),
        source: Arc::new(source),
    })
}

/// Platforms without `exec` keep the bootstrap alive as a supervisor.
#[cfg(not(unix))]
pub(super) fn exec(request: &HandoffRequest<'_>) -> Result<HandoffExit, ExecError> {
    tracing::warn!(
        target: super::PROCESS_TARGET,
        "process image replacement is unsupported on this platform, supervising instead"
    );
    super::supervise::run(request)
}
