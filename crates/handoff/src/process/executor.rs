use std::ffi::OsString;
use std::process::{Command, ExitCode, ExitStatus};

use camino::Utf8Path;

use handoff_config::{BootstrapConfig, LaunchMode};

use super::ExecError;
use super::{replace, supervise};
use crate::fallback::ResolvedHandler;

/// Everything needed to start the handler.
#[derive(Debug, Clone, Copy)]
pub struct HandoffRequest<'a> {
    interpreter: &'a Utf8Path,
    handler: &'a ResolvedHandler,
    args: &'a [OsString],
    mode: LaunchMode,
}

impl<'a> HandoffRequest<'a> {
    /// Builds a request for `handler` using the configured interpreter,
    /// arguments and launch mode.
    #[must_use]
    pub fn new(config: &'a BootstrapConfig, handler: &'a ResolvedHandler) -> Self {
        Self {
            interpreter: config.interpreter_path(),
            handler,
            args: config.handler_args(),
            mode: config.launch_mode(),
        }
    }

    /// Interpreter that will run the handler.
    #[must_use]
    pub const fn interpreter(&self) -> &'a Utf8Path {
        self.interpreter
    }

    /// Handler being launched.
    #[must_use]
    pub const fn handler(&self) -> &'a ResolvedHandler {
        self.handler
    }

    /// Arguments appended after the handler path.
    #[must_use]
    pub const fn args(&self) -> &'a [OsString] {
        self.args
    }

    /// Handoff strategy.
    #[must_use]
    pub const fn mode(&self) -> LaunchMode {
        self.mode
    }

    /// `<interpreter> <handler> [args...]`, inheriting environment and
    /// standard streams.
    #[must_use]
    pub fn command(&self) -> Command {
        let mut command = Command::new(self.interpreter.as_std_path());
        command.arg(self.handler.path().as_std_path()).args(self.args);
        command
    }
}

/// Exit status propagated from a supervised handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandoffExit {
    code: u8,
}

impl HandoffExit {
    /// Wraps a raw exit code.
    #[must_use]
    pub const fn new(code: u8) -> Self {
        Self { code }
    }

    /// Maps a child's status to the code the bootstrap should exit with.
    ///
    /// A child killed by signal `N` maps to `128 + N`.
    #[must_use]
    pub fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self::new(u8::try_from(code).unwrap_or(u8::MAX));
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self::new(u8::try_from(128 + signal).unwrap_or(u8::MAX));
            }
        }
        Self::new(1)
    }

    /// Exit code value.
    #[must_use]
    pub const fn code(self) -> u8 {
        self.code
    }
}

impl From<HandoffExit> for ExitCode {
    fn from(exit: HandoffExit) -> Self {
        Self::from(exit.code)
    }
}

/// Hands control to the interpreter.
pub trait ProcessExecutor: Send + Sync {
    /// Starts the handler described by `request`.
    ///
    /// In replace mode a successful call never returns. In supervise mode it
    /// returns once the handler exits.
    fn hand_off(&self, request: &HandoffRequest<'_>) -> Result<HandoffExit, ExecError>;
}

/// Executor backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl ProcessExecutor for SystemExecutor {
    fn hand_off(&self, request: &HandoffRequest<'_>) -> Result<HandoffExit, ExecError> {
        if !request.interpreter().is_file() {
            return Err(ExecError::InterpreterMissing {
                path: request.interpreter().to_path_buf(),
            });
        }
        match request.mode() {
            LaunchMode::Replace => replace::exec(request),
            LaunchMode::Supervise => supervise::run(request),
        }
    }
}
