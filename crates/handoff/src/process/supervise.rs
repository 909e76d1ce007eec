//! Runs the interpreter as a supervised child.
//!
//! The bootstrap stays alive as a thin parent: termination and user signals
//! it receives are relayed to the child one for one, and the child's exit
//! status becomes the bootstrap's own.

use std::process::Child;
use std::sync::Arc;

use tracing::{debug, info};

use super::{ExecError, HandoffExit, HandoffRequest, PROCESS_TARGET};

/// Spawns the interpreter and waits for it to exit.
///
/// Signal handlers are registered before the spawn, so a signal arriving
/// while the child starts is queued and relayed once its pid is known.
pub(super) fn run(request: &HandoffRequest<'_>) -> Result<HandoffExit, ExecError> {
    let pending = forwarding::PendingForwarder::register()?;
    let mut child = request
        .command()
        .spawn()
        .map_err(|source| ExecError::Spawn {
            path: request.interpreter().to_path_buf(),
            source: Arc::new(source),
        })?;
    info!(
        target: PROCESS_TARGET,
        pid = child.id(),
        handler = %request.handler().path(),
        "handler process started"
    );

    let forwarder = match pending.attach(child.id()) {
        Ok(forwarder) => forwarder,
        Err(error) => {
            abandon(&mut child);
            return Err(error);
        }
    };
    let waited = child.wait();
    forwarder.stop();

    let status = waited.map_err(|source| ExecError::Wait {
        source: Arc::new(source),
    })?;
    let exit = HandoffExit::from_status(status);
    info!(
        target: PROCESS_TARGET,
        status = %status,
        code = exit.code(),
        "handler process exited"
    );
    Ok(exit)
}

fn abandon(child: &mut Child) {
    debug!(
        target: PROCESS_TARGET,
        pid = child.id(),
        "stopping handler process"
    );
    drop(child.kill());
    drop(child.wait());
}

#[cfg(unix)]
mod forwarding {
    use std::io;
    use std::sync::Arc;
    use std::thread::{self, JoinHandle};

    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM, SIGUSR1, SIGUSR2};
    use signal_hook::iterator::{Handle, Signals};
    use tracing::{debug, warn};

    use super::super::{ExecError, PROCESS_TARGET};

    /// Signals relayed to the handler.
    pub(super) const FORWARDED_SIGNALS: [i32; 6] =
        [SIGTERM, SIGINT, SIGQUIT, SIGHUP, SIGUSR1, SIGUSR2];

    /// Handlers installed for [`FORWARDED_SIGNALS`], waiting for a child.
    ///
    /// Dropping it unregisters the handlers.
    pub(super) struct PendingForwarder {
        signals: Signals,
    }

    impl PendingForwarder {
        pub(super) fn register() -> Result<Self, ExecError> {
            let signals = Signals::new(FORWARDED_SIGNALS).map_err(|source| {
                ExecError::Signals {
                    source: Arc::new(source),
                }
            })?;
            Ok(Self { signals })
        }

        /// Starts relaying to `child`, including anything queued so far.
        pub(super) fn attach(self, child: u32) -> Result<SignalForwarder, ExecError> {
            let raw_pid = i32::try_from(child).map_err(|error| ExecError::Signals {
                source: Arc::new(io::Error::new(io::ErrorKind::InvalidInput, error)),
            })?;
            let pid = Pid::from_raw(raw_pid);
            let mut signals = self.signals;
            let handle = signals.handle();
            let thread = thread::spawn(move || {
                for raw in signals.forever() {
                    relay(pid, raw);
                }
            });
            Ok(SignalForwarder { handle, thread })
        }
    }

    /// Background thread relaying signals to a child process.
    pub(super) struct SignalForwarder {
        handle: Handle,
        thread: JoinHandle<()>,
    }

    impl SignalForwarder {
        pub(super) fn stop(self) {
            self.handle.close();
            if self.thread.join().is_err() {
                warn!(target: PROCESS_TARGET, "signal forwarding thread panicked");
            }
        }
    }

    /// Sends `raw` on to `pid`, logging rather than failing on errors.
    pub(super) fn relay(pid: Pid, raw: i32) {
        let signal = match Signal::try_from(raw) {
            Ok(signal) => signal,
            Err(errno) => {
                warn!(target: PROCESS_TARGET, signal = raw, %errno, "unrecognised signal");
                return;
            }
        };
        debug!(target: PROCESS_TARGET, signal = %signal, pid = pid.as_raw(), "forwarding signal");
        if let Err(errno) = kill(pid, signal) {
            warn!(
                target: PROCESS_TARGET,
                signal = %signal,
                pid = pid.as_raw(),
                %errno,
                "failed to forward signal"
            );
        }
    }
}

#[cfg(not(unix))]
mod forwarding {
    use super::super::ExecError;

    /// Signal relaying is a no-op where POSIX signals do not exist.
    pub(super) struct PendingForwarder;

    impl PendingForwarder {
        pub(super) const fn register() -> Result<Self, ExecError> {
            Ok(Self)
        }

        pub(super) const fn attach(self, _child: u32) -> Result<SignalForwarder, ExecError> {
            Ok(SignalForwarder)
        }
    }

    pub(super) struct SignalForwarder;

    impl SignalForwarder {
        pub(super) const fn stop(self) {}
    }
}
