//! Hands control from the bootstrap to the handler interpreter.

mod errors;
mod executor;
mod replace;
mod supervise;

pub use errors::ExecError;
pub use executor::{HandoffExit, HandoffRequest, ProcessExecutor, SystemExecutor};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
