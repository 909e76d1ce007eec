//! Entry point for the `handoff` worker bootstrap binary.

use std::process::ExitCode;

fn main() -> ExitCode {
    handoff::run()
}
