//! The two command-line front ends.
//!
//! [`query`] accepts only the commands it knows how to post-process;
//! [`exec`] accepts any command plus `key=value` arguments and prints the
//! reply as-is. Both share the session logic in [`qmpctl`] and write all
//! caller-visible output to the writer they are given.

use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use log::debug;
use qmpctl::ConnectOptions;

pub mod exec;
pub mod query;

/// Socket options from the `--timeout` flag, in whole seconds.
pub(crate) fn connect_options(timeout: Option<u64>) -> ConnectOptions {
    ConnectOptions::with_timeout(timeout.map(Duration::from_secs))
}

/// The echo sink for a session: `out`, unless quiet.
pub(crate) fn echo<W: Write>(quiet: bool, out: &mut W) -> Option<&mut dyn Write> {
    if quiet {
        None
    } else {
        Some(out as &mut dyn Write)
    }
}

/// Reports `result` on stderr and converts it to the process exit status.
pub fn exit_status(result: qmpctl::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("{:?} failure: {:?}", e.kind(), e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        },
    }
}
