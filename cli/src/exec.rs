//! `qmp-exec`: run any command with `key=value` arguments.

use std::io::Write;

use clap::Parser;
use qmpctl::{Arguments, Endpoint, Qmp, Request, Result};

use crate::{connect_options, echo};

/// Execute a QMP command with arguments over the monitor's Telnet server.
///
/// Each argument is `key=value`, where value is JSON text (quote strings:
/// `id='"disk0"'`) or a `0x` hex literal, which is sent in decimal.
#[derive(Parser, Debug, Clone)]
#[command(name = "qmp-exec", version)]
pub struct ExecCli {
    /// QMP Telnet server hostname
    #[arg(value_name = "HOST")]
    pub host: String,
    /// QMP Telnet server port
    #[arg(value_name = "PORT")]
    pub port: u16,
    /// Command to execute
    #[arg(value_name = "CMD")]
    pub cmd: String,
    /// Arguments to the command
    #[arg(value_name = "KEY=VALUE")]
    pub args: Vec<String>,
    /// Do not print any diagnostic information, only the output
    #[arg(long, short)]
    pub quiet: bool,
    /// Reject argument values that are not valid JSON before connecting
    #[arg(long)]
    pub strict: bool,
    /// Give up on a silent peer after this many seconds (default: wait forever)
    #[arg(long, env = "QMPCTL_TIMEOUT", value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

impl ExecCli {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::tcp(self.host.clone(), self.port)
    }

    /// Parses the `key=value` tokens. Runs before any network I/O.
    pub fn arguments(&self) -> Result<Arguments> {
        let arguments = if self.strict {
            Arguments::parse_strict(&self.args)?
        } else {
            Arguments::parse(&self.args)?
        };
        Ok(arguments)
    }
}

/// Runs one session, echoing the request and the raw reply to `out` unless
/// quiet. There is no other output.
pub fn run<W: Write>(cli: &ExecCli, out: &mut W) -> Result<()> {
    let request = Request::with_arguments(cli.cmd.clone(), cli.arguments()?);

    let mut qmp = Qmp::open(&cli.endpoint(), &connect_options(cli.timeout))?;
    qmp.send_command(&request, echo(cli.quiet, out))?;

    Ok(())
}
