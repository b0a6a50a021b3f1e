//! `qmp-query`: run `query-chardev` or `cont`.

use std::io::Write;
use std::str::FromStr;

use clap::Parser;
use qmpctl::{ChardevMap, Endpoint, Error, Qmp, Request, Result};

use crate::{connect_options, echo};

/// Commands this front end knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryCommand {
    /// Resolve character device labels to host paths.
    QueryChardev,
    /// Resume the guest.
    Cont,
}

impl QueryCommand {
    pub fn name(self) -> &'static str {
        match self {
            QueryCommand::QueryChardev => "query-chardev",
            QueryCommand::Cont => "cont",
        }
    }
}

impl FromStr for QueryCommand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "query-chardev" => Ok(QueryCommand::QueryChardev),
            "cont" => Ok(QueryCommand::Cont),
            _ => Err(Error::UnsupportedCommand { command: s.into() }),
        }
    }
}

/// Execute a QMP command over the monitor's Telnet server.
#[derive(Parser, Debug, Clone)]
#[command(name = "qmp-query", version)]
pub struct QueryCli {
    /// QMP Telnet server hostname
    #[arg(value_name = "HOST")]
    pub host: String,
    /// QMP Telnet server port
    #[arg(value_name = "PORT")]
    pub port: u16,
    /// Command to execute: `query-chardev` or `cont`
    #[arg(value_name = "CMD")]
    pub cmd: String,
    /// Character device labels to resolve (ignored by `cont`)
    #[arg(value_name = "LABEL")]
    pub labels: Vec<String>,
    /// Do not print any diagnostic information, only the output
    #[arg(long, short)]
    pub quiet: bool,
    /// Give up on a silent peer after this many seconds (default: wait forever)
    #[arg(long, env = "QMPCTL_TIMEOUT", value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

impl QueryCli {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::tcp(self.host.clone(), self.port)
    }
}

/// Runs one session, writing the echo (unless quiet) and any resolved paths
/// to `out`.
///
/// The command is checked before connecting, so an unsupported one never
/// touches the network.
pub fn run<W: Write>(cli: &QueryCli, out: &mut W) -> Result<()> {
    let command: QueryCommand = cli.cmd.parse()?;

    let mut qmp = Qmp::open(&cli.endpoint(), &connect_options(cli.timeout))?;
    let reply = qmp.send_command(&Request::simple(command.name()), echo(cli.quiet, out))?;

    match command {
        QueryCommand::QueryChardev => {
            let chardevs = ChardevMap::from_reply(&reply)?;
            let paths = chardevs.host_paths(&cli.labels)?;
            if !paths.is_empty() {
                writeln!(out, "{}", paths.join(" "))?;
            }
        },
        QueryCommand::Cont => (),
    }

    Ok(())
}
