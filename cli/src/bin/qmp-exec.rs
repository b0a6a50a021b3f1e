use std::io;
use std::process::ExitCode;

use clap::Parser;
use qmpctl_cli::exec::{self, ExecCli};

fn main() -> ExitCode {
    env_logger::init();

    let cli = ExecCli::parse();
    let stdout = io::stdout();
    qmpctl_cli::exit_status(exec::run(&cli, &mut stdout.lock()))
}
