use std::io;
use std::process::ExitCode;

use clap::Parser;
use qmpctl_cli::query::{self, QueryCli};

fn main() -> ExitCode {
    env_logger::init();

    let cli = QueryCli::parse();
    let stdout = io::stdout();
    qmpctl_cli::exit_status(query::run(&cli, &mut stdout.lock()))
}
