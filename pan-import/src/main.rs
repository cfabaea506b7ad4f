use anyhow::Result;
use clap::Parser;

mod cli;
mod interfaces_cmd;
mod policies_cmd;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Interfaces(args) => interfaces_cmd::run(args),
        Command::Policies(args) => policies_cmd::run(args),
    }
}
