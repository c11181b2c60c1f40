use anyhow::Result;
use clap::Parser;

mod args;

use args::{Cli, Commands};
use cli::commands::{check, disassemble, run};
use cli::logging::init_logging;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Run { path, config, json } => run::run_file(path, config.as_deref(), *json),
        Commands::Disassemble { path } => disassemble::disassemble_file(path),
        Commands::Check { path } => check::check_file(path),
    }
}
