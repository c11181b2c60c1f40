use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "upv")]
#[command(about = "upvm CLI", long_about = None)]
pub struct Cli {
    /// Raise log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load, verify and run an executable
    Run {
        /// Path to the executable (.upvb)
        path: String,
        /// TOML file with a [vm] table
        #[arg(short, long)]
        config: Option<String>,
        /// Print the halt report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Disassemble every code object in an executable
    Disassemble {
        /// Path to the executable
        path: String,
    },
    /// Load and verify an executable without running it
    Check {
        /// Path to the executable
        path: String,
    },
}
