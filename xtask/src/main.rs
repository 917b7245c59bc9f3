// Desktop/tooling crate — unwrap/expect/panic acceptable in non-embedded code.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod check;
mod doc;
mod test;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "RX888-class USB-3 SDR front-end firmware development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that every crate builds, both for host-side development (`std`)
    /// and for the `hardware` feature set that the firmware image ships with.
    Check,
    /// Run unit, integration, and doc tests across the workspace.
    Test {
        /// Run only unit tests (`cargo test --lib`)
        #[arg(long)]
        unit: bool,
        /// Run only the firmware crate's integration scenario tests
        #[arg(long)]
        integration: bool,
    },
    /// Build workspace documentation.
    Doc {
        /// Open documentation in browser
        #[arg(long)]
        open: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => check::run(),
        Commands::Test { unit, integration } => test::run(unit, integration),
        Commands::Doc { open } => doc::run(open),
    }
}
