//! Vendorwatch CLI — competitive intelligence runs from the terminal.
//!
//! Manages the vendor registry, triggers intelligence runs, and browses
//! the persisted report history.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
