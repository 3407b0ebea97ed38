//! ## lyssna-cli
//! **Command-line frontend for the packet delivery pipeline**
//!
//! Listens on a host address and prints every delivered batch until Ctrl-C,
//! and answers the host queries (hostname, interface addresses).

use clap::Parser;

mod commands;
mod console;

use commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::run_command(cli).await
}
