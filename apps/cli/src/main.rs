//! castgraph CLI: character portrait scraping and relationship graph rendering.
//!
//! Fetches portraits for every character, merges them onto the relationship
//! table and renders an interactive graph document.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
