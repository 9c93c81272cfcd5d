//! Binary crate for the `delivery-fee` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Logging setup
//! - Wiring the feed importer, observation store and fee service together

use clap::Parser;

mod cli;
mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    cmd.run().await
}
