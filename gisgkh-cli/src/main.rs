//! Command-line client for the GIS ZhKH public housing registry.

mod api;
mod cli;
mod licenses;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    cli::run(cli::Cli::parse())
}
