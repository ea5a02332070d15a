//! Command-line interface definitions and dispatch.

pub mod commands;

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::api::{ClientConfig, DEFAULT_BASE_URL, GisGkhClient};

#[derive(Parser)]
#[command(
    name = "gisgkh-cli",
    about = "Client for the GIS ZhKH public housing registry",
    version
)]
pub struct Cli {
    /// Base URL of the portal
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 5)]
    pub timeout: u64,

    /// Reuse connections between requests
    #[arg(long)]
    pub keep_alive: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download regional license registries and export normalized rows as CSV
    Licenses(commands::licenses::LicensesArgs),
    /// Search registered organizations by INN
    Organizations {
        /// Taxpayer identification number
        inn: u64,
    },
    /// Fetch one organization by GUID
    Organization { guid: String },
    /// Look up houses by their state-services house code
    Houses(commands::houses::HousesArgs),
    /// Page through an organization's house-management records
    HomeManagements(commands::houses::HomeManagementsArgs),
    /// Fetch one house-management record by GUID
    HomeManagement { guid: String },
}

pub fn run(cli: Cli) -> Result<()> {
    let config = ClientConfig {
        base_url: cli.base_url,
        timeout: Duration::from_secs(cli.timeout),
        keep_alive: cli.keep_alive,
    };
    let client = GisGkhClient::new(config)?;

    match cli.command {
        Commands::Licenses(args) => commands::licenses::run(&client, args),
        Commands::Organizations { inn } => commands::organizations::search(&client, inn),
        Commands::Organization { guid } => commands::organizations::by_guid(&client, &guid),
        Commands::Houses(args) => commands::houses::houses(&client, args),
        Commands::HomeManagements(args) => commands::houses::home_managements(&client, args),
        Commands::HomeManagement { guid } => commands::houses::home_management(&client, &guid),
    }
}
