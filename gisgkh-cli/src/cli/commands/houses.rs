//! House and house-management lookups.

use anyhow::Result;
use clap::Args;

use super::organizations::print_json;
use crate::api::GisGkhClient;

#[derive(Args)]
pub struct HousesArgs {
    /// State-services house code
    pub house_code: String,

    /// Return houses that are no longer actual
    #[arg(long)]
    pub inactive: bool,
}

pub fn houses(client: &GisGkhClient, args: HousesArgs) -> Result<()> {
    let body = if args.inactive {
        client.not_active_houses(&args.house_code)?
    } else {
        client.active_houses(&args.house_code)?
    };
    print_json(&body)
}

#[derive(Args)]
pub struct HomeManagementsArgs {
    /// Organization GUID
    pub org_guid: String,

    /// Elements per page
    #[arg(long, default_value_t = 1)]
    pub per_page: u32,
}

pub fn home_managements(client: &GisGkhClient, args: HomeManagementsArgs) -> Result<()> {
    for page in client.home_managements(&args.org_guid, args.per_page) {
        print_json(&page?)?;
    }
    Ok(())
}

pub fn home_management(client: &GisGkhClient, guid: &str) -> Result<()> {
    print_json(&client.home_management(guid)?)
}
