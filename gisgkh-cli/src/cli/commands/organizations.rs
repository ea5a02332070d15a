//! Organization lookups.

use anyhow::Result;

use crate::api::GisGkhClient;

pub fn search(client: &GisGkhClient, inn: u64) -> Result<()> {
    print_json(&client.organizations(inn)?)
}

pub fn by_guid(client: &GisGkhClient, guid: &str) -> Result<()> {
    print_json(&client.organization(guid)?)
}

pub(super) fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
