//! Fetch, normalize and export regional license registries.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::api::GisGkhClient;

#[derive(Args)]
pub struct LicensesArgs {
    /// Region codes to fetch, e.g. "50,77"
    #[arg(long, value_delimiter = ',', required = true)]
    pub regions: Vec<u32>,

    /// Path of the CSV file to write
    #[arg(long)]
    pub output: PathBuf,
}

pub fn run(client: &GisGkhClient, args: LicensesArgs) -> Result<()> {
    let workbooks = client.license_workbooks(&args.regions)?;
    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    let mut total = 0usize;
    for item in workbooks {
        let licenses = item?;
        let region = licenses.region_name().to_string();
        let mut count = 0usize;
        for row in licenses.rows() {
            let row = row.with_context(|| format!("bad license row in the {region} registry"))?;
            writer.serialize(&row)?;
            count += 1;
        }
        log::info!("{region}: {count} license rows");
        total += count;
    }
    writer.flush()?;

    println!("{total} license rows written to {}", args.output.display());
    Ok(())
}
