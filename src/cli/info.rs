use anyhow::{anyhow, Context, Result};
use log::info;
use std::path::PathBuf;

use metafile::metadata::ExperimentMetadata;
use metafile::resolver::Vendor;

use super::{Config, VendorArg};

/// Resolve every fact of a meta file and print it as JSON
pub fn run(
    file: PathBuf,
    vendor: Option<VendorArg>,
    compact: bool,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = match config {
        Some(path) => Config::from_file(&path)?,
        None => Config::default(),
    };
    let vendor_arg = vendor.or(config.inspect.vendor).unwrap_or_default();
    let pretty = !compact && config.inspect.pretty.unwrap_or(true);

    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let container = metafile::container::open(&file)
        .with_context(|| format!("Failed to open {}", file.display()))?;

    let vendor = match vendor_arg {
        VendorArg::Auto => Vendor::detect(container.as_ref())?,
        VendorArg::Trigger => Vendor::TriggerDetector,
        VendorArg::Event => Vendor::EventDetector,
    };
    info!("Vendor: {}", vendor);

    let resolver = vendor
        .resolver(container.as_ref())
        .ok_or_else(|| anyhow!("No vendor marker found in {}; use --vendor", file.display()))?;

    let metadata = ExperimentMetadata::from_resolver(&file.display().to_string(), resolver.as_ref())
        .context("Failed to resolve metadata")?;
    info!("Resolved metadata from {}", resolver.base());

    let json = if pretty {
        metadata.to_json_pretty()?
    } else {
        metadata.to_json()?
    };
    println!("{}", json);

    Ok(())
}
