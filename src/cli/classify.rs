use anyhow::{Context, Result};
use log::debug;
use std::path::PathBuf;

#[cfg(feature = "colorized_output")]
use console::style;

use metafile::resolver::{EventDetectorResolver, Vendor};

/// Print the detector family a meta file belongs to
pub fn run(file: PathBuf) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let vendor = if EventDetectorResolver::is_this_vendor(&file)? {
        Vendor::EventDetector
    } else {
        debug!("No module members in {}", file.display());
        let container = metafile::container::open(&file)
            .with_context(|| format!("Failed to open {}", file.display()))?;
        Vendor::detect(container.as_ref())?
    };

    #[cfg(feature = "colorized_output")]
    {
        let label = match vendor {
            Vendor::Unknown => style(vendor.to_string()).yellow(),
            _ => style(vendor.to_string()).green(),
        };
        println!("{}: {}", file.display(), label);
    }

    #[cfg(not(feature = "colorized_output"))]
    {
        println!("{}: {}", file.display(), vendor);
    }

    Ok(())
}
