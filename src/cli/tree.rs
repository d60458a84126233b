use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use metafile::resolver::MetadataResolver;

/// List the node paths of a meta file
pub fn run(file: PathBuf, grep: Option<String>) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let container = metafile::container::open(&file)
        .with_context(|| format!("Failed to open {}", file.display()))?;
    let resolver = MetadataResolver::new(container.as_ref());

    let paths: Vec<&str> = match grep.as_deref() {
        Some(needle) => resolver.find_all_paths_containing(needle)?,
        None => resolver.paths()?.iter().map(String::as_str).collect(),
    };
    info!("{} of {} nodes listed", paths.len(), resolver.paths()?.len());

    for path in paths {
        println!("{}", path);
    }

    Ok(())
}
