//! TOML configuration file support.
//!
//! Defaults for the info command can be kept in a config file:
//!
//! ```toml
//! # metafile.toml
//! [inspect]
//! vendor = "trigger"
//! pretty = false
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use super::VendorArg;

/// Root configuration structure for metafile.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Inspection settings.
    #[serde(default)]
    pub inspect: InspectConfig,
}

/// Configuration for the info command.
#[derive(Debug, Default, Deserialize)]
pub struct InspectConfig {
    /// Vendor to assume instead of detecting it.
    pub vendor: Option<VendorArg>,

    /// Pretty-print the JSON output.
    pub pretty: Option<bool>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}
