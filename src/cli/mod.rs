use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod classify;
mod config;
mod info;
mod tree;

pub use config::Config;

/// metafile - Inspect X-ray detector meta files
#[derive(Parser)]
#[command(name = "metafile-inspect")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Vendor selection for the info command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorArg {
    /// Detect the vendor from the file contents
    #[default]
    Auto,
    /// Trigger-based area detector
    Trigger,
    /// Event-driven timing detector
    Event,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every known fact and print it as JSON
    Info {
        /// Meta file (.h5/.nxs with the hdf5 feature, or a .json dump)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Force a vendor instead of detecting it
        #[arg(long, value_enum)]
        vendor: Option<VendorArg>,

        /// Print compact JSON
        #[arg(long)]
        compact: bool,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Print the detected detector vendor
    Classify {
        /// Meta file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// List every node path in the file
    Tree {
        /// Meta file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Only list paths containing this substring
        #[arg(long, value_name = "SUBSTR")]
        grep: Option<String>,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Info {
            file,
            vendor,
            compact,
            config,
        } => info::run(file, vendor, compact, config),
        Commands::Classify { file } => classify::run(file),
        Commands::Tree { file, grep } => tree::run(file, grep),
    }
}
