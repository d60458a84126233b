//! # metafile-inspect
//!
//! Command-line front end for the `metafile` library.
//!
//! ## Usage
//!
//! ```bash
//! # Resolve every fact of a meta file
//! metafile-inspect info run_meta.h5
//!
//! # Which detector family wrote it?
//! metafile-inspect classify run_meta.h5
//!
//! # Find where a fact lives
//! metafile-inspect tree run_meta.h5 --grep pixel
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
