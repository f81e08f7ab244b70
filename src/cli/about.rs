//! `trove about` command
//!
//! Everything known about one entity, ranked by trust and relevance.
//!
//! # Usage
//! ```bash
//! trove about billing
//! trove about shaun --limit 5 --format table
//! ```

use anyhow::Result;
use clap::Args;

use super::recall::{print_pretty, print_table};
use super::utils::{open_storage, print_json, OutputFormat};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct AboutArgs {
    /// Entity identifier
    pub entity: String,

    /// Maximum results
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Output format
    #[arg(long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,
}

pub fn run(args: AboutArgs, config: &Config) -> Result<()> {
    let storage = open_storage(config)?;
    let results = config
        .recall_engine()
        .entity_recall(&storage, args.entity.trim(), args.limit)?;

    match args.format {
        OutputFormat::Json => print_json(&results)?,
        OutputFormat::Table => print_table(&results),
        OutputFormat::Pretty => print_pretty(&results),
    }
    Ok(())
}
