//! `trove sweep` command
//!
//! Recomputes relevance for every fact from its idle time and use count.
//! Run it periodically (e.g. from cron); it never raises relevance.

use anyhow::Result;
use chrono::Utc;
use clap::Args;

use super::utils::{open_storage, print_json, OutputFormat};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,
}

pub fn run(args: SweepArgs, config: &Config) -> Result<()> {
    let storage = open_storage(config)?;
    let report = config.decay_engine().sweep(&storage, Utc::now())?;

    if args.format == OutputFormat::Json {
        return print_json(&report);
    }

    println!("🍂 Decay sweep complete");
    println!("   Updated:   {}", report.updated_count);
    println!(
        "   Archived:  {} (relevance below {:.2})",
        report.archived_count, config.decay.archive_threshold
    );
    if report.protected_repaired > 0 {
        println!("   Repaired:  {} protected fact(s)", report.protected_repaired);
    }
    Ok(())
}
