//! `trove verify` command
//!
//! Looks for other facts supporting a fact and raises its trust by a small
//! step per supporter not seen by an earlier confirmation.

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use colored::Colorize;

use super::utils::{open_storage, print_json, OutputFormat};
use crate::config::Config;
use crate::core::error::MemoryError;
use crate::core::storage::parse_fact_id;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// ID of the fact
    pub target: String,

    /// Output format
    #[arg(long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,
}

pub fn run(args: VerifyArgs, config: &Config) -> Result<()> {
    let storage = open_storage(config)?;
    let id = parse_fact_id(&args.target)?;

    let Some(outcome) = config.detector().verify(&storage, &id, Utc::now())? else {
        return Err(MemoryError::NotFound(format!("fact {}", args.target)).into());
    };

    if args.format == OutputFormat::Json {
        return print_json(&outcome);
    }

    if outcome.verified {
        if outcome.new_support > 0 {
            println!(
                "{} by {} supporting fact(s), {} new; trust now {:.2}",
                "✅ Verified".green(),
                outcome.evidence.len(),
                outcome.new_support,
                outcome.new_score
            );
        } else {
            println!(
                "{} by {} supporting fact(s), none new; trust stays {:.2}",
                "✅ Verified".green(),
                outcome.evidence.len(),
                outcome.new_score
            );
        }
        for line in &outcome.evidence {
            println!("   • {}", line);
        }
    } else {
        println!(
            "{} no supporting facts; trust stays {:.2}",
            "❔ Unverified:".yellow(),
            outcome.new_score
        );
    }
    Ok(())
}
