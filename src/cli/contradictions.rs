//! `trove contradictions` command
//!
//! Scans memory for pairs of facts about the same entity that negate each
//! other. Flagged facts get their conflict count raised; trust is unchanged.
//! Pairs are recorded, so each is reported and counted once.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::utils::{display_id, open_storage, print_json, OutputFormat};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct ContradictionsArgs {
    /// Maximum pairs to flag
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Output format
    #[arg(long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,
}

pub fn run(args: ContradictionsArgs, config: &Config) -> Result<()> {
    let storage = open_storage(config)?;
    let pairs = config.detector().find_contradictions(&storage, args.limit)?;

    if args.format == OutputFormat::Json {
        return print_json(&pairs);
    }

    if pairs.is_empty() {
        println!("✨ No new contradictions found.");
        return Ok(());
    }

    println!("⚠️  {} new contradiction(s):\n", pairs.len());
    for (i, pair) in pairs.iter().enumerate() {
        println!("{}. {}", i + 1, pair.reason.yellow());
        for fact in [&pair.fact_a, &pair.fact_b] {
            println!(
                "   {} [{:.2}] {}",
                display_id(fact).cyan(),
                fact.trust.score,
                fact.content
            );
        }
        println!();
    }
    Ok(())
}
