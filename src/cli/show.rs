//! `trove show` command
//!
//! Shows a fact by ID, with its trust trail and decay state.
//!
//! # Usage
//! ```bash
//! trove show trove-01HQ3K2JN5...
//! trove show 01HQ3K2JN5... --format json
//! ```

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use serde_json::json;

use super::utils::{display_id, find_fact, format_score, open_storage, print_json, OutputFormat};
use crate::config::Config;
use crate::core::decay::DecayTier;
use crate::core::fact::Fact;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// ID of the fact
    pub target: String,

    /// Output format
    #[arg(long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,
}

pub fn run(args: ShowArgs, config: &Config) -> Result<()> {
    let storage = open_storage(config)?;
    let fact = find_fact(&storage, &args.target)?;
    let engine = config.decay_engine();
    let now = Utc::now();
    let tier = engine.decay_tier(&fact, now);
    // What the next sweep would store
    let projected = engine.next_relevance(&fact, now);

    match args.format {
        OutputFormat::Json => print_json(&json!({
            "fact": fact,
            "tier": tier,
            "projected_relevance": projected,
        })),
        _ => {
            print_pretty(&fact, tier, projected, config.decay.archive_threshold);
            Ok(())
        }
    }
}

fn print_pretty(fact: &Fact, tier: DecayTier, projected: f64, archive_threshold: f64) {
    let rule = "─".repeat(50);
    println!("\n{}", rule);
    println!("📄 {}", display_id(fact).bold());
    println!("{}", rule);
    println!("Category:  {}", fact.category);
    println!(
        "Learned:   {}{}{} at {}",
        fact.provenance.kind,
        fact.provenance
            .actor
            .as_deref()
            .map(|a| format!(" from {}", a))
            .unwrap_or_default(),
        fact.provenance
            .context
            .as_deref()
            .map(|c| format!(" ({})", c))
            .unwrap_or_default(),
        fact.provenance.learned_at.format("%Y-%m-%d %H:%M")
    );
    println!("Trust:     {}", format_score(fact.trust.score));
    println!(
        "Support:   {} corroborating, {} conflicting",
        fact.trust.support_count, fact.trust.conflict_count
    );
    if let Some(confirmed) = fact.trust.last_confirmed {
        println!("Confirmed: {}", confirmed.format("%Y-%m-%d %H:%M"));
    }

    let state = if fact.protected {
        "protected".cyan().to_string()
    } else if fact.is_archived(archive_threshold) {
        "archived".red().to_string()
    } else {
        tier.to_string()
    };
    println!("Relevance: {} [{}]", format_score(fact.relevance), state);
    if (projected - fact.relevance).abs() > 0.005 {
        println!("           {:.2} after the next sweep", projected);
    }
    println!(
        "Used:      {} time(s), last {}",
        fact.lifecycle.use_count,
        fact.lifecycle.last_used_at.format("%Y-%m-%d %H:%M")
    );
    if !fact.links.is_empty() {
        let links: Vec<&str> = fact.links.iter().map(String::as_str).collect();
        println!("Links:     {}", links.join(", "));
    }
    println!();
    println!("{}", fact.content);
    println!();
    println!("{}", "Trust trail:".dimmed());
    for entry in &fact.trust.rationale {
        println!("  • {}", entry.dimmed());
    }
    println!("{}", rule);
}
