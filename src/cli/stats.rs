//! Stats command - Show database statistics

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::utils::open_storage;
use crate::config::Config;
use crate::core::decay::DecayTier;
use crate::core::store::FactStore;

/// Stats command arguments
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Facts")]
    count: usize,
}

/// Execute stats command
pub fn execute(args: StatsArgs, config: &Config) -> Result<()> {
    let db_path = config.data_dir();
    let storage = open_storage(config)?;

    let stats = storage.stats(config.decay.archive_threshold)?;

    let engine = config.decay_engine();
    let now = Utc::now();
    let mut by_tier: BTreeMap<DecayTier, usize> = BTreeMap::new();
    for fact in storage.all_facts(None)? {
        *by_tier.entry(engine.decay_tier(&fact, now)).or_default() += 1;
    }

    if args.json {
        let tiers: BTreeMap<String, usize> =
            by_tier.iter().map(|(t, n)| (t.to_string(), *n)).collect();
        let json = json!({
            "stats": stats,
            "by_tier": tiers,
            "database": db_path,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    println!("📊 Memory Statistics\n");
    println!("  Total facts:      {}", stats.total_facts);
    println!("  ├── Protected:    {}", stats.protected_facts);
    println!("  ├── Archived:     {}", stats.archived_facts);
    println!("  ├── Contested:    {}", stats.contested_facts);
    println!("  └── Embedded:     {}", stats.embedded_facts);

    let rows: Vec<CountRow> = stats
        .by_category
        .iter()
        .map(|(k, n)| ("category", k.clone(), *n))
        .chain(stats.by_kind.iter().map(|(k, n)| ("provenance", k.clone(), *n)))
        .chain(by_tier.iter().map(|(t, n)| ("tier", t.to_string(), *n)))
        .map(|(group, value, count)| CountRow {
            group: group.to_string(),
            value,
            count,
        })
        .collect();

    if !rows.is_empty() {
        println!("\n{}", Table::new(rows).with(Style::rounded()));
    }

    println!("\n📁 Database: {}", db_path.display());

    Ok(())
}
