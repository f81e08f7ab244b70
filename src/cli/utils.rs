//! CLI utility functions
//!
//! Common helper functions shared across CLI commands:
//! - Opening the configured database
//! - Fact lookup by ID
//! - Output formatting shared by several commands

use anyhow::{bail, Result};
use clap::ValueEnum;
use colored::Colorize;
use tracing::warn;

use crate::config::Config;
use crate::core::embedding::HttpEmbeddingProvider;
use crate::core::error::MemoryError;
use crate::core::fact::Fact;
use crate::core::storage::{parse_fact_id, Storage};
use crate::core::store::FactStore;

/// Output format shared by listing commands
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Table,
    Json,
}

/// Open storage at the configured database path
///
/// # Errors
/// Returns an error if the database does not exist yet.
pub fn open_storage(config: &Config) -> Result<Storage> {
    let db_path = config.data_dir();
    if !db_path.exists() {
        bail!(
            "No trove database at {}. Run 'trove init' first.",
            db_path.display()
        );
    }
    Storage::open(&db_path)
}

/// Find a fact by ID (`trove-` prefix optional)
pub fn find_fact(storage: &Storage, target: &str) -> Result<Fact> {
    let id = parse_fact_id(target)?;
    storage
        .get_fact(&id)?
        .ok_or_else(|| MemoryError::NotFound(format!("fact {}", target)).into())
}

/// Embedding provider from config, or `None` when unconfigured or broken
pub fn embedding_provider(config: &Config) -> Option<HttpEmbeddingProvider> {
    match HttpEmbeddingProvider::from_config(&config.embedding) {
        Ok(provider) => provider,
        Err(e) => {
            warn!("Ignoring embedding config: {:#}", e);
            None
        }
    }
}

/// Display form of a fact id
pub fn display_id(fact: &Fact) -> String {
    format!("trove-{}", fact.id)
}

/// Ten-segment bar followed by the score
pub fn format_score(score: f64) -> String {
    let bars = ((score.clamp(0.0, 1.0) * 10.0).round()) as usize;
    let filled = "█".repeat(bars);
    let empty = "░".repeat(10 - bars);
    let bar = format!("{}{}", filled, empty);
    let bar = if score >= 0.7 {
        bar.green()
    } else if score >= 0.4 {
        bar.yellow()
    } else {
        bar.red()
    };
    format!("{} {:.2}", bar, score)
}

/// Shorten text to `max` characters for tables
pub fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
