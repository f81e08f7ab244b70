//! `trove recall` command
//!
//! Ranks facts against a query. Facts returned are marked as used, which
//! restores their relevance.
//!
//! # Usage
//! ```bash
//! trove recall "deploy schedule"
//! trove recall "timeouts" --entity api --context "incident review"
//! trove recall "preferences" --category preference --format table
//! trove recall "billing" --quick --no-touch --format json
//! ```

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::debug;

use super::utils::{display_id, embedding_provider, format_score, open_storage, preview, print_json, OutputFormat};
use crate::config::Config;
use crate::core::embedding::EmbeddingProvider;
use crate::core::fact::{Category, FactId};
use crate::core::recall::{RecallQuery, RecallResult};
use crate::core::store::FactStore;

#[derive(Args, Debug)]
pub struct RecallArgs {
    /// What to recall
    pub query: String,

    /// Situation you are in; favours facts learned in a similar one
    #[arg(long)]
    pub context: Option<String>,

    /// Also consider facts linked to these entities (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub entity: Option<Vec<String>>,

    /// Also consider facts in these categories (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub category: Option<Vec<Category>>,

    /// Minimum trust score (0.0-1.0)
    #[arg(long)]
    pub min_trust: Option<f64>,

    /// Minimum relevance (0.0-1.0)
    #[arg(long)]
    pub min_relevance: Option<f64>,

    /// Maximum results
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Include facts that have decayed below the relevance minimum
    #[arg(long)]
    pub include_archived: bool,

    /// Lexical matching only, skipping embeddings and entity links
    #[arg(long)]
    pub quick: bool,

    /// Do not record this recall as use
    #[arg(long)]
    pub no_touch: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,
}

#[derive(Tabled)]
struct RecallRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Trust")]
    trust: String,
    #[tabled(rename = "Relevance")]
    relevance: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Content")]
    content: String,
}

pub async fn run(args: RecallArgs, config: &Config) -> Result<()> {
    let storage = open_storage(config)?;
    let engine = config.recall_engine();
    let defaults = &config.recall;

    let mut query = RecallQuery::new(args.query)
        .with_entities(args.entity.unwrap_or_default())
        .with_categories(args.category.unwrap_or_default())
        .with_min_trust(args.min_trust.unwrap_or(defaults.default_min_trust))
        .with_min_relevance(args.min_relevance.unwrap_or(defaults.default_min_relevance))
        .with_limit(args.limit.unwrap_or(defaults.default_limit));
    if let Some(context) = args.context {
        query = query.with_context(context);
    }
    if args.include_archived {
        query = query.include_archived();
    }

    let results = if args.quick {
        engine.quick_recall(&storage, query)?
    } else {
        let provider = embedding_provider(config);
        let provider = provider.as_ref().map(|p| p as &dyn EmbeddingProvider);
        engine.recall(&storage, provider, query).await?
    };

    if !args.no_touch && !results.is_empty() {
        let ids: Vec<FactId> = results.iter().map(|r| r.fact.id).collect();
        let touched = storage.mark_used(&ids, Utc::now())?;
        debug!(touched, "recalled facts marked as used");
    }

    match args.format {
        OutputFormat::Json => print_json(&results)?,
        OutputFormat::Table => print_table(&results),
        OutputFormat::Pretty => print_pretty(&results),
    }

    Ok(())
}

pub(crate) fn print_pretty(results: &[RecallResult]) {
    if results.is_empty() {
        println!("No results found.");
        return;
    }

    println!("\n📚 Found {} result(s):\n", results.len());

    for (i, r) in results.iter().enumerate() {
        let fact = &r.fact;
        println!(
            "{}. {}  {}",
            i + 1,
            display_id(fact).cyan(),
            format!("score {:.2}", r.final_score).bold()
        );
        println!(
            "   Trust: {} | {} | {}{}",
            format_score(fact.trust.score),
            fact.category,
            fact.provenance.kind,
            fact.provenance
                .actor
                .as_deref()
                .map(|a| format!(" ({})", a))
                .unwrap_or_default()
        );
        println!("   {}\n", fact.summary.as_deref().unwrap_or(&fact.content));
    }
}

pub(crate) fn print_table(results: &[RecallResult]) {
    let rows: Vec<RecallRow> = results
        .iter()
        .map(|r| RecallRow {
            id: r.fact.short_id(),
            score: format!("{:.2}", r.final_score),
            trust: format!("{:.2}", r.fact.trust.score),
            relevance: format!("{:.2}", r.fact.relevance),
            category: r.fact.category.to_string(),
            content: preview(&r.fact.content, 60),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
}
