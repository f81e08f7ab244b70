//! `trove add` command
//!
//! Remembers a new fact and lets it corroborate what is already known.
//!
//! # Usage
//! ```bash
//! trove add "Deploys happen on Tuesdays" --kind told --actor shaun
//! trove add "The API times out after 30s" --kind observed --links api,timeouts
//! trove add --file notes.txt --kind read --context "ops handbook"
//! ```

use std::fs;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use serde_json::json;
use tracing::warn;

use super::utils::{display_id, embedding_provider, format_score, open_storage, print_json, OutputFormat};
use crate::config::Config;
use crate::core::embedding::EmbeddingProvider;
use crate::core::fact::{Category, Fact, Provenance, ProvenanceKind};
use crate::core::store::FactStore;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Content of the fact
    #[arg(required_unless_present = "file")]
    pub content: Option<String>,

    /// Read content from file
    #[arg(short = 'f', long)]
    pub file: Option<String>,

    /// How the fact was learned (experienced, observed, told, read, inferred)
    #[arg(short, long, default_value = "told")]
    pub kind: ProvenanceKind,

    /// Who the fact came from
    #[arg(short, long)]
    pub actor: Option<String>,

    /// Situation the fact was learned in
    #[arg(long)]
    pub context: Option<String>,

    /// Category (fact, event, opinion, preference, procedure, relationship, observation)
    #[arg(long, default_value = "fact")]
    pub category: Category,

    /// Linked entities (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub links: Option<Vec<String>>,

    /// Override the category's decay rate (0.0-1.0)
    #[arg(long)]
    pub decay_rate: Option<f64>,

    /// Protect from decay
    #[arg(long)]
    pub protect: bool,

    /// Skip the corroboration check
    #[arg(long)]
    pub no_corroborate: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,
}

pub async fn run(args: AddArgs, config: &Config) -> Result<()> {
    let storage = open_storage(config)?;

    let content = match (&args.file, args.content) {
        (Some(path), _) => fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?,
        (None, Some(content)) => content,
        (None, None) => anyhow::bail!("Nothing to add: give content or --file"),
    };
    let content = content.trim().to_string();
    if content.is_empty() {
        anyhow::bail!("Fact content is empty");
    }

    // First-hand knowledge is attributed to this agent unless told otherwise
    let actor = args.actor.or_else(|| match args.kind {
        ProvenanceKind::Experienced | ProvenanceKind::Observed | ProvenanceKind::Inferred => {
            Some(config.user.name.clone())
        }
        ProvenanceKind::Told | ProvenanceKind::Read => None,
    });

    let mut provenance = Provenance::new(args.kind);
    if let Some(actor) = actor {
        provenance = provenance.with_actor(actor);
    }
    if let Some(context) = args.context {
        provenance = provenance.with_context(context);
    }

    let mut fact = Fact::with_model(
        content,
        args.category,
        provenance,
        &config.trust_model(),
        &config.decay,
    )
    .with_links(args.links.unwrap_or_default());
    if let Some(rate) = args.decay_rate {
        fact = fact.with_decay_rate(rate);
    }
    if args.protect {
        fact = fact.protected();
    }

    if let Some(provider) = embedding_provider(config) {
        let timeout = Duration::from_secs(config.embedding.timeout_secs.max(1));
        match tokio::time::timeout(timeout, provider.embed(&fact.content)).await {
            Ok(Ok(embedding)) => fact = fact.with_embedding(embedding),
            Ok(Err(e)) => warn!("Fact stored without embedding: {:#}", e),
            Err(_) => warn!("Fact stored without embedding: provider timed out"),
        }
    }

    storage.create_fact(&fact)?;

    let adjustments = if args.no_corroborate {
        Vec::new()
    } else {
        config.detector().check_corroboration(&storage, &fact, Utc::now())?
    };

    if args.format == OutputFormat::Json {
        return print_json(&json!({
            "fact": fact,
            "corroborated": adjustments,
        }));
    }

    println!("✅ Fact added: {}", display_id(&fact));
    println!("   Trust: {}", format_score(fact.trust.score));
    println!("   Why:   {}", fact.trust.rationale.join("; ").dimmed());
    if !fact.links.is_empty() {
        let links: Vec<&str> = fact.links.iter().map(String::as_str).collect();
        println!("   Links: {}", links.join(", "));
    }

    if !adjustments.is_empty() {
        println!("\n🤝 Corroborated {} existing fact(s):", adjustments.len());
        for adj in &adjustments {
            println!(
                "   trove-{}  {:.2} → {:.2}  {}",
                adj.fact_id,
                adj.old_score,
                adj.new_score,
                adj.reason.dimmed()
            );
        }
    }

    Ok(())
}
