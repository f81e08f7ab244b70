//! `trove embed` command
//!
//! Backfills embeddings for facts stored without one, so they can take
//! part in semantic recall. Requires `[embedding] endpoint` in config.

use anyhow::{bail, Result};
use clap::Args;
use tracing::info;

use super::utils::{embedding_provider, open_storage};
use crate::config::Config;
use crate::core::embedding::EmbeddingProvider;
use crate::core::fact::FactPatch;
use crate::core::store::FactStore;

#[derive(Args, Debug)]
pub struct EmbedArgs {
    /// Recompute embeddings for every fact, not just missing ones
    #[arg(long)]
    pub all: bool,

    /// Show how many facts would be embedded without calling the provider
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn run(args: EmbedArgs, config: &Config) -> Result<()> {
    let storage = open_storage(config)?;

    let pending: Vec<_> = storage
        .all_facts(None)?
        .into_iter()
        .filter(|f| args.all || f.embedding.is_none())
        .collect();

    if pending.is_empty() {
        println!("✨ Every fact already has an embedding.");
        return Ok(());
    }
    if args.dry_run {
        println!("ℹ️  {} fact(s) would be embedded.", pending.len());
        return Ok(());
    }

    let Some(provider) = embedding_provider(config) else {
        bail!("No embedding endpoint configured. Set it with: trove config embedding.endpoint <url>");
    };

    let mut written = 0;
    for chunk in pending.chunks(config.embedding.batch_size.max(1)) {
        let texts: Vec<String> = chunk.iter().map(|f| f.content.clone()).collect();
        let vectors = provider.embed_batch(&texts).await?;

        let updates: Vec<_> = chunk
            .iter()
            .zip(vectors)
            .map(|(fact, vector)| {
                (
                    fact.id,
                    FactPatch {
                        embedding: Some(Some(vector)),
                        ..Default::default()
                    },
                )
            })
            .collect();
        written += storage.update_facts(&updates)?;
        info!("Embedded {}/{} facts", written, pending.len());
    }

    println!(
        "✅ Embedded {} fact(s) with {}",
        written,
        provider.model_name()
    );
    Ok(())
}
