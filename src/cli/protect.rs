//! `trove protect` / `trove unprotect` commands
//!
//! Protected facts never decay and always have full relevance.

use anyhow::Result;
use clap::Args;

use super::utils::{display_id, find_fact, open_storage};
use crate::config::Config;
use crate::core::error::MemoryError;
use crate::core::fact::FactPatch;
use crate::core::store::FactStore;

#[derive(Args, Debug)]
pub struct ProtectArgs {
    /// ID of the fact
    pub target: String,
}

pub fn run(args: ProtectArgs, config: &Config, protected: bool) -> Result<()> {
    let storage = open_storage(config)?;
    let fact = find_fact(&storage, &args.target)?;

    if fact.protected == protected {
        println!(
            "{} is already {}",
            display_id(&fact),
            if protected { "protected" } else { "unprotected" }
        );
        return Ok(());
    }

    let updated = storage
        .update_fact(
            &fact.id,
            FactPatch {
                protected: Some(protected),
                ..Default::default()
            },
        )?
        .ok_or_else(|| MemoryError::NotFound(format!("fact {}", args.target)))?;

    if protected {
        println!("🛡️  Protected {}", display_id(&updated));
    } else {
        println!(
            "🍂 {} will decay again (relevance {:.2})",
            display_id(&updated),
            updated.relevance
        );
    }
    Ok(())
}
