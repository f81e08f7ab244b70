//! `trove forget` command
//!
//! Permanently deletes a fact. Asks for confirmation unless `-y` is given.

use anyhow::Result;
use clap::Args;
use dialoguer::Confirm;

use super::utils::{display_id, find_fact, open_storage};
use crate::config::Config;
use crate::core::store::FactStore;

#[derive(Args, Debug)]
pub struct ForgetArgs {
    /// ID of the fact
    pub target: String,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

pub fn run(args: ForgetArgs, config: &Config) -> Result<()> {
    let storage = open_storage(config)?;
    let fact = find_fact(&storage, &args.target)?;

    println!("{}", fact);

    if !args.yes
        && !Confirm::new()
            .with_prompt("Forget this fact permanently?")
            .default(false)
            .interact()?
    {
        println!("Cancelled.");
        return Ok(());
    }

    if storage.delete_fact(&fact.id)? {
        println!("🗑️  Forgot {}", display_id(&fact));
    }
    Ok(())
}
