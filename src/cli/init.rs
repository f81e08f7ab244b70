//! `trove init` command
//!
//! Initializes a new trove repository.
//!
//! # Usage
//! ```bash
//! trove init                    # Initialize in current directory
//! trove init /path/to/project   # Initialize in specific path
//! trove init --global           # Initialize global ~/.trove
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Args;

use crate::config::{Config, DATA_DIR};
use crate::core::storage::Storage;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path to initialize (default: current directory)
    pub path: Option<PathBuf>,

    /// Initialize global memory (~/.trove)
    #[arg(long)]
    pub global: bool,

    /// Force re-initialization
    #[arg(short, long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let base_path = if args.global {
        directories::UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        args.path.unwrap_or_else(|| PathBuf::from("."))
    };

    let trove_dir = base_path.join(DATA_DIR);

    if is_trove_repo(&base_path) && !args.force {
        bail!(
            "Directory {} is already a trove repository. Use --force to reinitialize.",
            base_path.display()
        );
    }

    println!("🚀 Initializing trove in: {}", base_path.display());

    fs::create_dir_all(&trove_dir)?;

    // Keep an existing config on --force; the database is never wiped
    let config_path = trove_dir.join("config.toml");
    if !config_path.exists() {
        Config::default().save_to(&config_path)?;
    }

    let db_path = trove_dir.join("data.db");
    let _storage = Storage::open(&db_path)?;

    println!("\n✅ Initialized trove repository");
    println!("   Config: {}", config_path.display());
    println!("   Database: {}", db_path.display());
    println!("\nNext steps:");
    println!("  trove add \"Deploys happen on Tuesdays\" --kind told --actor shaun");
    println!("  trove recall \"deploys\"");

    Ok(())
}

/// Check if a directory is already a trove repository
fn is_trove_repo(path: &Path) -> bool {
    path.join(DATA_DIR).join("data.db").exists()
}
