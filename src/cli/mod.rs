//! CLI module - Command definitions and handlers

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod about;
pub mod add;
pub mod config;
pub mod contradictions;
pub mod embed;
pub mod forget;
pub mod init;
pub mod protect;
pub mod recall;
pub mod show;
pub mod stats;
pub mod sweep;
pub mod utils;
pub mod verify;

/// trove - attributed agent memory
///
/// Remembers where every fact came from, how much to trust it and how
/// current it still is.
#[derive(Parser, Debug)]
#[command(name = "trove")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, env = "TROVE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new trove repository
    Init(init::InitArgs),

    /// Remember a new fact
    Add(add::AddArgs),

    /// Show a fact by ID
    Show(show::ShowArgs),

    /// Recall facts relevant to a query
    Recall(recall::RecallArgs),

    /// List everything known about an entity
    About(about::AboutArgs),

    /// Decay relevance of idle facts
    Sweep(sweep::SweepArgs),

    /// Find facts that contradict each other
    Contradictions(contradictions::ContradictionsArgs),

    /// Look for facts supporting a fact and raise its trust
    Verify(verify::VerifyArgs),

    /// Protect a fact from decay
    Protect(protect::ProtectArgs),

    /// Let a protected fact decay again
    Unprotect(protect::ProtectArgs),

    /// Permanently delete a fact
    Forget(forget::ForgetArgs),

    /// Compute missing embeddings
    Embed(embed::EmbedArgs),

    /// Show database statistics
    Stats(stats::StatsArgs),

    /// Get or set configuration
    Config(config::ConfigArgs),
}
