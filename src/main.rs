//! trove CLI - Entry point
//!
//! Usage: trove <command> [options]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trove::cli::{Cli, Commands};
use trove::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; --verbose only changes the fallback
    let fallback = if cli.verbose { "trove=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let explicit = cli.config.as_deref();
    let load = || Config::load_with(explicit);

    match cli.command {
        Commands::Init(args) => trove::cli::init::run(args),
        Commands::Config(args) => trove::cli::config::run(args, explicit),
        Commands::Add(args) => trove::cli::add::run(args, &load()?).await,
        Commands::Show(args) => trove::cli::show::run(args, &load()?),
        Commands::Recall(args) => trove::cli::recall::run(args, &load()?).await,
        Commands::About(args) => trove::cli::about::run(args, &load()?),
        Commands::Sweep(args) => trove::cli::sweep::run(args, &load()?),
        Commands::Contradictions(args) => trove::cli::contradictions::run(args, &load()?),
        Commands::Verify(args) => trove::cli::verify::run(args, &load()?),
        Commands::Protect(args) => trove::cli::protect::run(args, &load()?, true),
        Commands::Unprotect(args) => trove::cli::protect::run(args, &load()?, false),
        Commands::Forget(args) => trove::cli::forget::run(args, &load()?),
        Commands::Embed(args) => trove::cli::embed::run(args, &load()?).await,
        Commands::Stats(args) => trove::cli::stats::execute(args, &load()?),
    }
}
