//! transync: keep Weblate projects in step with runbot branches.
//!
//! # Usage
//!
//! ```text
//! transync init [--force]
//! transync sync [--config <path>] [--dry-run] [--json]
//! transync slug <repo_url> <branch>
//! transync catalog --url <api_url> --token <token> [--match <needle>]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{catalog::CatalogArgs, init::InitArgs, slug::SlugArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "transync",
    version,
    about = "Reconcile CI branches with translation platform projects",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a configuration template to ~/.transync/config.yaml.
    Init(InitArgs),

    /// Run one reconciliation pass.
    Sync(SyncArgs),

    /// Show the project identity derived for a repository and branch.
    Slug(SlugArgs),

    /// List the projects known to a platform endpoint.
    Catalog(CatalogArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Sync(args) => args.run(),
        Commands::Slug(args) => args.run(),
        Commands::Catalog(args) => args.run(),
    }
}

/// `RUST_LOG` filter, `info` by default. Also picks up `log` records from the
/// library crates. Logs go to stderr so `--json` output stays clean.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
