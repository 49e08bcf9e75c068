use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "caliber",
    about = "Caliber: collector reputation, profile stats and discussion threads",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML file with `[score]` and `[thread]` sections
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Score an ad-hoc vault
    Score(ScoreArgs),
    /// Print the brand prestige table
    Tiers(TiersArgs),
    /// Load a fixture and sync every collector's profile stats
    Sync(SyncArgs),
    /// Print the review or comment thread of a fixture target
    Thread(ThreadArgs),
}

#[derive(Args)]
pub struct ScoreArgs {
    /// Held watches as BRAND/CATEGORY, e.g. "Patek Philippe/Dress"
    #[arg(required = true)]
    pub watches: Vec<String>,

    /// Mean community rating of the profile, 1.0 to 5.0
    #[arg(short, long)]
    pub rating: Option<f64>,
}

#[derive(Args)]
pub struct TiersArgs {
    /// Show only brands at or above this weight
    #[arg(long)]
    pub min_weight: Option<u32>,
}

#[derive(Args)]
pub struct SyncArgs {
    pub fixture: PathBuf,

    /// Only sync this collector
    #[arg(long)]
    pub collector: Option<String>,
}

#[derive(Args)]
pub struct ThreadArgs {
    pub fixture: PathBuf,

    /// `profile:NAME`, `watch:KEY` or `post:KEY`
    #[arg(short, long)]
    pub target: String,

    /// Print every reply instead of collapsed reply lists
    #[arg(long)]
    pub all: bool,
}
