//! Command-line options.

use clap::{Args, Parser, Subcommand};
use kanadoku_core::config::{DEFAULT_POOL_SIZE, DEFAULT_SUBSET_REVEALS};
use kanadoku_core::Difficulty;
use std::path::PathBuf;

/// Generate, check and serve kana/kanji Latin-square puzzles.
#[derive(Debug, Parser)]
#[command(name = "kanadoku", about, version, long_about = None)]
pub struct Cli {
    /// Corpus directory holding seeds/, puzzles/ and pools/
    #[arg(short, long, env = "KANADOKU_DATA_DIR", default_value = "data", global = true)]
    pub data_dir: PathBuf,

    /// Selection state file (skip scores and shuffle bags)
    #[arg(long, env = "KANADOKU_STORE", global = true)]
    pub store: Option<PathBuf>,

    /// Enable debug messages
    #[arg(short, long, default_value_t = false, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Top tiers up to a target size, then validate the result
    Generate(GenerateArgs),
    /// Check every corpus invariant without changing anything
    Validate(CorpusArgs),
    /// Rewrite titles or reveal masks in place
    Maintain(MaintainArgs),
    /// Draw the next puzzle of a tier
    Pick {
        /// Tier to draw from
        difficulty: Difficulty,
    },
    /// Record that a puzzle was skipped
    Skip {
        /// Puzzle id
        id: u32,
    },
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Records wanted per tier
    #[arg(short, long)]
    pub target: usize,

    /// Tier to generate; repeat for several, default is every tier
    #[arg(long = "tier")]
    pub tiers: Vec<Difficulty>,

    /// Discard the selected tiers and rebuild them from scratch
    /// (also enabled by REGENERATE_ALL=1)
    #[arg(long, default_value_t = false)]
    pub regenerate_all: bool,

    #[command(flatten)]
    pub corpus: CorpusArgs,
}

#[derive(Debug, Args)]
pub struct MaintainArgs {
    /// Rewrite every title to "<Tier> #<n>"
    #[arg(long, default_value_t = false)]
    pub normalize_titles: bool,

    /// Recompute every reveal mask with the current policies
    #[arg(long, default_value_t = false)]
    pub regenerate_reveals: bool,

    #[command(flatten)]
    pub corpus: CorpusArgs,
}

/// Corpus parameters shared by every command that generates or checks
/// records. A corpus only validates against the values it was built with.
#[derive(Debug, Clone, Args)]
pub struct CorpusArgs {
    /// Entries per sentence pool
    #[arg(long, default_value_t = DEFAULT_POOL_SIZE)]
    pub pool_size: usize,

    /// Symbols revealed once each on box-free puzzles
    #[arg(long, default_value_t = DEFAULT_SUBSET_REVEALS)]
    pub subset_reveals: usize,
}

impl GenerateArgs {
    /// Selected tiers, every tier when none was named
    pub fn selected_tiers(&self) -> Vec<Difficulty> {
        if self.tiers.is_empty() {
            Difficulty::all_levels().to_vec()
        } else {
            let mut tiers = self.tiers.clone();
            tiers.sort();
            tiers.dedup();
            tiers
        }
    }
}
