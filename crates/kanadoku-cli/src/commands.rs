//! Subcommand implementations.
//!
//! Each command returns `Ok(false)` when it ran but found problems (invalid
//! corpus, empty tier); hard failures come back as [`CorpusError`].

use crate::cli::{CorpusArgs, GenerateArgs, MaintainArgs};
use kanadoku_core::maintenance::count_changed;
use kanadoku_core::{
    generate_corpus, normalize_titles, regenerate_reveals, validate_corpus, Corpus, CorpusError,
    CorpusLayout, Difficulty, FileStore, GenerationMode, GeneratorConfig, SeedSet, Selector,
    SentencePools, TierTable, ValidationReport, ValidatorConfig,
};
use log::info;
use rand::Rng;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

type Result<T> = std::result::Result<T, CorpusError>;

/// Default selection state file in the user's local data directory
pub fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kanadoku_store.json")
}

fn tier_table(corpus: &CorpusArgs) -> TierTable {
    TierTable::default().with_subset_reveals(corpus.subset_reveals)
}

fn validator_config(corpus: &CorpusArgs) -> ValidatorConfig {
    ValidatorConfig {
        tiers: tier_table(corpus),
        pool_size: Some(corpus.pool_size),
        ..ValidatorConfig::default()
    }
}

pub fn generate(layout: &CorpusLayout, args: &GenerateArgs) -> Result<bool> {
    let config = GeneratorConfig {
        tiers: tier_table(&args.corpus),
        mode: if args.regenerate_all {
            GenerationMode::RegenerateAll
        } else {
            GenerationMode::from_env()
        },
        pool_size: args.corpus.pool_size,
        ..GeneratorConfig::default()
    };

    let selected = args.selected_tiers();
    let seeds = selected
        .iter()
        .map(|&d| Ok((d, SeedSet::load(&layout.seed_file(d))?)))
        .collect::<Result<BTreeMap<_, _>>>()?;
    let targets: BTreeMap<Difficulty, usize> =
        selected.iter().map(|&d| (d, args.target)).collect();

    let mut corpus = Corpus::load(layout)?;
    info!("Loaded {} existing records from {}", corpus.len(), layout.root().display());

    let report = generate_corpus(&config, &mut corpus, &seeds, &targets)?;
    corpus.save(layout)?;
    if let Some(pools) = &report.pools {
        pools.save(&layout.row_pool_file(), &layout.column_pool_file())?;
    }

    for tier in &report.tiers {
        if let Some(difficulty) = tier.difficulty {
            println!(
                "{}: {} existing, {} generated, {} duplicates, {} line clashes",
                difficulty, tier.existing, tier.generated, tier.duplicates, tier.line_conflicts
            );
        }
    }

    let validation = check(layout, &corpus, &validator_config(&args.corpus))?;
    Ok(print_report(&validation))
}

pub fn validate(layout: &CorpusLayout, args: &CorpusArgs) -> Result<bool> {
    let corpus = Corpus::load(layout)?;
    let validation = check(layout, &corpus, &validator_config(args))?;
    Ok(print_report(&validation))
}

pub fn maintain(layout: &CorpusLayout, args: &MaintainArgs) -> Result<bool> {
    let validator = validator_config(&args.corpus);
    let tiers = &validator.tiers;
    let mut corpus = Corpus::load(layout)?;

    let mut changed = 0;
    for &difficulty in Difficulty::all_levels() {
        let before = corpus.records(difficulty).to_vec();
        let mut after = before.clone();
        if args.normalize_titles {
            after = normalize_titles(&after, tiers);
        }
        if args.regenerate_reveals {
            after = regenerate_reveals(&after, tiers)?;
        }
        changed += count_changed(&before, &after);
        corpus.set_records(difficulty, after);
    }

    let validation = check(layout, &corpus, &validator)?;
    if !validation.is_clean() {
        print_report(&validation);
        eprintln!("Refusing to write: the rewritten corpus does not validate");
        return Ok(false);
    }

    corpus.save(layout)?;
    println!("{} records rewritten", changed);
    Ok(true)
}

pub fn pick<R: Rng>(
    layout: &CorpusLayout,
    store_path: &Path,
    difficulty: Difficulty,
    rng: &mut R,
) -> Result<bool> {
    let corpus = Corpus::load(layout)?;
    let records = corpus.records(difficulty);
    let pool: Vec<u32> = records.iter().map(|r| r.id).collect();

    let mut selector = Selector::new(FileStore::open(store_path));
    match selector.get_next(difficulty, &pool, rng) {
        Some(id) => {
            let title = records
                .iter()
                .find(|r| r.id == id)
                .map(|r| r.title.as_str())
                .unwrap_or_default();
            println!("{}\t{}", id, title);
            Ok(true)
        }
        None => {
            eprintln!("No {} puzzles in {}", difficulty, layout.root().display());
            Ok(false)
        }
    }
}

pub fn skip(store_path: &Path, id: u32) -> Result<bool> {
    let mut selector = Selector::new(FileStore::open(store_path));
    let count = selector.mark_skipped(id);
    println!("{}\tskipped {} times", id, count);
    Ok(true)
}

/// Validate with pools when the box-free tier has records or pool files exist
fn check(
    layout: &CorpusLayout,
    corpus: &Corpus,
    config: &ValidatorConfig,
) -> Result<ValidationReport> {
    let row_path = layout.row_pool_file();
    let column_path = layout.column_pool_file();
    let wants_pools = !corpus.records(Difficulty::Expert).is_empty()
        || row_path.exists()
        || column_path.exists();

    let pools = if wants_pools {
        Some(SentencePools::load(&row_path, &column_path)?)
    } else {
        None
    };
    Ok(validate_corpus(corpus, pools.as_ref(), config))
}

fn print_report(report: &ValidationReport) -> bool {
    for violation in &report.violations {
        println!("{}", violation);
    }
    if report.is_clean() {
        println!("{} records valid", report.records_checked);
        true
    } else {
        eprintln!(
            "{} violations in {} records",
            report.violations.len(),
            report.records_checked
        );
        false
    }
}
