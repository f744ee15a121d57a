use crate::config::{GenerationMode, GeneratorConfig, TierConfig};
use crate::corpus::{load_seeds, Corpus};
use crate::error::{CorpusError, Result};
use crate::grid::{build_permutation, Grid};
use crate::pool::SentencePools;
use crate::record::{
    canonical_title, template_columns, PuzzleRecord, SeedPuzzle, SentenceHints, VocabularyEntry,
};
use crate::reveal::{mask_to_vecs, reveal_mask};
use crate::rng::SeededRng;
use crate::signature::{Admission, CorpusState};
use crate::symbols::{apply_symbols, SymbolSet};
use crate::Difficulty;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Validated seed puzzles of one tier
#[derive(Debug, Clone)]
pub struct SeedSet {
    entries: Vec<(SymbolSet, Vec<VocabularyEntry>)>,
}

impl SeedSet {
    pub fn new(seeds: &[SeedPuzzle]) -> Result<Self> {
        if seeds.is_empty() {
            return Err(CorpusError::malformed("<seeds>", "no seed puzzles"));
        }
        let entries = seeds
            .iter()
            .map(|seed| Ok((SymbolSet::new(&seed.symbols)?, seed.vocabulary.clone())))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// Load a seed file, failing on missing, empty or malformed input
    pub fn load(path: &Path) -> Result<Self> {
        Self::new(&load_seeds(path)?)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every character used by any seed
    pub fn alphabet(&self) -> BTreeSet<char> {
        self.entries
            .iter()
            .flat_map(|(symbols, _)| symbols.chars().iter().copied())
            .collect()
    }

    fn pick(&self, rng: &mut SeededRng) -> &(SymbolSet, Vec<VocabularyEntry>) {
        &self.entries[rng.next_usize(self.entries.len())]
    }
}

/// RNG label of one generation attempt for an id
pub fn candidate_label(difficulty: Difficulty, id: u32, attempt: usize) -> String {
    format!("{}:{}:{}", difficulty.key(), id, attempt)
}

/// RNG label of a record's reveal mask
pub fn reveal_label(difficulty: Difficulty, id: u32) -> String {
    format!("{}:{}:reveal", difficulty.key(), id)
}

/// Derive one candidate record.
///
/// The seed choice, symbol order and permutation come from the attempt's
/// label; the reveal mask comes from the id's own label so that it can be
/// regenerated later without knowing which attempt succeeded.
pub fn build_candidate(
    tier: &TierConfig,
    seeds: &SeedSet,
    id: u32,
    attempt: usize,
) -> PuzzleRecord {
    let difficulty = tier.difficulty;
    let mut rng = SeededRng::from_label(&candidate_label(difficulty, id, attempt));

    let (seed_symbols, vocabulary) = seeds.pick(&mut rng);
    let mut symbols = seed_symbols.clone();
    symbols.shuffle(&mut rng);

    let spec = build_permutation(difficulty, &mut rng);
    let solution = Grid::base().permute(&spec);
    let template = apply_symbols(&solution, &symbols);

    let mut reveal_rng = SeededRng::from_label(&reveal_label(difficulty, id));
    let mask = reveal_mask(&solution, &symbols, tier.reveal, &mut reveal_rng);

    let sentence_hints = difficulty.is_box_free().then(|| SentenceHints {
        rows: template.clone(),
        columns: template_columns(&template),
    });

    PuzzleRecord {
        id,
        difficulty,
        title: canonical_title(difficulty, id, tier.range),
        symbols: symbols.to_strings(),
        template,
        revealed: mask_to_vecs(&mask),
        solution: solution.to_vecs(),
        vocabulary: vocabulary.clone(),
        sentence_hints,
    }
}

/// Outcome of one tier run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierReport {
    pub difficulty: Option<Difficulty>,
    /// Records present before the run
    pub existing: usize,
    pub generated: usize,
    pub attempts: usize,
    pub duplicates: usize,
    pub line_conflicts: usize,
}

/// Outcome of a corpus run
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub tiers: Vec<TierReport>,
    /// Rebuilt sentence pools, when the box-free tier was part of the run
    pub pools: Option<SentencePools>,
}

impl GenerationReport {
    pub fn generated(&self) -> usize {
        self.tiers.iter().map(|t| t.generated).sum()
    }
}

/// Top a tier up to `target` records.
///
/// Duplicate candidates are discarded and retried with the next attempt label.
/// The run fails once the retry budget for the missing records is spent, and
/// fails before doing any work when the id range cannot hold them.
pub fn generate_tier(
    config: &GeneratorConfig,
    difficulty: Difficulty,
    seeds: &SeedSet,
    records: &mut Vec<PuzzleRecord>,
    target: usize,
    state: &mut CorpusState,
) -> Result<TierReport> {
    let tier = *config.tiers.get(difficulty);
    let mut report = TierReport {
        difficulty: Some(difficulty),
        existing: records.len(),
        ..TierReport::default()
    };

    let requested = target.saturating_sub(records.len());
    if requested == 0 {
        info!(
            "{}: {} records already meet target {}",
            difficulty,
            records.len(),
            target
        );
        return Ok(report);
    }

    state
        .allocator(difficulty)
        .ok_or_else(|| missing_range(difficulty))?
        .ensure_room(requested)?;

    let budget = config.retry_budget(requested);
    let mut attempt = 0usize;
    while report.generated < requested {
        if report.attempts >= budget {
            return Err(CorpusError::RetriesExhausted {
                difficulty,
                attempts: report.attempts,
                generated: report.generated,
                requested,
            });
        }

        let id = state
            .allocator(difficulty)
            .ok_or_else(|| missing_range(difficulty))?
            .peek()?;
        let candidate = build_candidate(&tier, seeds, id, attempt);
        report.attempts += 1;

        match state.admit(&candidate) {
            Admission::Admitted => {
                state
                    .allocator_mut(difficulty)
                    .ok_or_else(|| missing_range(difficulty))?
                    .allocate()?;
                records.push(candidate);
                report.generated += 1;
                attempt = 0;
            }
            Admission::DuplicateSignature => {
                debug!("{}: duplicate signature for id {} attempt {}", difficulty, id, attempt);
                report.duplicates += 1;
                attempt += 1;
            }
            Admission::LineConflict => {
                debug!("{}: sentence line clash for id {} attempt {}", difficulty, id, attempt);
                report.line_conflicts += 1;
                attempt += 1;
            }
        }
    }

    info!(
        "{}: generated {} records ({} attempts, {} duplicates, {} line clashes)",
        difficulty, report.generated, report.attempts, report.duplicates, report.line_conflicts
    );
    Ok(report)
}

fn missing_range(difficulty: Difficulty) -> CorpusError {
    CorpusError::TierTable(format!("no id range configured for {}", difficulty))
}

/// Run generation for every tier in `targets`.
///
/// Seeds for every tier with work to do are checked before anything is
/// generated. In [`GenerationMode::RegenerateAll`] the planned tiers are
/// emptied first; other tiers stay and still take part in deduplication.
/// When the box-free tier is planned the sentence pools are rebuilt from its
/// records and returned in the report. `corpus` is only meaningful on success.
pub fn generate_corpus(
    config: &GeneratorConfig,
    corpus: &mut Corpus,
    seeds: &BTreeMap<Difficulty, SeedSet>,
    targets: &BTreeMap<Difficulty, usize>,
) -> Result<GenerationReport> {
    for (&difficulty, &target) in targets {
        let needs_work = config.mode == GenerationMode::RegenerateAll
            || corpus.records(difficulty).len() < target;
        if needs_work && target > 0 && !seeds.contains_key(&difficulty) {
            return Err(CorpusError::malformed(
                format!("<seeds:{}>", difficulty.key()),
                "no seed puzzles loaded for tier",
            ));
        }
    }

    if config.mode == GenerationMode::RegenerateAll {
        for &difficulty in targets.keys() {
            let dropped = corpus.take_records(difficulty);
            info!("{}: discarding {} records for regeneration", difficulty, dropped.len());
        }
    }

    let mut state = CorpusState::from_records(&config.tiers, corpus.all_records());
    let mut report = GenerationReport::default();

    for (&difficulty, &target) in targets {
        let mut records = corpus.take_records(difficulty);
        let tier_report = match seeds.get(&difficulty) {
            Some(tier_seeds) => {
                generate_tier(config, difficulty, tier_seeds, &mut records, target, &mut state)?
            }
            None => TierReport {
                difficulty: Some(difficulty),
                existing: records.len(),
                ..TierReport::default()
            },
        };
        records.sort_by_key(|r| r.id);
        corpus.set_records(difficulty, records);
        report.tiers.push(tier_report);
    }

    if targets.contains_key(&Difficulty::Expert) {
        let mut alphabet = seeds
            .get(&Difficulty::Expert)
            .map(SeedSet::alphabet)
            .unwrap_or_default();
        alphabet.extend(
            corpus
                .records(Difficulty::Expert)
                .iter()
                .flat_map(|r| r.symbols.iter().flat_map(|s| s.chars())),
        );
        report.pools = Some(SentencePools::build(
            corpus.records(Difficulty::Expert),
            &alphabet,
            config.pool_size,
        )?);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Position;
    use crate::symbols::SymbolClass;

    fn seeds() -> SeedSet {
        SeedSet::new(&[SeedPuzzle {
            symbols: ["あ", "い", "う", "日", "月", "火", "水", "木", "金"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            vocabulary: vec![VocabularyEntry {
                word: "日曜日".into(),
                reading: "にちようび".into(),
                meaning: "Sunday".into(),
            }],
        }])
        .unwrap()
    }

    #[test]
    fn test_build_candidate_is_reproducible() {
        let tier = TierConfig::easy();
        let a = build_candidate(&tier, &seeds(), 1, 0);
        let b = build_candidate(&tier, &seeds(), 1, 0);
        assert_eq!(a, b);

        let c = build_candidate(&tier, &seeds(), 1, 1);
        assert_ne!(a.signature(), c.signature());
    }

    #[test]
    fn test_candidate_is_consistent() {
        let tier = TierConfig::medium();
        let record = build_candidate(&tier, &seeds(), 10_001, 0);
        let symbols = record.symbol_set().unwrap();

        assert_eq!(record.title, "Medium #1");
        for pos in Position::all_9x9() {
            let value = record.solution[pos.row][pos.col];
            let ch = record.template[pos.row].chars().nth(pos.col).unwrap();
            assert_eq!(symbols.symbol(value), ch);
            if SymbolClass::of_char(ch).is_syllabic() {
                assert!(record.revealed[pos.row][pos.col]);
            }
        }
        assert!(record.sentence_hints.is_none());
        assert_eq!(record.vocabulary.len(), 1);
    }

    #[test]
    fn test_box_free_candidate_has_hints() {
        let record = build_candidate(&TierConfig::expert(), &seeds(), 30_001, 0);
        let hints = record.sentence_hints.clone().unwrap();
        assert_eq!(hints.rows, record.template);
        assert_eq!(hints.columns, record.columns());
    }

    #[test]
    fn test_generate_tier_allocates_from_range_min() {
        let config = GeneratorConfig::default();
        let mut state = CorpusState::new(&config.tiers);
        let mut records = Vec::new();

        let seeds = seeds();
        let report =
            generate_tier(&config, Difficulty::Hard, &seeds, &mut records, 4, &mut state).unwrap();

        assert_eq!(report.generated, 4);
        let ids: Vec<u32> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![20_001, 20_002, 20_003, 20_004]);
    }

    #[test]
    fn test_generate_tier_is_noop_at_target() {
        let config = GeneratorConfig::default();
        let mut state = CorpusState::new(&config.tiers);
        let mut records = Vec::new();
        let seeds = seeds();
        generate_tier(&config, Difficulty::Easy, &seeds, &mut records, 2, &mut state).unwrap();

        let before = records.clone();
        let report =
            generate_tier(&config, Difficulty::Easy, &seeds, &mut records, 2, &mut state).unwrap();
        assert_eq!(report.generated, 0);
        assert_eq!(records, before);
    }

    #[test]
    fn test_range_exhaustion_fails_before_work() {
        let mut config = GeneratorConfig::default();
        let mut tiers = [
            TierConfig::easy(),
            TierConfig::medium(),
            TierConfig::hard(),
            TierConfig::expert(),
        ];
        tiers[0].range.max = 2;
        tiers[1].range.min = 3;
        config.tiers = crate::config::TierTable::new(tiers).unwrap();

        let mut state = CorpusState::new(&config.tiers);
        let mut records = Vec::new();
        let result =
            generate_tier(&config, Difficulty::Easy, &seeds(), &mut records, 3, &mut state);
        assert!(matches!(result, Err(CorpusError::RangeExhausted { .. })));
        assert!(records.is_empty());
    }

    #[test]
    fn test_retry_budget_exhaustion_is_loud() {
        let config = GeneratorConfig {
            retry_base: 0,
            retry_multiplier: 1,
            ..GeneratorConfig::default()
        };
        let tier = *config.tiers.get(Difficulty::Easy);
        let mut state = CorpusState::new(&config.tiers);

        // Pre-register the exact candidates the run will try first.
        for attempt in 0..3 {
            let candidate = build_candidate(&tier, &seeds(), 1, attempt);
            state.signatures.register(candidate.signature());
        }

        let mut records = Vec::new();
        let result =
            generate_tier(&config, Difficulty::Easy, &seeds(), &mut records, 2, &mut state);
        match result {
            Err(CorpusError::RetriesExhausted {
                attempts,
                generated,
                requested,
                ..
            }) => {
                assert_eq!(attempts, 2);
                assert_eq!(generated, 0);
                assert_eq!(requested, 2);
            }
            other => panic!("expected retry exhaustion, got {:?}", other),
        }
    }

    #[test]
    fn test_generate_corpus_requires_seeds() {
        let config = GeneratorConfig::default();
        let mut corpus = Corpus::new();
        let targets = BTreeMap::from([(Difficulty::Easy, 1)]);
        let result = generate_corpus(&config, &mut corpus, &BTreeMap::new(), &targets);
        assert!(matches!(result, Err(CorpusError::MalformedInput { .. })));
        assert!(corpus.is_empty());
    }

    #[test]
    fn test_generate_corpus_builds_pools_for_box_free() {
        let config = GeneratorConfig {
            pool_size: 60,
            ..GeneratorConfig::default()
        };
        let mut corpus = Corpus::new();
        let seeds = BTreeMap::from([(Difficulty::Expert, seeds())]);
        let targets = BTreeMap::from([(Difficulty::Expert, 3)]);

        let report = generate_corpus(&config, &mut corpus, &seeds, &targets).unwrap();
        let pools = report.pools.unwrap();
        assert_eq!(pools.rows.len(), 60);
        assert_eq!(pools.columns.len(), 60);
        for record in corpus.records(Difficulty::Expert) {
            for row in &record.template {
                assert!(pools.rows.contains(row));
            }
            for column in record.columns() {
                assert!(pools.columns.contains(&column));
            }
        }
    }
}
