use crate::error::{CorpusError, Result};
use crate::ids::IdRange;
use crate::reveal::RevealPolicy;
use crate::Difficulty;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Fixed part of the generation retry budget
pub const RETRY_BASE: usize = 1_000;
/// Extra attempts granted per record still missing
pub const RETRY_MULTIPLIER: usize = 200;
/// Distinct symbols revealed once each on box-free puzzles
pub const DEFAULT_SUBSET_REVEALS: usize = 3;
/// Entries in each sentence pool
pub const DEFAULT_POOL_SIZE: usize = 40_000;

/// Per-tier generation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    pub difficulty: Difficulty,
    pub range: IdRange,
    pub reveal: RevealPolicy,
}

impl TierConfig {
    pub fn easy() -> Self {
        Self {
            difficulty: Difficulty::Easy,
            range: IdRange::new(1, 10_000),
            reveal: RevealPolicy::FixedTarget { total: 45 },
        }
    }

    pub fn medium() -> Self {
        Self {
            difficulty: Difficulty::Medium,
            range: IdRange::new(10_001, 20_000),
            reveal: RevealPolicy::FixedTarget { total: 36 },
        }
    }

    pub fn hard() -> Self {
        Self {
            difficulty: Difficulty::Hard,
            range: IdRange::new(20_001, 30_000),
            reveal: RevealPolicy::FixedTarget { total: 28 },
        }
    }

    pub fn expert() -> Self {
        Self {
            difficulty: Difficulty::Expert,
            range: IdRange::new(30_001, 40_000),
            reveal: RevealPolicy::FixedSubset {
                symbols: DEFAULT_SUBSET_REVEALS,
            },
        }
    }

    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self::easy(),
            Difficulty::Medium => Self::medium(),
            Difficulty::Hard => Self::hard(),
            Difficulty::Expert => Self::expert(),
        }
    }
}

/// The four tiers with contiguous, non-overlapping id ranges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTable {
    tiers: [TierConfig; 4],
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            tiers: [
                TierConfig::easy(),
                TierConfig::medium(),
                TierConfig::hard(),
                TierConfig::expert(),
            ],
        }
    }
}

impl TierTable {
    /// Build a table, checking tier order and that tier k's max + 1 is tier k+1's min
    pub fn new(tiers: [TierConfig; 4]) -> Result<Self> {
        for (tier, &expected) in tiers.iter().zip(Difficulty::all_levels()) {
            if tier.difficulty != expected {
                return Err(CorpusError::TierTable(format!(
                    "expected {} in position of {}",
                    expected, tier.difficulty
                )));
            }
            if tier.range.min > tier.range.max {
                return Err(CorpusError::TierTable(format!(
                    "{} range {}..={} is empty",
                    tier.difficulty, tier.range.min, tier.range.max
                )));
            }
        }
        for pair in tiers.windows(2) {
            if u64::from(pair[0].range.max) + 1 != u64::from(pair[1].range.min) {
                return Err(CorpusError::TierTable(format!(
                    "{} ends at {} but {} starts at {}",
                    pair[0].difficulty, pair[0].range.max, pair[1].difficulty, pair[1].range.min
                )));
            }
        }
        Ok(Self { tiers })
    }

    pub fn get(&self, difficulty: Difficulty) -> &TierConfig {
        &self.tiers[difficulty as usize]
    }

    pub fn range(&self, difficulty: Difficulty) -> IdRange {
        self.get(difficulty).range
    }

    pub fn iter(&self) -> impl Iterator<Item = &TierConfig> {
        self.tiers.iter()
    }

    /// Tier whose range contains `id`
    pub fn tier_of_id(&self, id: u32) -> Option<Difficulty> {
        self.tiers
            .iter()
            .find(|t| t.range.contains(id))
            .map(|t| t.difficulty)
    }

    /// Override the box-free reveal count
    pub fn with_subset_reveals(mut self, symbols: usize) -> Self {
        for tier in self.tiers.iter_mut() {
            if let RevealPolicy::FixedSubset { .. } = tier.reveal {
                tier.reveal = RevealPolicy::FixedSubset { symbols };
            }
        }
        self
    }
}

/// Whether a run rebuilds tiers from scratch or tops them up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationMode {
    /// Discard existing tier records and regenerate from the range minimum
    RegenerateAll,
    /// Keep existing records and generate only the shortfall
    #[default]
    Extend,
}

impl GenerationMode {
    /// Environment toggle selecting the mode
    pub const ENV_VAR: &'static str = "REGENERATE_ALL";

    /// Interpret a `REGENERATE_ALL` value; unset or falsy means extend
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => {
                GenerationMode::RegenerateAll
            }
            _ => GenerationMode::Extend,
        }
    }

    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(Self::ENV_VAR).ok().as_deref())
    }
}

/// Configuration for corpus generation
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub tiers: TierTable,
    pub mode: GenerationMode,
    /// Fixed retry allowance per tier run
    pub retry_base: usize,
    /// Retry allowance per missing record
    pub retry_multiplier: usize,
    /// Exact size of each sentence pool
    pub pool_size: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            tiers: TierTable::default(),
            mode: GenerationMode::Extend,
            retry_base: RETRY_BASE,
            retry_multiplier: RETRY_MULTIPLIER,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl GeneratorConfig {
    /// Total candidate attempts allowed for `remaining` missing records
    pub fn retry_budget(&self, remaining: usize) -> usize {
        self.retry_base
            .saturating_add(self.retry_multiplier.saturating_mul(remaining))
    }
}

/// Configuration for the corpus validator
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub tiers: TierTable,
    /// Expected entries per sentence pool; `None` skips the size check
    pub pool_size: Option<usize>,
    /// Characters allowed in pool entries; `None` allows kana and kanji
    pub pool_alphabet: Option<BTreeSet<char>>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            tiers: TierTable::default(),
            pool_size: Some(DEFAULT_POOL_SIZE),
            pool_alphabet: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_contiguous() {
        let table = TierTable::default();
        assert!(TierTable::new(table.tiers).is_ok());
        assert_eq!(table.range(Difficulty::Easy).min, 1);
        assert_eq!(table.range(Difficulty::Expert).max, 40_000);
    }

    #[test]
    fn test_gap_is_rejected() {
        let mut tiers = TierTable::default().tiers;
        tiers[1].range.min += 1;
        assert!(matches!(
            TierTable::new(tiers),
            Err(CorpusError::TierTable(_))
        ));
    }

    #[test]
    fn test_out_of_order_is_rejected() {
        let mut tiers = TierTable::default().tiers;
        tiers.swap(0, 1);
        assert!(TierTable::new(tiers).is_err());
    }

    #[test]
    fn test_tier_of_id() {
        let table = TierTable::default();
        assert_eq!(table.tier_of_id(1), Some(Difficulty::Easy));
        assert_eq!(table.tier_of_id(10_001), Some(Difficulty::Medium));
        assert_eq!(table.tier_of_id(40_000), Some(Difficulty::Expert));
        assert_eq!(table.tier_of_id(0), None);
        assert_eq!(table.tier_of_id(40_001), None);
    }

    #[test]
    fn test_with_subset_reveals_only_touches_box_free() {
        let table = TierTable::default().with_subset_reveals(9);
        assert_eq!(
            table.get(Difficulty::Expert).reveal,
            RevealPolicy::FixedSubset { symbols: 9 }
        );
        assert_eq!(
            table.get(Difficulty::Easy).reveal,
            RevealPolicy::FixedTarget { total: 45 }
        );
    }

    #[test]
    fn test_mode_from_env_value() {
        assert_eq!(GenerationMode::from_env_value(None), GenerationMode::Extend);
        assert_eq!(GenerationMode::from_env_value(Some("")), GenerationMode::Extend);
        assert_eq!(GenerationMode::from_env_value(Some("0")), GenerationMode::Extend);
        assert_eq!(
            GenerationMode::from_env_value(Some("1")),
            GenerationMode::RegenerateAll
        );
        assert_eq!(
            GenerationMode::from_env_value(Some("TRUE")),
            GenerationMode::RegenerateAll
        );
    }

    #[test]
    fn test_retry_budget_scales_with_remaining() {
        let config = GeneratorConfig::default();
        assert_eq!(config.retry_budget(0), RETRY_BASE);
        assert_eq!(config.retry_budget(10), RETRY_BASE + 10 * RETRY_MULTIPLIER);
    }
}
