//! Whole-record rewrites applied to an existing corpus.
//!
//! Each function returns new records; callers re-validate before writing.

use crate::config::TierTable;
use crate::error::{CorpusError, Result};
use crate::generator::reveal_label;
use crate::grid::Grid;
use crate::record::{canonical_title, PuzzleRecord};
use crate::reveal::{mask_to_vecs, reveal_mask};
use crate::rng::SeededRng;
use log::debug;

/// Rewrite every title to its canonical form
pub fn normalize_titles(records: &[PuzzleRecord], tiers: &TierTable) -> Vec<PuzzleRecord> {
    records
        .iter()
        .map(|record| {
            let range = tiers.range(record.difficulty);
            let title = canonical_title(record.difficulty, record.id, range);
            if title != record.title {
                debug!("#{}: title {:?} -> {:?}", record.id, record.title, title);
            }
            PuzzleRecord {
                title,
                ..record.clone()
            }
        })
        .collect()
}

/// Recompute every reveal mask from the record's reveal label and the tier's
/// current policy
pub fn regenerate_reveals(
    records: &[PuzzleRecord],
    tiers: &TierTable,
) -> Result<Vec<PuzzleRecord>> {
    records
        .iter()
        .map(|record| {
            let label = format!("record #{}", record.id);
            let solution = Grid::from_vecs(&record.solution).ok_or_else(|| {
                CorpusError::malformed(&label, "solution is not a 9x9 grid of 1..=9")
            })?;
            let symbols = record
                .symbol_set()
                .map_err(|e| CorpusError::malformed(&label, e.to_string()))?;

            let policy = tiers.get(record.difficulty).reveal;
            let mut rng = SeededRng::from_label(&reveal_label(record.difficulty, record.id));
            let mask = reveal_mask(&solution, &symbols, policy, &mut rng);

            Ok(PuzzleRecord {
                revealed: mask_to_vecs(&mask),
                ..record.clone()
            })
        })
        .collect()
}

/// Number of records whose content differs between two versions
pub fn count_changed(before: &[PuzzleRecord], after: &[PuzzleRecord]) -> usize {
    before.iter().zip(after).filter(|(a, b)| a != b).count()
}
