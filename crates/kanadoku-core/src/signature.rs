use crate::config::TierTable;
use crate::error::Result;
use crate::ids::IdAllocator;
use crate::record::PuzzleRecord;
use crate::Difficulty;
use std::collections::{BTreeMap, HashSet};

/// `symbols.join('|') + "::" + template.join('|')`
pub fn signature<S: AsRef<str>, T: AsRef<str>>(symbols: &[S], template: &[T]) -> String {
    let symbols: Vec<&str> = symbols.iter().map(AsRef::as_ref).collect();
    let template: Vec<&str> = template.iter().map(AsRef::as_ref).collect();
    format!("{}::{}", symbols.join("|"), template.join("|"))
}

/// Set of every signature emitted so far, across all tiers
#[derive(Debug, Clone, Default)]
pub struct SignatureIndex {
    seen: HashSet<String>,
}

impl SignatureIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a signature; `false` if it was already present
    pub fn register(&mut self, signature: String) -> bool {
        self.seen.insert(signature)
    }

    pub fn contains(&self, signature: &str) -> bool {
        self.seen.contains(signature)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Outcome of offering a candidate to the corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// Same symbols and rows as an existing record
    DuplicateSignature,
    /// A box-free line is already used or would sit in both pools
    LineConflict,
}

/// Dedup and id state threaded through a generation run.
///
/// Seeded from every persisted record so that new candidates are unique
/// across the whole corpus, not just their own tier.
#[derive(Debug, Clone)]
pub struct CorpusState {
    pub signatures: SignatureIndex,
    id_cursors: BTreeMap<Difficulty, IdAllocator>,
    used_rows: HashSet<String>,
    used_columns: HashSet<String>,
}

impl CorpusState {
    /// Empty state with allocators at each tier's range minimum
    pub fn new(tiers: &TierTable) -> Self {
        let id_cursors = tiers
            .iter()
            .map(|t| (t.difficulty, IdAllocator::new(t.difficulty, t.range, [])))
            .collect();
        Self {
            signatures: SignatureIndex::new(),
            id_cursors,
            used_rows: HashSet::new(),
            used_columns: HashSet::new(),
        }
    }

    /// State reflecting already persisted records
    pub fn from_records<'a>(
        tiers: &TierTable,
        records: impl IntoIterator<Item = &'a PuzzleRecord>,
    ) -> Self {
        let mut state = Self::new(tiers);
        let mut ids: BTreeMap<Difficulty, Vec<u32>> = BTreeMap::new();
        for record in records {
            state.signatures.register(record.signature());
            if record.difficulty.is_box_free() {
                state.used_rows.extend(record.template.iter().cloned());
                state.used_columns.extend(record.columns());
            }
            ids.entry(record.difficulty).or_default().push(record.id);
        }
        for tier in tiers.iter() {
            let existing = ids.remove(&tier.difficulty).unwrap_or_default();
            state.id_cursors.insert(
                tier.difficulty,
                IdAllocator::new(tier.difficulty, tier.range, existing),
            );
        }
        state
    }

    pub fn allocator(&self, difficulty: Difficulty) -> Option<&IdAllocator> {
        self.id_cursors.get(&difficulty)
    }

    /// Next id for a tier, without consuming it
    pub fn peek_id(&self, difficulty: Difficulty) -> Option<Result<u32>> {
        self.id_cursors.get(&difficulty).map(IdAllocator::peek)
    }

    pub(crate) fn allocator_mut(&mut self, difficulty: Difficulty) -> Option<&mut IdAllocator> {
        self.id_cursors.get_mut(&difficulty)
    }

    /// Register a candidate if it is unique; nothing is recorded on rejection
    pub fn admit(&mut self, record: &PuzzleRecord) -> Admission {
        let sig = record.signature();
        if self.signatures.contains(&sig) {
            return Admission::DuplicateSignature;
        }

        if record.difficulty.is_box_free() {
            let rows = &record.template;
            let columns = record.columns();
            let row_clash = rows.iter().any(|r| {
                self.used_rows.contains(r) || self.used_columns.contains(r) || columns.contains(r)
            });
            let column_clash = columns
                .iter()
                .any(|c| self.used_columns.contains(c) || self.used_rows.contains(c));
            if row_clash || column_clash {
                return Admission::LineConflict;
            }
            self.used_rows.extend(rows.iter().cloned());
            self.used_columns.extend(columns);
        }

        self.signatures.register(sig);
        Admission::Admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(difficulty: Difficulty, id: u32, template: &[&str]) -> PuzzleRecord {
        PuzzleRecord {
            id,
            difficulty,
            title: String::new(),
            symbols: vec!["x".into()],
            template: template.iter().map(|s| s.to_string()).collect(),
            revealed: Vec::new(),
            solution: Vec::new(),
            vocabulary: Vec::new(),
            sentence_hints: None,
        }
    }

    #[test]
    fn test_register_rejects_repeats() {
        let mut index = SignatureIndex::new();
        assert!(index.register("a::b".to_string()));
        assert!(!index.register("a::b".to_string()));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_signature_format() {
        assert_eq!(signature(&["a", "b"], &["ab", "ba"]), "a|b::ab|ba");
    }

    #[test]
    fn test_state_is_global_across_tiers() {
        let tiers = TierTable::default();
        let existing = record(Difficulty::Easy, 1, &["ab", "ba"]);
        let mut state = CorpusState::from_records(&tiers, [&existing]);

        let same_in_other_tier = record(Difficulty::Hard, 20_001, &["ab", "ba"]);
        assert_eq!(state.admit(&same_in_other_tier), Admission::DuplicateSignature);
    }

    #[test]
    fn test_state_cursor_follows_existing_ids() {
        let tiers = TierTable::default();
        let a = record(Difficulty::Medium, 10_005, &["ab"]);
        let state = CorpusState::from_records(&tiers, [&a]);
        assert_eq!(state.peek_id(Difficulty::Medium).unwrap().unwrap(), 10_006);
        assert_eq!(state.peek_id(Difficulty::Easy).unwrap().unwrap(), 1);
    }

    #[test]
    fn test_box_free_lines_must_be_fresh_and_disjoint() {
        let tiers = TierTable::default();
        let mut state = CorpusState::new(&tiers);

        let first = record(Difficulty::Expert, 30_001, &["ab", "cd"]);
        assert_eq!(state.admit(&first), Admission::Admitted);

        // Reuses row "ab"
        let reuse = record(Difficulty::Expert, 30_002, &["ab", "ef"]);
        assert_eq!(state.admit(&reuse), Admission::LineConflict);

        // Row "ac" equals an existing column
        let overlap = record(Difficulty::Expert, 30_002, &["ac", "gh"]);
        assert_eq!(state.admit(&overlap), Admission::LineConflict);

        let fresh = record(Difficulty::Expert, 30_002, &["ij", "kl"]);
        assert_eq!(state.admit(&fresh), Admission::Admitted);
    }

    #[test]
    fn test_rejection_leaves_no_trace() {
        let tiers = TierTable::default();
        let mut state = CorpusState::new(&tiers);
        let first = record(Difficulty::Expert, 30_001, &["ab", "cd"]);
        state.admit(&first);

        let clash = record(Difficulty::Expert, 30_002, &["ab", "zz"]);
        assert_eq!(state.admit(&clash), Admission::LineConflict);
        // "az" was a column of the rejected candidate and must not be recorded
        let later = record(Difficulty::Expert, 30_002, &["az", "qq"]);
        assert_eq!(state.admit(&later), Admission::Admitted);
    }
}
