use crate::ids::IdRange;
use crate::signature::signature;
use crate::symbols::{SymbolSet, SymbolSetError};
use crate::Difficulty;
use serde::{Deserialize, Serialize};

/// One persisted puzzle.
///
/// Symbols, template and mask are plain strings and vectors of any length, so
/// a record with the wrong shape still loads and the validator reports each
/// defect. The tier name and solution values (0..=255) are strict: a file that
/// breaks either fails to load with [`CorpusError::Json`](crate::CorpusError).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleRecord {
    pub id: u32,
    pub difficulty: Difficulty,
    pub title: String,
    /// Symbol for value `i + 1` at index `i`
    pub symbols: Vec<String>,
    /// Nine rows of nine symbols
    pub template: Vec<String>,
    pub revealed: Vec<Vec<bool>>,
    /// Values 1..=9
    pub solution: Vec<Vec<u8>>,
    #[serde(default)]
    pub vocabulary: Vec<VocabularyEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence_hints: Option<SentenceHints>,
}

impl PuzzleRecord {
    /// Global dedup key of this record
    pub fn signature(&self) -> String {
        signature(&self.symbols, &self.template)
    }

    /// Column strings read off the template
    pub fn columns(&self) -> Vec<String> {
        template_columns(&self.template)
    }

    /// Parse the record's symbols as a bijection
    pub fn symbol_set(&self) -> Result<SymbolSet, SymbolSetError> {
        SymbolSet::new(&self.symbols)
    }
}

/// Column strings of a template, skipping cells missing from short rows
pub fn template_columns(template: &[String]) -> Vec<String> {
    let rows: Vec<Vec<char>> = template.iter().map(|r| r.chars().collect()).collect();
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    (0..width)
        .map(|c| rows.iter().filter_map(|row| row.get(c)).collect())
        .collect()
}

/// A word taught alongside a puzzle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub reading: String,
    #[serde(default)]
    pub meaning: String,
}

impl VocabularyEntry {
    pub fn is_well_formed(&self) -> bool {
        [&self.word, &self.reading, &self.meaning]
            .iter()
            .all(|s| !s.trim().is_empty())
    }
}

/// Row and column sentences of a box-free puzzle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceHints {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
}

/// Input material a tier's puzzles are derived from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPuzzle {
    pub symbols: Vec<String>,
    #[serde(default)]
    pub vocabulary: Vec<VocabularyEntry>,
}

/// Canonical title: display name plus the 1-based position in the tier's range
pub fn canonical_title(difficulty: Difficulty, id: u32, range: IdRange) -> String {
    format!("{} #{}", difficulty, id.saturating_sub(range.min) + 1)
}
