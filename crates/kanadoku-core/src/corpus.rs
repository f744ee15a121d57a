//! JSON persistence of corpus, seed and pool files.

use crate::error::{CorpusError, Result};
use crate::record::{PuzzleRecord, SeedPuzzle};
use crate::symbols::SymbolSet;
use crate::Difficulty;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File layout of a corpus directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusLayout {
    root: PathBuf,
}

impl CorpusLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `puzzles/<tier>.json`
    pub fn puzzle_file(&self, difficulty: Difficulty) -> PathBuf {
        self.root
            .join("puzzles")
            .join(format!("{}.json", difficulty.key()))
    }

    /// `seeds/<tier>.json`
    pub fn seed_file(&self, difficulty: Difficulty) -> PathBuf {
        self.root
            .join("seeds")
            .join(format!("{}.json", difficulty.key()))
    }

    pub fn row_pool_file(&self) -> PathBuf {
        self.root.join("pools").join("rows.json")
    }

    pub fn column_pool_file(&self) -> PathBuf {
        self.root.join("pools").join("columns.json")
    }
}

/// Label used in validator output for a tier file
pub fn file_label(difficulty: Difficulty) -> String {
    format!("{}.json", difficulty.key())
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).map_err(|source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CorpusError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a whole file, replacing any previous content
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| CorpusError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|source| CorpusError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|source| CorpusError::Io {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a tier file; a missing file is an empty tier
pub fn load_records(path: &Path) -> Result<Vec<PuzzleRecord>> {
    if !path.exists() {
        debug!("No corpus file at {:?}", path);
        return Ok(Vec::new());
    }
    read_json(path)
}

/// Write a tier file sorted by ascending id
pub fn save_records(path: &Path, records: &[PuzzleRecord]) -> Result<()> {
    let mut sorted: Vec<&PuzzleRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.id);
    write_json(path, &sorted)
}

/// Load and check a seed file. Missing, empty or malformed files are fatal.
pub fn load_seeds(path: &Path) -> Result<Vec<SeedPuzzle>> {
    if !path.exists() {
        return Err(CorpusError::malformed(path, "seed file is missing"));
    }
    let seeds: Vec<SeedPuzzle> = match read_json(path) {
        Ok(seeds) => seeds,
        Err(CorpusError::Json { source, .. }) => {
            return Err(CorpusError::malformed(path, source.to_string()))
        }
        Err(other) => return Err(other),
    };
    if seeds.is_empty() {
        return Err(CorpusError::malformed(path, "seed file is empty"));
    }
    for (index, seed) in seeds.iter().enumerate() {
        SymbolSet::new(&seed.symbols)
            .map_err(|e| CorpusError::malformed(path, format!("seed {}: {}", index, e)))?;
    }
    Ok(seeds)
}

/// All persisted records, grouped by the tier file they live in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    tiers: BTreeMap<Difficulty, Vec<PuzzleRecord>>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every tier file present under the layout
    pub fn load(layout: &CorpusLayout) -> Result<Self> {
        let mut corpus = Self::new();
        for &difficulty in Difficulty::all_levels() {
            let records = load_records(&layout.puzzle_file(difficulty))?;
            corpus.tiers.insert(difficulty, records);
        }
        Ok(corpus)
    }

    /// Write every tier file, sorted by id
    pub fn save(&self, layout: &CorpusLayout) -> Result<()> {
        for (&difficulty, records) in &self.tiers {
            save_records(&layout.puzzle_file(difficulty), records)?;
        }
        Ok(())
    }

    pub fn records(&self, difficulty: Difficulty) -> &[PuzzleRecord] {
        self.tiers.get(&difficulty).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace a tier's records wholesale
    pub fn set_records(&mut self, difficulty: Difficulty, records: Vec<PuzzleRecord>) {
        self.tiers.insert(difficulty, records);
    }

    pub fn take_records(&mut self, difficulty: Difficulty) -> Vec<PuzzleRecord> {
        self.tiers.remove(&difficulty).unwrap_or_default()
    }

    pub fn all_records(&self) -> impl Iterator<Item = &PuzzleRecord> {
        self.tiers.values().flatten()
    }

    /// Tier files with their records, in tier order
    pub fn files(&self) -> impl Iterator<Item = (Difficulty, &[PuzzleRecord])> {
        self.tiers.iter().map(|(&d, r)| (d, r.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.tiers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
