use crate::corpus::{read_json, write_json};
use crate::error::{CorpusError, Result};
use crate::grid::SIZE;
use crate::record::PuzzleRecord;
use crate::rng::SeededRng;
use log::{debug, info};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

const ROW_FILLER_LABEL: &str = "pool:rows";
const COLUMN_FILLER_LABEL: &str = "pool:columns";
const FILLER_ATTEMPTS_PER_LINE: usize = 20;

/// Row and column sentence pools of the box-free tier.
///
/// Every entry is nine symbols long; the two pools never share an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentencePools {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
}

impl SentencePools {
    pub fn new(rows: Vec<String>, columns: Vec<String>) -> Self {
        Self { rows, columns }
    }

    /// Load both pool files. Missing, empty or non-string-array files are fatal.
    pub fn load(row_path: &Path, column_path: &Path) -> Result<Self> {
        Ok(Self {
            rows: load_pool(row_path)?,
            columns: load_pool(column_path)?,
        })
    }

    pub fn save(&self, row_path: &Path, column_path: &Path) -> Result<()> {
        write_json(row_path, &self.rows)?;
        write_json(column_path, &self.columns)
    }

    pub fn row_set(&self) -> HashSet<&str> {
        self.rows.iter().map(String::as_str).collect()
    }

    pub fn column_set(&self) -> HashSet<&str> {
        self.columns.iter().map(String::as_str).collect()
    }

    /// Rebuild the pools from box-free records, padded to exactly `size`
    /// entries each with deterministic filler lines drawn from `alphabet`.
    pub fn build<'a>(
        records: impl IntoIterator<Item = &'a PuzzleRecord>,
        alphabet: &BTreeSet<char>,
        size: usize,
    ) -> Result<Self> {
        let mut records: Vec<&PuzzleRecord> = records
            .into_iter()
            .filter(|r| r.difficulty.is_box_free())
            .collect();
        records.sort_by_key(|r| r.id);

        let mut taken: HashSet<String> = HashSet::new();
        let mut rows = Vec::new();
        let mut columns = Vec::new();
        for record in &records {
            for row in &record.template {
                if taken.insert(row.clone()) {
                    rows.push(row.clone());
                }
            }
            for column in record.columns() {
                if taken.insert(column.clone()) {
                    columns.push(column);
                }
            }
        }

        if rows.len() > size {
            return Err(CorpusError::PoolOverflow {
                pool: "row",
                lines: rows.len(),
                size,
            });
        }
        if columns.len() > size {
            return Err(CorpusError::PoolOverflow {
                pool: "column",
                lines: columns.len(),
                size,
            });
        }
        debug!(
            "Pools seeded with {} row and {} column lines from {} records",
            rows.len(),
            columns.len(),
            records.len()
        );

        let alphabet: Vec<char> = alphabet.iter().copied().collect();
        fill("row", &mut rows, &mut taken, &alphabet, size, ROW_FILLER_LABEL)?;
        fill(
            "column",
            &mut columns,
            &mut taken,
            &alphabet,
            size,
            COLUMN_FILLER_LABEL,
        )?;

        info!("Built sentence pools of {} entries each", size);
        Ok(Self { rows, columns })
    }
}

fn load_pool(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(CorpusError::malformed(path, "sentence pool is missing"));
    }
    let pool: Vec<String> = match read_json(path) {
        Ok(pool) => pool,
        Err(CorpusError::Json { source, .. }) => {
            return Err(CorpusError::malformed(
                path,
                format!("expected a JSON array of strings: {}", source),
            ))
        }
        Err(other) => return Err(other),
    };
    if pool.is_empty() {
        return Err(CorpusError::malformed(path, "sentence pool is empty"));
    }
    Ok(pool)
}

fn fill(
    name: &'static str,
    pool: &mut Vec<String>,
    taken: &mut HashSet<String>,
    alphabet: &[char],
    size: usize,
    label: &str,
) -> Result<()> {
    if pool.len() >= size {
        return Ok(());
    }
    if alphabet.len() < SIZE {
        return Err(CorpusError::PoolExhausted {
            pool: name,
            have: pool.len(),
            size,
            attempts: 0,
        });
    }

    let mut rng = SeededRng::from_label(label);
    let mut chars = alphabet.to_vec();
    let budget = size.saturating_mul(FILLER_ATTEMPTS_PER_LINE);
    let mut attempts = 0;
    while pool.len() < size {
        if attempts >= budget {
            return Err(CorpusError::PoolExhausted {
                pool: name,
                have: pool.len(),
                size,
                attempts,
            });
        }
        attempts += 1;
        rng.shuffle(&mut chars);
        let line: String = chars[..SIZE].iter().collect();
        if taken.insert(line.clone()) {
            pool.push(line);
        }
    }
    Ok(())
}
