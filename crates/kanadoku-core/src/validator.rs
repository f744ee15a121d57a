//! Independent re-derivation of every corpus invariant.
//!
//! The validator never repairs data and never stops early: each defect
//! becomes a [`Violation`] labelled with the file and record it was found in.

use crate::config::ValidatorConfig;
use crate::corpus::{file_label, Corpus};
use crate::grid::{BOX, SIZE};
use crate::pool::SentencePools;
use crate::record::{template_columns, PuzzleRecord};
use crate::reveal::RevealPolicy;
use crate::symbols::SymbolClass;
use crate::Difficulty;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Category of a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ViolationKind {
    WrongTier,
    IdOutOfRange,
    DuplicateId,
    DuplicateSignature,
    SymbolArity,
    SymbolShape,
    DuplicateSymbol,
    TemplateShape,
    UnknownSymbol,
    RowRepeat,
    ColumnRepeat,
    BoxRepeat,
    RevealShape,
    SyllabicHidden,
    RevealCount,
    SolutionShape,
    SolutionMismatch,
    Vocabulary,
    SentenceHint,
    LineRepeat,
    LineReuse,
    LineOverlap,
    PoolMembership,
    PoolEntry,
    PoolDuplicate,
    PoolOverlap,
    PoolSize,
}

/// One invariant violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// `<file>#<id>` for records, the pool file name for pools
    pub label: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.label, self.message)
    }
}

/// Everything the validator found
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
    pub records_checked: usize,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn count(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }
}

const ROW_POOL_LABEL: &str = "rows.json";
const COLUMN_POOL_LABEL: &str = "columns.json";

/// Check a whole corpus, plus the sentence pools when given.
///
/// Without pools the pool-membership checks of box-free records are skipped.
pub fn validate_corpus(
    corpus: &Corpus,
    pools: Option<&SentencePools>,
    config: &ValidatorConfig,
) -> ValidationReport {
    let mut checker = Checker::new(config, pools);
    for (difficulty, records) in corpus.files() {
        for record in records {
            checker.check_record(difficulty, record);
        }
    }
    checker.check_line_overlap();

    let mut report = checker.report;
    if let Some(pools) = pools {
        report.violations.extend(validate_pools(pools, config));
    }
    report
}

/// Check the pools on their own: entry shape, intra-pool duplicates,
/// row/column overlap and the optional exact size
pub fn validate_pools(pools: &SentencePools, config: &ValidatorConfig) -> Vec<Violation> {
    let mut violations = Vec::new();
    check_pool(&mut violations, ROW_POOL_LABEL, &pools.rows, config);
    check_pool(&mut violations, COLUMN_POOL_LABEL, &pools.columns, config);

    let columns = pools.column_set();
    let shared: BTreeSet<&str> = pools
        .rows
        .iter()
        .map(String::as_str)
        .filter(|r| columns.contains(r))
        .collect();
    for entry in shared {
        violations.push(Violation {
            label: "pools".to_string(),
            kind: ViolationKind::PoolOverlap,
            message: format!("{:?} is in both the row and the column pool", entry),
        });
    }
    violations
}

fn check_pool(out: &mut Vec<Violation>, label: &str, pool: &[String], config: &ValidatorConfig) {
    let mut push = |kind, message: String| {
        out.push(Violation {
            label: label.to_string(),
            kind,
            message,
        })
    };

    if let Some(size) = config.pool_size {
        if pool.len() != size {
            push(
                ViolationKind::PoolSize,
                format!("expected {} entries, found {}", size, pool.len()),
            );
        }
    }

    let mut seen = HashSet::with_capacity(pool.len());
    for (index, entry) in pool.iter().enumerate() {
        let len = entry.chars().count();
        if len != SIZE {
            push(
                ViolationKind::PoolEntry,
                format!("entry {} {:?} has {} characters", index, entry, len),
            );
        }
        let allowed = |ch: char| match &config.pool_alphabet {
            Some(alphabet) => alphabet.contains(&ch),
            None => SymbolClass::of_char(ch) != SymbolClass::Other,
        };
        if let Some(bad) = entry.chars().find(|&ch| !allowed(ch)) {
            push(
                ViolationKind::PoolEntry,
                format!("entry {} {:?} uses {:?} outside the alphabet", index, entry, bad),
            );
        }
        if !seen.insert(entry.as_str()) {
            push(
                ViolationKind::PoolDuplicate,
                format!("entry {} {:?} is a duplicate", index, entry),
            );
        }
    }
}

struct Checker<'a> {
    config: &'a ValidatorConfig,
    row_pool: Option<HashSet<&'a str>>,
    column_pool: Option<HashSet<&'a str>>,
    report: ValidationReport,
    id_owner: HashMap<u32, String>,
    signature_owner: HashMap<String, String>,
    row_owner: HashMap<String, String>,
    column_owner: HashMap<String, String>,
}

impl<'a> Checker<'a> {
    fn new(config: &'a ValidatorConfig, pools: Option<&'a SentencePools>) -> Self {
        Self {
            config,
            row_pool: pools.map(SentencePools::row_set),
            column_pool: pools.map(SentencePools::column_set),
            report: ValidationReport::default(),
            id_owner: HashMap::new(),
            signature_owner: HashMap::new(),
            row_owner: HashMap::new(),
            column_owner: HashMap::new(),
        }
    }

    fn push(&mut self, label: &str, kind: ViolationKind, message: String) {
        self.report.violations.push(Violation {
            label: label.to_string(),
            kind,
            message,
        });
    }

    fn check_record(&mut self, file_tier: Difficulty, record: &PuzzleRecord) {
        self.report.records_checked += 1;
        let label = format!("{}#{}", file_label(file_tier), record.id);

        self.check_identity(file_tier, record, &label);
        let symbols = self.check_symbols(record, &label);
        let grid = self.check_template(record, symbols.as_deref(), &label);

        if let Some(grid) = &grid {
            self.check_latin(grid, record.difficulty.is_box_constrained(), &label);
            if !record.difficulty.is_box_constrained() {
                self.check_lines(record, &label);
            }
            self.check_reveal(record, grid, &label);
            if let Some(symbols) = &symbols {
                self.check_solution(record, symbols, grid, &label);
            }
        } else {
            self.check_reveal_shape(record, &label);
        }

        self.check_vocabulary(record, &label);
        self.check_hints(record, &label);
    }

    fn check_identity(&mut self, file_tier: Difficulty, record: &PuzzleRecord, label: &str) {
        if record.difficulty != file_tier {
            self.push(
                label,
                ViolationKind::WrongTier,
                format!("{} record stored in the {} file", record.difficulty, file_tier),
            );
        }

        let range = self.config.tiers.range(record.difficulty);
        if !range.contains(record.id) {
            let owner = match self.config.tiers.tier_of_id(record.id) {
                Some(tier) => format!("{} range", tier),
                None => "no range".to_string(),
            };
            self.push(
                label,
                ViolationKind::IdOutOfRange,
                format!(
                    "id {} outside {} range {}..={}, belongs to {}",
                    record.id, record.difficulty, range.min, range.max, owner
                ),
            );
        }

        if let Some(first) = self.id_owner.get(&record.id).cloned() {
            self.push(
                label,
                ViolationKind::DuplicateId,
                format!("id {} already used by {}", record.id, first),
            );
        } else {
            self.id_owner.insert(record.id, label.to_string());
        }

        let signature = record.signature();
        if let Some(first) = self.signature_owner.get(&signature).cloned() {
            self.push(
                label,
                ViolationKind::DuplicateSignature,
                format!("same symbols and rows as {}", first),
            );
        } else {
            self.signature_owner.insert(signature, label.to_string());
        }
    }

    /// Returns the symbol characters when every symbol is a single character
    fn check_symbols(&mut self, record: &PuzzleRecord, label: &str) -> Option<Vec<char>> {
        if record.symbols.len() != SIZE {
            self.push(
                label,
                ViolationKind::SymbolArity,
                format!("expected {} symbols, found {}", SIZE, record.symbols.len()),
            );
        }

        let mut chars = Vec::with_capacity(record.symbols.len());
        let mut well_formed = true;
        for (index, symbol) in record.symbols.iter().enumerate() {
            let mut it = symbol.chars();
            match (it.next(), it.next()) {
                (Some(ch), None) => chars.push(ch),
                _ => {
                    well_formed = false;
                    self.push(
                        label,
                        ViolationKind::SymbolShape,
                        format!("symbol {} ({:?}) is not a single character", index, symbol),
                    );
                }
            }
        }

        let mut seen = HashSet::new();
        for symbol in &record.symbols {
            if !seen.insert(symbol.as_str()) {
                self.push(
                    label,
                    ViolationKind::DuplicateSymbol,
                    format!("symbol {:?} appears more than once", symbol),
                );
            }
        }

        well_formed.then_some(chars)
    }

    /// Returns the template as a 9x9 character grid when its shape is right
    fn check_template(
        &mut self,
        record: &PuzzleRecord,
        symbols: Option<&[char]>,
        label: &str,
    ) -> Option<Vec<Vec<char>>> {
        let grid: Vec<Vec<char>> = record.template.iter().map(|r| r.chars().collect()).collect();
        let mut ok = true;

        if grid.len() != SIZE {
            ok = false;
            self.push(
                label,
                ViolationKind::TemplateShape,
                format!("expected {} rows, found {}", SIZE, grid.len()),
            );
        }
        for (r, row) in grid.iter().enumerate() {
            if row.len() != SIZE {
                ok = false;
                self.push(
                    label,
                    ViolationKind::TemplateShape,
                    format!("row {} has {} characters", r, row.len()),
                );
            }
        }

        if let Some(symbols) = symbols {
            let unknown: BTreeSet<char> = grid
                .iter()
                .flatten()
                .filter(|ch| !symbols.contains(ch))
                .copied()
                .collect();
            for ch in unknown {
                self.push(
                    label,
                    ViolationKind::UnknownSymbol,
                    format!("template uses {:?} which is not in the symbol set", ch),
                );
            }
        }

        ok.then_some(grid)
    }

    /// Rows and columns hold each symbol once on every tier; boxes only when
    /// the tier is box constrained
    fn check_latin(&mut self, grid: &[Vec<char>], boxes: bool, label: &str) {
        for r in 0..SIZE {
            if has_repeat((0..SIZE).map(|c| grid[r][c])) {
                self.push(label, ViolationKind::RowRepeat, format!("row {} repeats a symbol", r));
            }
        }
        for c in 0..SIZE {
            if has_repeat((0..SIZE).map(|r| grid[r][c])) {
                self.push(
                    label,
                    ViolationKind::ColumnRepeat,
                    format!("column {} repeats a symbol", c),
                );
            }
        }
        if !boxes {
            return;
        }
        for b in 0..SIZE {
            let (br, bc) = ((b / BOX) * BOX, (b % BOX) * BOX);
            if has_repeat((0..SIZE).map(|i| grid[br + i / BOX][bc + i % BOX])) {
                self.push(label, ViolationKind::BoxRepeat, format!("box {} repeats a symbol", b));
            }
        }
    }

    /// Box-free tier: line uniqueness within the record and across the
    /// corpus, and pool membership
    fn check_lines(&mut self, record: &PuzzleRecord, label: &str) {
        let columns = record.columns();

        let line_sets = [("row", &record.template, true), ("column", &columns, false)];
        for (kind_name, lines, is_row) in line_sets {
            let mut seen = HashSet::new();
            for (index, line) in lines.iter().enumerate() {
                if !seen.insert(line.as_str()) {
                    self.push(
                        label,
                        ViolationKind::LineRepeat,
                        format!("{kind_name} {index} {line:?} repeats an earlier {kind_name}"),
                    );
                    continue;
                }

                let owners = if is_row {
                    &mut self.row_owner
                } else {
                    &mut self.column_owner
                };
                let first = owners.get(line).cloned();
                if first.is_none() {
                    owners.insert(line.clone(), label.to_string());
                }
                if let Some(first) = first {
                    self.push(
                        label,
                        ViolationKind::LineReuse,
                        format!("{} {:?} already used by {}", kind_name, line, first),
                    );
                }

                if !self.in_pool(line, is_row) {
                    self.push(
                        label,
                        ViolationKind::PoolMembership,
                        format!("{kind_name} {index} {line:?} is not in the {kind_name} pool"),
                    );
                }
            }
        }
    }

    /// True when the line is in its pool, or when no pools were given
    fn in_pool(&self, line: &str, is_row: bool) -> bool {
        let pool = if is_row { &self.row_pool } else { &self.column_pool };
        pool.as_ref().map_or(true, |pool| pool.contains(line))
    }

    /// Rows and columns of box-free records must never coincide
    fn check_line_overlap(&mut self) {
        let mut shared: Vec<(String, String, String)> = self
            .row_owner
            .iter()
            .filter_map(|(line, row_label)| {
                self.column_owner
                    .get(line)
                    .map(|col_label| (line.clone(), row_label.clone(), col_label.clone()))
            })
            .collect();
        shared.sort();
        for (line, row_label, col_label) in shared {
            self.push(
                &row_label,
                ViolationKind::LineOverlap,
                format!("row {:?} is also a column of {}", line, col_label),
            );
        }
    }

    fn check_reveal_shape(&mut self, record: &PuzzleRecord, label: &str) -> bool {
        let ok = record.revealed.len() == SIZE && record.revealed.iter().all(|r| r.len() == SIZE);
        if !ok {
            self.push(
                label,
                ViolationKind::RevealShape,
                "reveal mask is not 9x9".to_string(),
            );
        }
        ok
    }

    fn check_reveal(&mut self, record: &PuzzleRecord, grid: &[Vec<char>], label: &str) {
        if !self.check_reveal_shape(record, label) {
            return;
        }
        let revealed = |r: usize, c: usize| record.revealed[r][c];
        let total_revealed = record.revealed.iter().flatten().filter(|&&v| v).count();

        match self.config.tiers.get(record.difficulty).reveal {
            RevealPolicy::FixedTarget { total } => {
                let mut syllabic = 0usize;
                let mut hidden = Vec::new();
                for r in 0..SIZE {
                    for c in 0..SIZE {
                        if SymbolClass::of_char(grid[r][c]).is_syllabic() {
                            syllabic += 1;
                            if !revealed(r, c) {
                                hidden.push((r, c));
                            }
                        }
                    }
                }
                if let Some(&(r, c)) = hidden.first() {
                    self.push(
                        label,
                        ViolationKind::SyllabicHidden,
                        format!("{} syllabic cells hidden, first at ({}, {})", hidden.len(), r, c),
                    );
                }
                let expected = syllabic.max(total).min(SIZE * SIZE);
                if total_revealed != expected {
                    self.push(
                        label,
                        ViolationKind::RevealCount,
                        format!("{} cells revealed, expected {}", total_revealed, expected),
                    );
                }
            }
            RevealPolicy::FixedSubset { symbols } => {
                let mut per_symbol: HashMap<char, usize> = HashMap::new();
                for r in 0..SIZE {
                    for c in 0..SIZE {
                        if revealed(r, c) {
                            *per_symbol.entry(grid[r][c]).or_default() += 1;
                        }
                    }
                }
                let mut repeated: Vec<char> = per_symbol
                    .iter()
                    .filter(|(_, n)| **n > 1)
                    .map(|(&ch, _)| ch)
                    .collect();
                repeated.sort_unstable();
                for ch in repeated {
                    self.push(
                        label,
                        ViolationKind::RevealCount,
                        format!("symbol {:?} revealed {} times", ch, per_symbol[&ch]),
                    );
                }

                let distinct: HashSet<char> = grid.iter().flatten().copied().collect();
                let expected = symbols.min(distinct.len());
                if per_symbol.len() != expected {
                    self.push(
                        label,
                        ViolationKind::RevealCount,
                        format!(
                            "{} distinct symbols revealed, expected {}",
                            per_symbol.len(),
                            expected
                        ),
                    );
                }
            }
        }
    }

    fn check_solution(
        &mut self,
        record: &PuzzleRecord,
        symbols: &[char],
        grid: &[Vec<char>],
        label: &str,
    ) {
        let shaped =
            record.solution.len() == SIZE && record.solution.iter().all(|r| r.len() == SIZE);
        if !shaped {
            self.push(
                label,
                ViolationKind::SolutionShape,
                "solution is not 9x9".to_string(),
            );
            return;
        }

        let mut mismatches = Vec::new();
        for r in 0..SIZE {
            for c in 0..SIZE {
                let value = record.solution[r][c];
                if !(1..=SIZE as u8).contains(&value) {
                    self.push(
                        label,
                        ViolationKind::SolutionShape,
                        format!("solution value {} at ({}, {}) outside 1..=9", value, r, c),
                    );
                    continue;
                }
                if symbols.get(usize::from(value) - 1) != Some(&grid[r][c]) {
                    mismatches.push((r, c));
                }
            }
        }
        if let Some(&(r, c)) = mismatches.first() {
            self.push(
                label,
                ViolationKind::SolutionMismatch,
                format!(
                    "{} cells disagree with the template, first at ({}, {})",
                    mismatches.len(),
                    r,
                    c
                ),
            );
        }
    }

    fn check_vocabulary(&mut self, record: &PuzzleRecord, label: &str) {
        for (index, entry) in record.vocabulary.iter().enumerate() {
            if !entry.is_well_formed() {
                self.push(
                    label,
                    ViolationKind::Vocabulary,
                    format!("vocabulary entry {} needs a word, reading and meaning", index),
                );
            }
        }
    }

    fn check_hints(&mut self, record: &PuzzleRecord, label: &str) {
        let hints = match (&record.sentence_hints, record.difficulty.is_box_free()) {
            (None, false) => return,
            (Some(_), false) => {
                self.push(
                    label,
                    ViolationKind::SentenceHint,
                    "box-constrained record carries sentence hints".to_string(),
                );
                return;
            }
            (None, true) => {
                self.push(
                    label,
                    ViolationKind::SentenceHint,
                    "box-free record has no sentence hints".to_string(),
                );
                return;
            }
            (Some(hints), true) => hints,
        };

        let columns = template_columns(&record.template);
        for (kind_name, given, expected, is_row) in [
            ("row", &hints.rows, &record.template, true),
            ("column", &hints.columns, &columns, false),
        ] {
            if given.len() != SIZE {
                self.push(
                    label,
                    ViolationKind::SentenceHint,
                    format!("expected {} {} hints, found {}", SIZE, kind_name, given.len()),
                );
            }
            for (index, hint) in given.iter().enumerate() {
                if expected.get(index) == Some(hint) {
                    // Template lines get their pool check in check_lines.
                    continue;
                }
                self.push(
                    label,
                    ViolationKind::SentenceHint,
                    format!("{} hint {} {:?} does not match the template", kind_name, index, hint),
                );
                if !self.in_pool(hint, is_row) {
                    self.push(
                        label,
                        ViolationKind::PoolMembership,
                        format!("{kind_name} hint {index} {hint:?} is not in the {kind_name} pool"),
                    );
                }
            }
        }
    }
}

fn has_repeat(values: impl Iterator<Item = char>) -> bool {
    let mut seen = HashSet::new();
    values.into_iter().any(|v| !seen.insert(v))
}
