use crate::grid::{Grid, SIZE};
use crate::rng::SeededRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Character class of a puzzle symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolClass {
    /// Hiragana and katakana, always pre-revealed under the fixed-target policy
    Syllabic,
    /// CJK ideographs, candidates for being hidden
    Logographic,
    /// Anything else
    Other,
}

impl SymbolClass {
    /// Classify a single code point
    pub fn of_char(ch: char) -> Self {
        match u32::from(ch) {
            0x3041..=0x309F | 0x30A0..=0x30FF => SymbolClass::Syllabic,
            0x4E00..=0x9FFF | 0x3400..=0x4DBF | 0xF900..=0xFAFF => SymbolClass::Logographic,
            _ => SymbolClass::Other,
        }
    }

    /// Classify a symbol by its first code point. Empty symbols are `Other`.
    pub fn of_symbol(symbol: &str) -> Self {
        symbol.chars().next().map_or(SymbolClass::Other, Self::of_char)
    }

    pub fn is_syllabic(&self) -> bool {
        matches!(self, SymbolClass::Syllabic)
    }
}

/// Reasons a list of strings is not a usable symbol set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolSetError {
    #[error("expected 9 symbols, found {0}")]
    WrongArity(usize),
    #[error("symbol {index} ({symbol:?}) must be exactly one character")]
    NotSingleChar { index: usize, symbol: String },
    #[error("symbol {symbol:?} appears more than once")]
    Duplicate { symbol: String },
}

/// Ordered bijection from solution values 1..=9 to single-character symbols.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolSet {
    symbols: [char; SIZE],
}

impl SymbolSet {
    /// Build a symbol set, rejecting wrong arity, multi-character and repeated symbols
    pub fn new<S: AsRef<str>>(symbols: &[S]) -> Result<Self, SymbolSetError> {
        if symbols.len() != SIZE {
            return Err(SymbolSetError::WrongArity(symbols.len()));
        }

        let mut chars = [' '; SIZE];
        let mut seen = HashSet::with_capacity(SIZE);
        for (index, symbol) in symbols.iter().enumerate() {
            let symbol = symbol.as_ref();
            let mut it = symbol.chars();
            let ch = match (it.next(), it.next()) {
                (Some(ch), None) => ch,
                _ => {
                    return Err(SymbolSetError::NotSingleChar {
                        index,
                        symbol: symbol.to_string(),
                    })
                }
            };
            if !seen.insert(ch) {
                return Err(SymbolSetError::Duplicate {
                    symbol: symbol.to_string(),
                });
            }
            chars[index] = ch;
        }

        Ok(Self { symbols: chars })
    }

    /// Symbol for a solution value in 1..=9
    pub fn symbol(&self, value: u8) -> char {
        self.symbols[usize::from(value) - 1]
    }

    /// Solution value (1..=9) of a symbol, if it belongs to the set
    pub fn value_of(&self, ch: char) -> Option<u8> {
        self.symbols
            .iter()
            .position(|&s| s == ch)
            .map(|idx| idx as u8 + 1)
    }

    pub fn chars(&self) -> &[char; SIZE] {
        &self.symbols
    }

    pub fn class_of_value(&self, value: u8) -> SymbolClass {
        SymbolClass::of_char(self.symbol(value))
    }

    /// Symbols as owned strings, in value order
    pub fn to_strings(&self) -> Vec<String> {
        self.symbols.iter().map(|c| c.to_string()).collect()
    }

    /// Permute the value-to-symbol assignment in place
    pub fn shuffle(&mut self, rng: &mut SeededRng) {
        rng.shuffle(&mut self.symbols);
    }

    /// Map a solution grid through the bijection into nine row strings
    pub fn apply(&self, grid: &Grid) -> Vec<String> {
        grid.rows()
            .iter()
            .map(|row| row.iter().map(|&v| self.symbol(v)).collect())
            .collect()
    }
}

/// Map a solution grid through a symbol set into template rows
pub fn apply_symbols(grid: &Grid, symbols: &SymbolSet) -> Vec<String> {
    symbols.apply(grid)
}
