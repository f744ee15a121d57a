//! Kanadoku corpus engine
//!
//! Deterministic generation, deduplication and validation of 9x9 Latin-square
//! puzzles written with kana and kanji instead of digits, plus the shuffle bag
//! used to hand puzzles out fairly at play time.

pub mod config;
pub mod corpus;
pub mod difficulty;
pub mod error;
pub mod generator;
pub mod grid;
pub mod ids;
pub mod maintenance;
pub mod pool;
pub mod record;
pub mod reveal;
pub mod rng;
pub mod selection;
pub mod signature;
pub mod store;
pub mod symbols;
pub mod validator;

pub use config::{GenerationMode, GeneratorConfig, TierConfig, TierTable, ValidatorConfig};
pub use corpus::{Corpus, CorpusLayout};
pub use difficulty::Difficulty;
pub use error::{CorpusError, Result};
pub use generator::{generate_corpus, generate_tier, GenerationReport, SeedSet};
pub use grid::{build_permutation, permute_grid, Grid, PermutationSpec, Position};
pub use ids::{IdAllocator, IdRange};
pub use maintenance::{normalize_titles, regenerate_reveals};
pub use pool::SentencePools;
pub use record::{PuzzleRecord, SeedPuzzle, SentenceHints, VocabularyEntry};
pub use reveal::{reveal_mask, RevealMask, RevealPolicy};
pub use rng::{hash_label, seeded_rng, SeededRng};
pub use selection::{weighted_shuffle, BagState, Selector, SkipScores};
pub use signature::{signature, CorpusState, SignatureIndex};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use symbols::{SymbolClass, SymbolSet, SymbolSetError};
pub use validator::{validate_corpus, validate_pools, ValidationReport, Violation, ViolationKind};
