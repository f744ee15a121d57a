//! Deterministic PRNG and label hashing.
//!
//! Every randomized generation step seeds a [`SeededRng`] from
//! [`hash_label`] of a human-readable label, so any single puzzle can be
//! regenerated bit-for-bit without replaying the whole corpus.

const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

/// FNV-1a fold of a label's UTF-16 code units into a 32-bit seed.
pub fn hash_label(label: &str) -> u32 {
    label.encode_utf16().fold(FNV_OFFSET_BASIS, |hash, unit| {
        (hash ^ u32::from(unit)).wrapping_mul(FNV_PRIME)
    })
}

/// Closure form of [`SeededRng`]: each call yields the next float in [0, 1).
pub fn seeded_rng(seed: u32) -> impl FnMut() -> f64 {
    let mut rng = SeededRng::new(seed);
    move || rng.next_f64()
}

/// Small xorshift/multiply generator (mulberry32 construction).
///
/// Not suitable for anything security related; it exists to make corpus
/// generation reproducible across runs and platforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Seed from [`hash_label`] of `label`
    pub fn from_label(label: &str) -> Self {
        Self::new(hash_label(label))
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Uniform float in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }

    /// Uniform index in `0..bound`. `bound` must be non-zero.
    pub fn next_usize(&mut self, bound: usize) -> usize {
        debug_assert!(bound > 0, "next_usize called with empty range");
        let idx = (self.next_f64() * bound as f64) as usize;
        idx.min(bound.saturating_sub(1))
    }

    /// Shuffle a slice using Fisher-Yates
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_usize(i + 1);
            slice.swap(i, j);
        }
    }
}

impl Iterator for SeededRng {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.next_f64())
    }
}
