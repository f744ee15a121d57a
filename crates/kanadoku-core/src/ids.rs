use crate::error::{CorpusError, Result};
use crate::Difficulty;
use serde::{Deserialize, Serialize};

/// Inclusive id interval owned by one tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdRange {
    pub min: u32,
    pub max: u32,
}

impl IdRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, id: u32) -> bool {
        (self.min..=self.max).contains(&id)
    }
}

/// Hands out monotonically increasing ids from a tier's range.
///
/// The cursor starts after the largest existing id and never moves back, so
/// an id is never reused even when its record is later removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    difficulty: Difficulty,
    range: IdRange,
    next: u64,
}

impl IdAllocator {
    /// `next = max(existing_max + 1, range.min)`
    pub fn new(
        difficulty: Difficulty,
        range: IdRange,
        existing: impl IntoIterator<Item = u32>,
    ) -> Self {
        let floor = u64::from(range.min);
        let next = existing
            .into_iter()
            .map(|id| u64::from(id) + 1)
            .max()
            .map_or(floor, |after| after.max(floor));
        Self {
            difficulty,
            range,
            next,
        }
    }

    pub fn range(&self) -> IdRange {
        self.range
    }

    /// Ids still available
    pub fn remaining(&self) -> u64 {
        (u64::from(self.range.max) + 1).saturating_sub(self.next)
    }

    /// The id the next `allocate` would return
    pub fn peek(&self) -> Result<u32> {
        if self.next > u64::from(self.range.max) {
            return Err(CorpusError::RangeExhausted {
                difficulty: self.difficulty,
                next: u32::try_from(self.next).unwrap_or(u32::MAX),
                max: self.range.max,
            });
        }
        Ok(self.next as u32)
    }

    pub fn allocate(&mut self) -> Result<u32> {
        let id = self.peek()?;
        self.next += 1;
        Ok(id)
    }

    /// Fail before any work when `count` more ids cannot fit
    pub fn ensure_room(&self, count: usize) -> Result<()> {
        if count as u64 > self.remaining() {
            let overflow = self.next + count as u64 - 1;
            return Err(CorpusError::RangeExhausted {
                difficulty: self.difficulty,
                next: u32::try_from(overflow).unwrap_or(u32::MAX),
                max: self.range.max,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANGE: IdRange = IdRange::new(100, 104);

    #[test]
    fn test_starts_at_range_min_when_empty() {
        let mut alloc = IdAllocator::new(Difficulty::Easy, RANGE, []);
        assert_eq!(alloc.allocate().unwrap(), 100);
        assert_eq!(alloc.allocate().unwrap(), 101);
    }

    #[test]
    fn test_continues_after_existing_max() {
        let mut alloc = IdAllocator::new(Difficulty::Easy, RANGE, [100, 102]);
        assert_eq!(alloc.allocate().unwrap(), 103);
    }

    #[test]
    fn test_ignores_existing_ids_below_range() {
        let mut alloc = IdAllocator::new(Difficulty::Easy, RANGE, [3, 7]);
        assert_eq!(alloc.allocate().unwrap(), 100);
    }

    #[test]
    fn test_exhaustion_is_an_error() {
        let mut alloc = IdAllocator::new(Difficulty::Hard, RANGE, [103]);
        assert_eq!(alloc.allocate().unwrap(), 104);
        match alloc.allocate() {
            Err(CorpusError::RangeExhausted { next, max, .. }) => {
                assert_eq!(next, 105);
                assert_eq!(max, 104);
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }

    #[test]
    fn test_ensure_room() {
        let alloc = IdAllocator::new(Difficulty::Medium, RANGE, [101]);
        assert_eq!(alloc.remaining(), 3);
        assert!(alloc.ensure_room(3).is_ok());
        assert!(alloc.ensure_room(4).is_err());
    }

    #[test]
    fn test_range_contains() {
        assert!(RANGE.contains(100));
        assert!(RANGE.contains(104));
        assert!(!RANGE.contains(105));
    }
}
