//! Runtime puzzle selection: per-tier shuffle bags biased by skip scores.

use crate::store::KeyValueStore;
use crate::Difficulty;
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Store key holding the skip scores
pub const SKIP_SCORES_KEY: &str = "kanadoku.skip_scores";

/// Store key prefix for persisted bags, followed by the tier key
pub const BAG_KEY_PREFIX: &str = "kanadoku.bag.";

/// How often each puzzle id was skipped. Absent ids count as zero.
///
/// Serialized as a JSON object keyed by the decimal id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkipScores {
    counts: BTreeMap<String, u32>,
}

impl SkipScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<S: KeyValueStore>(store: &S) -> Self {
        store.get_json(SKIP_SCORES_KEY).unwrap_or_default()
    }

    pub fn save<S: KeyValueStore>(&self, store: &mut S) {
        store.set_json(SKIP_SCORES_KEY, self);
    }

    pub fn get(&self, id: u32) -> u32 {
        self.counts.get(&id.to_string()).copied().unwrap_or(0)
    }

    /// Bump the count for `id` and return the new value
    pub fn increment(&mut self, id: u32) -> u32 {
        let count = self.counts.entry(id.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Selection weight, `1 / (1 + skips)`
    pub fn weight(&self, id: u32) -> f64 {
        1.0 / (1.0 + f64::from(self.get(id)))
    }
}

/// Order `pool` by descending weight, breaking ties randomly
pub fn weighted_shuffle<R: Rng + ?Sized>(
    pool: &[u32],
    scores: &SkipScores,
    rng: &mut R,
) -> Vec<u32> {
    let mut keyed: Vec<(f64, f64, u32)> = pool
        .iter()
        .map(|&id| (scores.weight(id), rng.gen::<f64>(), id))
        .collect();
    keyed.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.total_cmp(&b.1)));
    keyed.into_iter().map(|(_, _, id)| id).collect()
}

/// Shuffle bag for one tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BagState {
    pub bag: Vec<u32>,
    pub cursor: usize,
    /// Pool size the bag was built from
    pub pool_len: usize,
}

impl BagState {
    /// Draw the next id.
    ///
    /// The bag is rebuilt when it is used up or when the pool size differs
    /// from the one it was built from. An empty pool yields `None`.
    pub fn advance<R: Rng + ?Sized>(
        &self,
        pool: &[u32],
        scores: &SkipScores,
        rng: &mut R,
    ) -> (BagState, Option<u32>) {
        if pool.is_empty() {
            return (BagState::default(), None);
        }

        let mut next = if self.cursor >= self.bag.len() || self.pool_len != pool.len() {
            BagState {
                bag: weighted_shuffle(pool, scores, rng),
                cursor: 0,
                pool_len: pool.len(),
            }
        } else {
            self.clone()
        };

        let id = next.bag.get(next.cursor).copied();
        next.cursor += 1;
        (next, id)
    }

    pub fn remaining(&self) -> usize {
        self.bag.len().saturating_sub(self.cursor)
    }
}

/// Per-tier bags plus skip scores, persisted through a [`KeyValueStore`]
#[derive(Debug)]
pub struct Selector<S: KeyValueStore> {
    store: S,
    scores: SkipScores,
    bags: BTreeMap<Difficulty, BagState>,
}

impl<S: KeyValueStore> Selector<S> {
    /// Read skip scores and any saved bags from `store`
    pub fn new(store: S) -> Self {
        let scores = SkipScores::load(&store);
        let bags = Difficulty::all_levels()
            .iter()
            .filter_map(|&d| store.get_json(&bag_key(d)).map(|bag| (d, bag)))
            .collect();
        Self { store, scores, bags }
    }

    /// Next puzzle id for `difficulty` drawn from `pool`
    pub fn get_next<R: Rng + ?Sized>(
        &mut self,
        difficulty: Difficulty,
        pool: &[u32],
        rng: &mut R,
    ) -> Option<u32> {
        let current = self.bags.get(&difficulty).cloned().unwrap_or_default();
        let (bag, id) = current.advance(pool, &self.scores, rng);
        if bag.cursor == 1 {
            debug!("{}: reshuffled bag of {} puzzles", difficulty, bag.bag.len());
        }
        self.store.set_json(&bag_key(difficulty), &bag);
        self.bags.insert(difficulty, bag);
        id
    }

    /// Record a skip. Bags already drawn keep their order until reshuffled.
    pub fn mark_skipped(&mut self, id: u32) -> u32 {
        let count = self.scores.increment(id);
        self.scores.save(&mut self.store);
        count
    }

    pub fn skip_score(&self, id: u32) -> u32 {
        self.scores.get(id)
    }

    pub fn bag(&self, difficulty: Difficulty) -> Option<&BagState> {
        self.bags.get(&difficulty)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

fn bag_key(difficulty: Difficulty) -> String {
    format!("{}{}", BAG_KEY_PREFIX, difficulty.key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_skip_scores_default_to_zero() {
        let mut scores = SkipScores::new();
        assert_eq!(scores.get(7), 0);
        assert_eq!(scores.increment(7), 1);
        assert_eq!(scores.increment(7), 2);
        assert_eq!(scores.get(7), 2);
        assert!((scores.weight(7) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_skip_scores_json_shape() {
        let mut scores = SkipScores::new();
        scores.increment(42);
        assert_eq!(serde_json::to_string(&scores).unwrap(), r#"{"42":1}"#);
    }

    #[test]
    fn test_unskipped_ids_sort_first() {
        let mut scores = SkipScores::new();
        scores.increment(2);
        scores.increment(4);
        scores.increment(4);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let order = weighted_shuffle(&[1, 2, 3, 4, 5], &scores, &mut rng);
            let mut head: Vec<u32> = order[..3].to_vec();
            head.sort_unstable();
            assert_eq!(head, vec![1, 3, 5]);
            assert_eq!(&order[3..], &[2, 4]);
        }
    }

    #[test]
    fn test_ties_are_not_fixed() {
        let scores = SkipScores::new();
        let mut rng = StdRng::seed_from_u64(1);
        let pool: Vec<u32> = (1..=10).collect();
        let orders: HashSet<Vec<u32>> = (0..20)
            .map(|_| weighted_shuffle(&pool, &scores, &mut rng))
            .collect();
        assert!(orders.len() > 1);
    }

    #[test]
    fn test_bag_draws_every_id_before_repeating() {
        let scores = SkipScores::new();
        let mut rng = StdRng::seed_from_u64(3);
        let pool = [10, 20, 30, 40];

        let mut state = BagState::default();
        let mut drawn = Vec::new();
        for _ in 0..pool.len() {
            let (next, id) = state.advance(&pool, &scores, &mut rng);
            drawn.push(id.unwrap());
            state = next;
        }
        drawn.sort_unstable();
        assert_eq!(drawn, pool.to_vec());
        assert_eq!(state.remaining(), 0);

        let (next, id) = state.advance(&pool, &scores, &mut rng);
        assert!(id.is_some());
        assert_eq!(next.cursor, 1);
        assert_eq!(next.remaining(), 3);
    }

    #[test]
    fn test_bag_rebuilds_when_pool_size_changes() {
        let scores = SkipScores::new();
        let mut rng = StdRng::seed_from_u64(5);
        let (state, _) = BagState::default().advance(&[1, 2, 3], &scores, &mut rng);
        assert_eq!(state.pool_len, 3);

        let (state, id) = state.advance(&[1, 2, 3, 4], &scores, &mut rng);
        assert_eq!(state.pool_len, 4);
        assert_eq!(state.bag.len(), 4);
        assert_eq!(state.cursor, 1);
        assert!(id.is_some());
    }

    #[test]
    fn test_empty_pool_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(0);
        let (state, id) = BagState::default().advance(&[], &SkipScores::new(), &mut rng);
        assert!(id.is_none());
        assert!(state.bag.is_empty());
    }

    #[test]
    fn test_advance_leaves_original_untouched() {
        let mut rng = StdRng::seed_from_u64(9);
        let (state, _) = BagState::default().advance(&[1, 2], &SkipScores::new(), &mut rng);
        let before = state.clone();
        let _ = state.advance(&[1, 2], &SkipScores::new(), &mut rng);
        assert_eq!(state, before);
    }

    #[test]
    fn test_skips_apply_on_next_reshuffle() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut selector = Selector::new(MemoryStore::new());
        let pool = [1, 2, 3];

        let first = selector.get_next(Difficulty::Easy, &pool, &mut rng).unwrap();
        let bag_before = selector.bag(Difficulty::Easy).unwrap().bag.clone();
        selector.mark_skipped(first);
        assert_eq!(selector.bag(Difficulty::Easy).unwrap().bag, bag_before);

        selector.get_next(Difficulty::Easy, &pool, &mut rng);
        selector.get_next(Difficulty::Easy, &pool, &mut rng);
        // Bag used up: the reshuffle moves the skipped id to the back
        selector.get_next(Difficulty::Easy, &pool, &mut rng);
        let bag = &selector.bag(Difficulty::Easy).unwrap().bag;
        assert_eq!(bag.last(), Some(&first));
    }

    #[test]
    fn test_selector_state_survives_reload() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut selector = Selector::new(MemoryStore::new());
        let pool = [5, 6, 7, 8];

        selector.get_next(Difficulty::Hard, &pool, &mut rng);
        selector.mark_skipped(6);
        let saved_bag = selector.bag(Difficulty::Hard).cloned();

        let reloaded = Selector::new(selector.into_store());
        assert_eq!(reloaded.skip_score(6), 1);
        assert_eq!(reloaded.bag(Difficulty::Hard).cloned(), saved_bag);
        assert!(reloaded.bag(Difficulty::Easy).is_none());
    }

    #[test]
    fn test_tiers_have_independent_bags() {
        let mut rng = StdRng::seed_from_u64(17);
        let mut selector = Selector::new(MemoryStore::new());
        selector.get_next(Difficulty::Easy, &[1, 2], &mut rng);
        selector.get_next(Difficulty::Expert, &[30_001, 30_002, 30_003], &mut rng);

        assert_eq!(selector.bag(Difficulty::Easy).unwrap().pool_len, 2);
        assert_eq!(selector.bag(Difficulty::Expert).unwrap().pool_len, 3);
        assert_eq!(selector.store().len(), 2);
    }
}
