//! Reveal-mask policies.
//!
//! Both policies are pure functions of the solution grid, the symbol set, the
//! tier's policy and the RNG stream.

use crate::grid::{Grid, Position, SIZE};
use crate::rng::SeededRng;
use crate::symbols::SymbolSet;
use serde::{Deserialize, Serialize};

/// `true` marks a pre-filled cell
pub type RevealMask = [[bool; SIZE]; SIZE];

/// How a tier chooses its pre-filled cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "camelCase")]
pub enum RevealPolicy {
    /// Reveal every syllabic cell, then logographic cells up to `total` cells
    FixedTarget { total: usize },
    /// Reveal one random occurrence of each of `symbols` distinct values
    FixedSubset { symbols: usize },
}

impl RevealPolicy {
    /// Whether syllabic cells are always revealed under this policy
    pub fn auto_reveals_syllabic(&self) -> bool {
        matches!(self, RevealPolicy::FixedTarget { .. })
    }
}

/// Compute the reveal mask for a solved grid
pub fn reveal_mask(
    solution: &Grid,
    symbols: &SymbolSet,
    policy: RevealPolicy,
    rng: &mut SeededRng,
) -> RevealMask {
    match policy {
        RevealPolicy::FixedTarget { total } => fixed_target(solution, symbols, total, rng),
        RevealPolicy::FixedSubset { symbols: count } => fixed_subset(solution, count, rng),
    }
}

fn fixed_target(
    solution: &Grid,
    symbols: &SymbolSet,
    total: usize,
    rng: &mut SeededRng,
) -> RevealMask {
    let mut mask = [[false; SIZE]; SIZE];
    let mut candidates = Vec::new();
    let mut revealed = 0usize;

    for pos in Position::all_9x9() {
        if symbols.class_of_value(solution.get(pos)).is_syllabic() {
            mask[pos.row][pos.col] = true;
            revealed += 1;
        } else {
            candidates.push(pos);
        }
    }

    let extra = total.saturating_sub(revealed);
    if extra == 0 {
        return mask;
    }

    rng.shuffle(&mut candidates);
    for pos in candidates.into_iter().take(extra) {
        mask[pos.row][pos.col] = true;
    }
    mask
}

fn fixed_subset(solution: &Grid, count: usize, rng: &mut SeededRng) -> RevealMask {
    let mut mask = [[false; SIZE]; SIZE];

    let mut values: Vec<u8> = (1..=SIZE as u8)
        .filter(|&v| !solution.positions_of(v).is_empty())
        .collect();
    rng.shuffle(&mut values);

    for value in values.into_iter().take(count) {
        let cells = solution.positions_of(value);
        let pos = cells[rng.next_usize(cells.len())];
        mask[pos.row][pos.col] = true;
    }
    mask
}

/// Mask rows in the persisted `Vec<Vec<bool>>` shape
pub fn mask_to_vecs(mask: &RevealMask) -> Vec<Vec<bool>> {
    mask.iter().map(|row| row.to_vec()).collect()
}

/// Number of revealed cells
pub fn revealed_count(mask: &RevealMask) -> usize {
    mask.iter().flatten().filter(|&&r| r).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::build_permutation;
    use crate::Difficulty;

    fn set(symbols: &[&str]) -> SymbolSet {
        SymbolSet::new(symbols).unwrap()
    }

    fn mixed() -> SymbolSet {
        set(&["あ", "い", "う", "日", "月", "火", "水", "木", "金"])
    }

    #[test]
    fn test_fixed_target_reveals_all_syllabic_cells() {
        let grid = Grid::base();
        let symbols = mixed();
        let mask = reveal_mask(
            &grid,
            &symbols,
            RevealPolicy::FixedTarget { total: 36 },
            &mut SeededRng::new(3),
        );

        for pos in Position::all_9x9() {
            if symbols.class_of_value(grid.get(pos)).is_syllabic() {
                assert!(mask[pos.row][pos.col], "syllabic cell {:?} hidden", pos);
            }
        }
        assert_eq!(revealed_count(&mask), 36);
    }

    #[test]
    fn test_fixed_target_stops_when_syllabic_exceeds_target() {
        let symbols = set(&["あ", "い", "う", "え", "お", "か", "き", "く", "日"]);
        let mask = reveal_mask(
            &Grid::base(),
            &symbols,
            RevealPolicy::FixedTarget { total: 20 },
            &mut SeededRng::new(3),
        );
        // 8 syllabic symbols, 9 cells each
        assert_eq!(revealed_count(&mask), 72);
    }

    #[test]
    fn test_fixed_target_all_logographic() {
        let symbols = set(&["一", "二", "三", "四", "五", "六", "七", "八", "九"]);
        let mask = reveal_mask(
            &Grid::base(),
            &symbols,
            RevealPolicy::FixedTarget { total: 28 },
            &mut SeededRng::new(8),
        );
        assert_eq!(revealed_count(&mask), 28);
    }

    #[test]
    fn test_fixed_subset_reveals_one_cell_per_symbol() {
        let mut rng = SeededRng::new(21);
        let spec = build_permutation(Difficulty::Expert, &mut rng);
        let grid = Grid::base().permute(&spec);
        let mask = reveal_mask(
            &grid,
            &mixed(),
            RevealPolicy::FixedSubset { symbols: 3 },
            &mut rng,
        );

        assert_eq!(revealed_count(&mask), 3);
        let mut values: Vec<u8> = Position::all_9x9()
            .filter(|p| mask[p.row][p.col])
            .map(|p| grid.get(p))
            .collect();
        values.sort_unstable();
        values.dedup();
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_fixed_subset_does_not_auto_reveal_syllabic() {
        let mask = reveal_mask(
            &Grid::base(),
            &mixed(),
            RevealPolicy::FixedSubset { symbols: 0 },
            &mut SeededRng::new(1),
        );
        assert_eq!(revealed_count(&mask), 0);
    }

    #[test]
    fn test_fixed_subset_caps_at_distinct_values() {
        let mask = reveal_mask(
            &Grid::base(),
            &mixed(),
            RevealPolicy::FixedSubset { symbols: 20 },
            &mut SeededRng::new(1),
        );
        assert_eq!(revealed_count(&mask), 9);
    }

    #[test]
    fn test_same_seed_same_mask() {
        let policy = RevealPolicy::FixedTarget { total: 45 };
        let mask = || {
            let mut rng = SeededRng::from_label("easy:1:reveal");
            reveal_mask(&Grid::base(), &mixed(), policy, &mut rng)
        };
        let (a, b) = (mask(), mask());
        assert_eq!(a, b);
    }
}
