use crate::rng::SeededRng;
use crate::Difficulty;
use serde::{Deserialize, Serialize};

/// Side length of every grid
pub const SIZE: usize = 9;
/// Side length of a box, band or stack
pub const BOX: usize = 3;

/// A cell position on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Index of the 3x3 box containing this position
    pub fn box_index(&self) -> usize {
        (self.row / BOX) * BOX + self.col / BOX
    }

    /// All 81 positions in row-major order
    pub fn all_9x9() -> impl Iterator<Item = Position> {
        (0..SIZE).flat_map(|row| (0..SIZE).map(move |col| Position::new(row, col)))
    }
}

/// Fully filled 9x9 grid of solution values 1..=9
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    cells: [[u8; SIZE]; SIZE],
}

impl Grid {
    /// The canonical base grid, `((row*3 + row/3 + col) mod 9) + 1`.
    ///
    /// It satisfies row, column and box uniqueness; every generated solution
    /// is a permutation of it.
    pub fn base() -> Self {
        let mut cells = [[0u8; SIZE]; SIZE];
        for (row, line) in cells.iter_mut().enumerate() {
            for (col, cell) in line.iter_mut().enumerate() {
                *cell = ((row * BOX + row / BOX + col) % SIZE) as u8 + 1;
            }
        }
        Self { cells }
    }

    /// Parse persisted solution rows; `None` unless 9x9 with values 1..=9
    pub fn from_vecs(rows: &[Vec<u8>]) -> Option<Self> {
        if rows.len() != SIZE {
            return None;
        }
        let mut cells = [[0u8; SIZE]; SIZE];
        for (line, row) in cells.iter_mut().zip(rows) {
            if row.len() != SIZE || row.iter().any(|v| !(1..=SIZE as u8).contains(v)) {
                return None;
            }
            line.copy_from_slice(row);
        }
        Some(Self { cells })
    }

    pub fn get(&self, pos: Position) -> u8 {
        self.cells[pos.row][pos.col]
    }

    pub fn rows(&self) -> &[[u8; SIZE]; SIZE] {
        &self.cells
    }

    /// Solution rows in the persisted `Vec<Vec<u8>>` shape
    pub fn to_vecs(&self) -> Vec<Vec<u8>> {
        self.cells.iter().map(|row| row.to_vec()).collect()
    }

    /// Apply a row/column permutation to this grid
    pub fn permute(&self, spec: &PermutationSpec) -> Grid {
        permute_grid(self, &spec.rows, &spec.cols)
    }

    /// Positions holding `value`, row-major
    pub fn positions_of(&self, value: u8) -> Vec<Position> {
        Position::all_9x9().filter(|&p| self.get(p) == value).collect()
    }

    /// Every row and column holds each value exactly once
    pub fn is_latin(&self) -> bool {
        (0..SIZE).all(|i| {
            unit_is_complete((0..SIZE).map(|c| self.cells[i][c]))
                && unit_is_complete((0..SIZE).map(|r| self.cells[r][i]))
        })
    }

    /// Every 3x3 box holds each value exactly once
    pub fn boxes_valid(&self) -> bool {
        (0..SIZE).all(|b| {
            let (br, bc) = ((b / BOX) * BOX, (b % BOX) * BOX);
            unit_is_complete(
                (0..SIZE).map(|i| self.cells[br + i / BOX][bc + i % BOX]),
            )
        })
    }
}

fn unit_is_complete(values: impl Iterator<Item = u8>) -> bool {
    let mut seen = [false; SIZE + 1];
    for v in values {
        let v = usize::from(v);
        if v == 0 || v > SIZE || seen[v] {
            return false;
        }
        seen[v] = true;
    }
    true
}

/// Row and column index permutations applied to the base grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PermutationSpec {
    pub rows: [usize; SIZE],
    pub cols: [usize; SIZE],
}

impl PermutationSpec {
    pub fn identity() -> Self {
        let ident = std::array::from_fn(|i| i);
        Self {
            rows: ident,
            cols: ident,
        }
    }
}

/// Build a row/column permutation for a tier.
///
/// Box-constrained tiers shuffle the three bands (stacks) and then the three
/// lines inside each band independently, which keeps every 3x3 box intact.
/// The box-free tier shuffles all nine indices freely.
pub fn build_permutation(difficulty: Difficulty, rng: &mut SeededRng) -> PermutationSpec {
    if difficulty.is_box_free() {
        PermutationSpec {
            rows: free_permutation(rng),
            cols: free_permutation(rng),
        }
    } else {
        PermutationSpec {
            rows: banded_permutation(rng),
            cols: banded_permutation(rng),
        }
    }
}

fn banded_permutation(rng: &mut SeededRng) -> [usize; SIZE] {
    let mut bands = [0, 1, 2];
    rng.shuffle(&mut bands);

    let mut out = [0usize; SIZE];
    let mut idx = 0;
    for band in bands {
        let mut inner = [0, 1, 2];
        rng.shuffle(&mut inner);
        for line in inner {
            out[idx] = band * BOX + line;
            idx += 1;
        }
    }
    out
}

fn free_permutation(rng: &mut SeededRng) -> [usize; SIZE] {
    let mut out: [usize; SIZE] = std::array::from_fn(|i| i);
    rng.shuffle(&mut out);
    out
}

/// `grid[r][c] = base[row_perm[r]][col_perm[c]]`
pub fn permute_grid(base: &Grid, row_perm: &[usize; SIZE], col_perm: &[usize; SIZE]) -> Grid {
    let mut cells = [[0u8; SIZE]; SIZE];
    for (r, line) in cells.iter_mut().enumerate() {
        for (c, cell) in line.iter_mut().enumerate() {
            *cell = base.cells[row_perm[r]][col_perm[c]];
        }
    }
    Grid { cells }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_grid_is_latin_with_boxes() {
        let base = Grid::base();
        assert_eq!(base.rows()[0], [1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(base.rows()[1], [4, 5, 6, 7, 8, 9, 1, 2, 3]);
        assert_eq!(base.rows()[3], [2, 3, 4, 5, 6, 7, 8, 9, 1]);
        assert!(base.is_latin());
        assert!(base.boxes_valid());
    }

    #[test]
    fn test_identity_permutation_is_noop() {
        let base = Grid::base();
        assert_eq!(base.permute(&PermutationSpec::identity()), base);
    }

    #[test]
    fn test_banded_permutation_preserves_boxes() {
        for seed in 0..50 {
            let mut rng = SeededRng::new(seed);
            let spec = build_permutation(Difficulty::Hard, &mut rng);
            let grid = Grid::base().permute(&spec);
            assert!(grid.is_latin(), "seed {}", seed);
            assert!(grid.boxes_valid(), "seed {}", seed);
        }
    }

    #[test]
    fn test_banded_permutation_keeps_lines_in_bands() {
        let mut rng = SeededRng::new(11);
        let spec = build_permutation(Difficulty::Easy, &mut rng);
        for chunk in spec.rows.chunks(BOX) {
            let band = chunk[0] / BOX;
            assert!(chunk.iter().all(|&r| r / BOX == band));
        }
    }

    #[test]
    fn test_free_permutation_stays_latin() {
        let mut broke_a_box = false;
        for seed in 0..50 {
            let mut rng = SeededRng::new(seed);
            let spec = build_permutation(Difficulty::Expert, &mut rng);
            let grid = Grid::base().permute(&spec);
            assert!(grid.is_latin(), "seed {}", seed);
            broke_a_box |= !grid.boxes_valid();
        }
        assert!(broke_a_box, "free permutations should not preserve boxes");
    }

    #[test]
    fn test_permute_grid_formula() {
        let base = Grid::base();
        let rows = [8, 7, 6, 5, 4, 3, 2, 1, 0];
        let cols = [1, 0, 2, 3, 4, 5, 6, 7, 8];
        let grid = permute_grid(&base, &rows, &cols);
        for r in 0..SIZE {
            for c in 0..SIZE {
                assert_eq!(
                    grid.get(Position::new(r, c)),
                    base.get(Position::new(rows[r], cols[c]))
                );
            }
        }
    }

    #[test]
    fn test_from_vecs() {
        let base = Grid::base();
        assert_eq!(Grid::from_vecs(&base.to_vecs()), Some(base));

        let mut short = Grid::base().to_vecs();
        short.pop();
        assert_eq!(Grid::from_vecs(&short), None);

        let mut zero = Grid::base().to_vecs();
        zero[4][4] = 0;
        assert_eq!(Grid::from_vecs(&zero), None);
    }

    #[test]
    fn test_positions_of_finds_nine_cells() {
        let grid = Grid::base();
        for v in 1..=9 {
            assert_eq!(grid.positions_of(v).len(), 9);
        }
    }
}
