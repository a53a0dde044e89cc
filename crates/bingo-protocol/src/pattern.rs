//! The catalog of winning shapes.
//!
//! A pattern is the subset of a card's 5x5 grid a player must have fully
//! called to win. The catalog is fixed: four shapes, each an explicit list
//! of `(row, col)` coordinates (0-indexed, row-major).
//!
//! It lives in the protocol crate because clients need the same cell list
//! to highlight the shape they are chasing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width and height of a card.
pub const GRID_SIZE: usize = 5;

/// Number of squares on a card.
pub const CARD_CELLS: usize = GRID_SIZE * GRID_SIZE;

/// A `(row, col)` coordinate on the card grid.
pub type Cell = (usize, usize);

const FULL_CELLS: [Cell; 25] = [
    (0, 0), (0, 1), (0, 2), (0, 3), (0, 4),
    (1, 0), (1, 1), (1, 2), (1, 3), (1, 4),
    (2, 0), (2, 1), (2, 2), (2, 3), (2, 4),
    (3, 0), (3, 1), (3, 2), (3, 3), (3, 4),
    (4, 0), (4, 1), (4, 2), (4, 3), (4, 4),
];

// Top row, then the middle column below it.
const T_CELLS: [Cell; 9] = [
    (0, 0), (0, 1), (0, 2), (0, 3), (0, 4),
    (1, 2), (2, 2), (3, 2), (4, 2),
];

// Main diagonal, then the anti-diagonal. The centre appears in both.
const X_CELLS: [Cell; 10] = [
    (0, 0), (1, 1), (2, 2), (3, 3), (4, 4),
    (0, 4), (1, 3), (2, 2), (3, 1), (4, 0),
];

// Left column, then the bottom row to its right.
const L_CELLS: [Cell; 9] = [
    (0, 0), (1, 0), (2, 0), (3, 0), (4, 0),
    (4, 1), (4, 2), (4, 3), (4, 4),
];

/// One of the four winning shapes.
///
/// Serialized by its short key (`"full"`, `"t"`, `"x"`, `"l"`), which is
/// what clients match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    /// Every square on the card.
    Full,
    /// Top row plus the middle column.
    T,
    /// Both diagonals.
    X,
    /// Left column plus the bottom row.
    L,
}

impl Pattern {
    /// The whole catalog, in a fixed order. Round setup picks from this.
    pub const ALL: [Pattern; 4] = [Pattern::Full, Pattern::T, Pattern::X, Pattern::L];

    /// The short key used on the wire.
    pub fn key(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::T => "t",
            Self::X => "x",
            Self::L => "l",
        }
    }

    /// A human-readable label for lobby and game screens.
    pub fn label(self) -> &'static str {
        match self {
            Self::Full => "Full card",
            Self::T => "T shape",
            Self::X => "X shape",
            Self::L => "L shape",
        }
    }

    /// The coordinates that make up this shape.
    ///
    /// May list a coordinate twice (the X crosses itself at the centre);
    /// callers treat this as a set.
    pub fn cells(self) -> &'static [Cell] {
        match self {
            Self::Full => &FULL_CELLS,
            Self::T => &T_CELLS,
            Self::X => &X_CELLS,
            Self::L => &L_CELLS,
        }
    }

    /// Linear card indices (`row * 5 + col`) for this shape.
    pub fn indices(self) -> impl Iterator<Item = usize> {
        self.cells().iter().map(|&(r, c)| r * GRID_SIZE + c)
    }

    /// Looks a pattern up by its wire key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn index_set(p: Pattern) -> HashSet<usize> {
        p.indices().collect()
    }

    #[test]
    fn test_full_covers_every_square() {
        assert_eq!(index_set(Pattern::Full), (0..CARD_CELLS).collect());
    }

    #[test]
    fn test_x_is_both_diagonals() {
        let expected: HashSet<usize> =
            [0, 6, 12, 18, 24, 4, 8, 16, 20].into_iter().collect();
        assert_eq!(index_set(Pattern::X), expected);
    }

    #[test]
    fn test_t_is_top_row_and_middle_column() {
        let expected: HashSet<usize> =
            [0, 1, 2, 3, 4, 7, 12, 17, 22].into_iter().collect();
        assert_eq!(index_set(Pattern::T), expected);
    }

    #[test]
    fn test_l_is_left_column_and_bottom_row() {
        let expected: HashSet<usize> =
            [0, 5, 10, 15, 20, 21, 22, 23, 24].into_iter().collect();
        assert_eq!(index_set(Pattern::L), expected);
    }

    #[test]
    fn test_all_cells_are_on_the_grid() {
        for p in Pattern::ALL {
            for &(r, c) in p.cells() {
                assert!(r < GRID_SIZE && c < GRID_SIZE, "{p}: ({r},{c})");
            }
        }
    }

    #[test]
    fn test_pattern_serializes_as_key() {
        let json = serde_json::to_string(&Pattern::X).unwrap();
        assert_eq!(json, "\"x\"");
        let back: Pattern = serde_json::from_str("\"full\"").unwrap();
        assert_eq!(back, Pattern::Full);
    }

    #[test]
    fn test_from_key() {
        for p in Pattern::ALL {
            assert_eq!(Pattern::from_key(p.key()), Some(p));
        }
        assert_eq!(Pattern::from_key("linea"), None);
    }
}
