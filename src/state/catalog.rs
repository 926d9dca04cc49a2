//! Static catalog of the rounds every arena plays through, in order.

use std::fmt;

/// Grid dimensions of a round, rendered as `rows x cols` on the wire (e.g. `3x4`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    /// Number of rows in the grid.
    pub rows: u8,
    /// Number of columns in the grid.
    pub cols: u8,
}

impl GridSize {
    /// Total number of cells; valid cell indices are `0..cell_count()`.
    pub fn cell_count(&self) -> u32 {
        u32::from(self.rows) * u32::from(self.cols)
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Immutable catalog entry describing one pattern-recall challenge.
#[derive(Debug, PartialEq, Eq)]
pub struct Round {
    /// 1-based position in the catalog, also the lookup key for the next round.
    pub number: u8,
    /// Grid displayed to the players.
    pub grid_size: GridSize,
    /// Target cells (row-major, 0-based), kept in ascending order.
    pub pattern: &'static [u32],
}

const ROUNDS: [Round; 3] = [
    Round {
        number: 1,
        grid_size: GridSize { rows: 3, cols: 3 },
        pattern: &[2, 4, 5],
    },
    Round {
        number: 2,
        grid_size: GridSize { rows: 3, cols: 4 },
        pattern: &[1, 3, 6, 7],
    },
    Round {
        number: 3,
        grid_size: GridSize { rows: 4, cols: 4 },
        pattern: &[0, 5, 10, 15],
    },
];

/// Ordered view over the built-in rounds.
#[derive(Debug, Clone, Copy)]
pub struct RoundCatalog {
    rounds: &'static [Round],
}

impl Default for RoundCatalog {
    fn default() -> Self {
        Self { rounds: &ROUNDS }
    }
}

impl RoundCatalog {
    /// Catalog backed by the built-in round definitions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Round every game starts with.
    pub fn first(&self) -> &'static Round {
        &self.rounds[0]
    }

    /// Look a round up by its number.
    pub fn get(&self, number: u8) -> Option<&'static Round> {
        self.rounds.iter().find(|round| round.number == number)
    }

    /// Round that follows `number`, or `None` once the catalog is exhausted.
    pub fn next_after(&self, number: u8) -> Option<&'static Round> {
        number.checked_add(1).and_then(|next| self.get(next))
    }

    /// Number of rounds in a full game.
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    /// Whether the catalog holds no rounds at all.
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_are_sequenced_one_to_three() {
        let catalog = RoundCatalog::new();
        let first = catalog.first();
        assert_eq!(first.number, 1);

        let second = catalog.next_after(first.number).unwrap();
        assert_eq!(second.number, 2);
        assert_eq!(second.grid_size.to_string(), "3x4");
        assert_eq!(second.pattern, &[1, 3, 6, 7]);

        let third = catalog.next_after(second.number).unwrap();
        assert_eq!(third.number, 3);
        assert!(catalog.next_after(third.number).is_none());
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn patterns_are_canonical_and_fit_their_grid() {
        let catalog = RoundCatalog::new();
        for number in 1..=3 {
            let round = catalog.get(number).unwrap();
            assert!(round.pattern.windows(2).all(|pair| pair[0] < pair[1]));
            assert!(
                round
                    .pattern
                    .iter()
                    .all(|cell| *cell < round.grid_size.cell_count())
            );
        }
    }

    #[test]
    fn grid_size_renders_rows_by_cols() {
        assert_eq!(GridSize { rows: 3, cols: 3 }.to_string(), "3x3");
        assert_eq!(GridSize { rows: 4, cols: 4 }.cell_count(), 16);
    }
}
