use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of cells per side of the grid.
pub const GRID_SIDE: usize = 3;
/// Total number of cells. Every intensity vector has exactly this length.
pub const CELL_COUNT: usize = GRID_SIDE * GRID_SIDE;

/// Index of a single grid cell, row-major:
///
/// ```text
/// 0 1 2
/// 3 4 5
/// 6 7 8
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Cell(u8);

impl Cell {
    pub const CENTER: Cell = Cell(4);

    /// All cells in row-major order.
    pub const ALL: [Cell; CELL_COUNT] = [
        Cell(0),
        Cell(1),
        Cell(2),
        Cell(3),
        Cell(4),
        Cell(5),
        Cell(6),
        Cell(7),
        Cell(8),
    ];

    /// Returns `None` when `index` falls outside the grid.
    pub fn new(index: usize) -> Option<Self> {
        if index < CELL_COUNT {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn row(self) -> usize {
        self.index() / GRID_SIDE
    }

    pub fn col(self) -> usize {
        self.index() % GRID_SIDE
    }
}

impl TryFrom<u8> for Cell {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Cell::new(value as usize).ok_or_else(|| format!("cell index {value} is outside 0..=8"))
    }
}

impl From<Cell> for u8 {
    fn from(cell: Cell) -> Self {
        cell.0
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Brightness of every cell at one instant, each value in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Intensities([f64; CELL_COUNT]);

impl Intensities {
    pub fn dark() -> Self {
        Self::default()
    }

    pub fn get(&self, cell: Cell) -> f64 {
        self.0[cell.index()]
    }

    pub fn values(&self) -> &[f64; CELL_COUNT] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Cell, f64)> + '_ {
        Cell::ALL.into_iter().map(move |cell| (cell, self.get(cell)))
    }

    /// Brightest value in the grid.
    pub fn peak(&self) -> f64 {
        self.0.iter().copied().fold(0.0, f64::max)
    }

    /// Largest per-cell difference between two vectors.
    pub fn max_abs_diff(&self, other: &Intensities) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    /// Layers `value` onto `cell`. Contributions never add up: the brighter
    /// of the two wins.
    pub(crate) fn combine_max(&mut self, cell: Cell, value: f64) {
        let slot = &mut self.0[cell.index()];
        if value > *slot {
            *slot = value;
        }
    }

    /// Forces every cell into `[0, 1]`, mapping NaN to dark.
    pub(crate) fn clamped(mut self) -> Self {
        for value in &mut self.0 {
            *value = if value.is_nan() {
                0.0
            } else {
                value.clamp(0.0, 1.0)
            };
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_cells() {
        assert!(Cell::new(8).is_some());
        assert!(Cell::new(9).is_none());
        assert!(Cell::try_from(12_u8).is_err());
    }

    #[test]
    fn row_major_layout() {
        let cell = Cell::new(5).unwrap();
        assert_eq!((cell.row(), cell.col()), (1, 2));
        assert_eq!(Cell::CENTER.row(), 1);
        assert_eq!(Cell::CENTER.col(), 1);
    }

    #[test]
    fn combine_keeps_the_brighter_value() {
        let mut grid = Intensities::dark();
        grid.combine_max(Cell::CENTER, 0.6);
        grid.combine_max(Cell::CENTER, 0.3);
        assert_eq!(grid.get(Cell::CENTER), 0.6);
    }

    #[test]
    fn clamp_removes_nan_and_overflow() {
        let grid = Intensities([f64::NAN, -1.0, 2.0, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0]).clamped();
        assert_eq!(&grid.values()[..4], &[0.0, 0.0, 1.0, 0.5]);
    }

    #[test]
    fn serializes_as_plain_array() {
        let json = serde_json::to_string(&Intensities::dark()).unwrap();
        assert_eq!(json, "[0.0,0.0,0.0,0.0,0.0,0.0,0.0,0.0,0.0]");
    }
}
