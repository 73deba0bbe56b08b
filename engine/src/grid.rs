/*
* Every cell is in one of four states and moves through them by neighbor count:
* A live (alive or born) cell with fewer than two or more than three live neighbors dies.
* A dead or empty cell with exactly three live neighbors is born.
* A born cell becomes alive on the next generation.
* A dead cell fades to nothing on the next generation.
* An alive cell with two or three live neighbors stays alive.
*/
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Moore neighborhood, in the order neighbors are visited.
const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
];

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellState {
    /// Background: never alive, or fully faded.
    #[default]
    Nothing,
    /// Died on the last generation, fades to `Nothing` next.
    Dead,
    /// Survived at least one full generation.
    Alive,
    /// Came alive on the last generation.
    Born,
}

impl CellState {
    /// Whether this cell counts as a live neighbor.
    pub fn is_live(self) -> bool {
        matches!(self, CellState::Alive | CellState::Born)
    }

    /// The state this cell takes on the next generation.
    pub fn next(self, neighbors: usize) -> CellState {
        use CellState::*;

        match (self, neighbors) {
            (Alive | Born, n) if !(2..=3).contains(&n) => Dead,
            (Nothing | Dead, n) if !(2..=3).contains(&n) => Nothing,
            (Nothing | Dead, 3) => Born,
            (Born, _) => Alive,
            (Dead, _) => Nothing,
            (Nothing, _) => Nothing,
            // Survives with 2 or 3 neighbors
            (Alive, _) => Alive,
        }
    }

    /// The state a user edit flips this cell to.
    pub fn toggled(self) -> CellState {
        match self {
            CellState::Nothing | CellState::Dead => CellState::Alive,
            CellState::Alive | CellState::Born => CellState::Nothing,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            CellState::Nothing => '.',
            CellState::Dead => 'x',
            CellState::Alive => 'o',
            CellState::Born => '+',
        }
    }
}

impl TryFrom<char> for CellState {
    type Error = EngineError;

    fn try_from(symbol: char) -> Result<Self> {
        match symbol {
            '.' => Ok(CellState::Nothing),
            'x' => Ok(CellState::Dead),
            'o' => Ok(CellState::Alive),
            '+' => Ok(CellState::Born),
            other => Err(EngineError::Malformed(format!("unknown cell symbol '{other}'"))),
        }
    }
}

fn check_dimensions(rows: usize, cols: usize) -> Result<()> {
    if rows == 0 || cols == 0 {
        return Err(EngineError::InvalidConfiguration(format!(
            "grid must be at least 1x1, got {rows}x{cols}"
        )));
    }
    Ok(())
}

/// A rectangular, toroidal matrix of cells indexed `[row][col]`.
///
/// Grids are values: every operation that changes cells returns a new grid, so
/// a grid stored in the history is never affected by later edits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<CellState>>", into = "Vec<Vec<CellState>>")]
pub struct Grid {
    cells: Vec<Vec<CellState>>,
}

impl Grid {
    /// A `rows x cols` grid where every cell is `Nothing`.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        check_dimensions(rows, cols)?;
        Ok(Grid {
            cells: vec![vec![CellState::Nothing; cols]; rows],
        })
    }

    /// A grid where each cell is independently `Alive` with `density` percent
    /// probability, else `Nothing`.
    pub fn random<R: Rng + ?Sized>(density: u8, rows: usize, cols: usize, rng: &mut R) -> Result<Self> {
        if density > 100 {
            return Err(EngineError::InvalidConfiguration(format!(
                "seed density must be within 0..=100, got {density}"
            )));
        }
        let mut grid = Grid::new(rows, cols)?;
        for row in grid.cells.iter_mut() {
            for cell in row.iter_mut() {
                if rng.random_range(0..100u8) < density {
                    *cell = CellState::Alive;
                }
            }
        }
        Ok(grid)
    }

    /// Build a grid from explicit rows, rejecting empty or ragged input.
    pub fn from_rows(cells: Vec<Vec<CellState>>) -> Result<Self> {
        let cols = cells.first().map_or(0, Vec::len);
        check_dimensions(cells.len(), cols)?;
        if let Some((index, row)) = cells.iter().enumerate().find(|(_, row)| row.len() != cols) {
            return Err(EngineError::Malformed(format!(
                "row {index} has {} cells, expected {cols}",
                row.len()
            )));
        }
        Ok(Grid { cells })
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn cols(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    pub fn get(&self, row: usize, col: usize) -> Result<CellState> {
        self.cells
            .get(row)
            .and_then(|line| line.get(col))
            .copied()
            .ok_or_else(|| self.out_of_bounds(row, col))
    }

    pub fn set(&mut self, row: usize, col: usize, state: CellState) -> Result<()> {
        let err = self.out_of_bounds(row, col);
        let cell = self
            .cells
            .get_mut(row)
            .and_then(|line| line.get_mut(col))
            .ok_or(err)?;
        *cell = state;
        Ok(())
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[CellState]> {
        self.cells.iter().map(Vec::as_slice)
    }

    /// Number of live (alive or born) cells.
    pub fn population(&self) -> usize {
        self.cells.iter().flatten().filter(|cell| cell.is_live()).count()
    }

    /// Count the live neighbors of a cell, wrapping around the edges.
    pub fn live_neighbors(&self, row: usize, col: usize) -> usize {
        let rows = self.rows() as isize;
        let cols = self.cols() as isize;

        NEIGHBOR_OFFSETS
            .iter()
            .filter(|(dr, dc)| {
                let neighbor_row = (row as isize + dr).rem_euclid(rows) as usize;
                let neighbor_col = (col as isize + dc).rem_euclid(cols) as usize;
                self.cells[neighbor_row][neighbor_col].is_live()
            })
            .count()
    }

    /// Compute the next generation.
    ///
    /// Every cell is derived from `self` only. The flag is `true` iff some cell
    /// ends up in a state other than `Nothing` that differs from its previous
    /// state; transitions into `Nothing` do not count as activity.
    pub fn step(&self) -> (Grid, bool) {
        let (rows, cols) = self.dimensions();
        let mut next = vec![vec![CellState::Nothing; cols]; rows];
        let mut changed = false;

        for row in 0..rows {
            for col in 0..cols {
                let current = self.cells[row][col];
                let state = current.next(self.live_neighbors(row, col));
                if state != CellState::Nothing && state != current {
                    changed = true;
                }
                next[row][col] = state;
            }
        }

        (Grid { cells: next }, changed)
    }

    /// A copy of this grid with one cell toggled.
    pub fn toggled(&self, row: usize, col: usize) -> Result<Grid> {
        let mut grid = self.clone();
        let state = grid.get(row, col)?;
        grid.set(row, col, state.toggled())?;
        Ok(grid)
    }

    /// A `rows x cols` copy keeping the overlapping top-left cells; new cells
    /// are `Nothing`.
    pub fn resized(&self, rows: usize, cols: usize) -> Result<Grid> {
        check_dimensions(rows, cols)?;
        let cells = (0..rows)
            .map(|row| {
                (0..cols)
                    .map(|col| self.get(row, col).unwrap_or_default())
                    .collect()
            })
            .collect();
        Ok(Grid { cells })
    }

    fn out_of_bounds(&self, row: usize, col: usize) -> EngineError {
        EngineError::OutOfBounds {
            row,
            col,
            rows: self.rows(),
            cols: self.cols(),
        }
    }
}

impl TryFrom<Vec<Vec<CellState>>> for Grid {
    type Error = EngineError;

    fn try_from(cells: Vec<Vec<CellState>>) -> Result<Self> {
        Grid::from_rows(cells)
    }
}

impl From<Grid> for Vec<Vec<CellState>> {
    fn from(grid: Grid) -> Self {
        grid.cells
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, row) in self.cells.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            for cell in row {
                write!(f, "{}", cell.symbol())?;
            }
        }
        Ok(())
    }
}

impl FromStr for Grid {
    type Err = EngineError;

    /// Parse one line per row; blank lines and surrounding whitespace are ignored.
    fn from_str(text: &str) -> Result<Self> {
        let cells = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.chars().map(CellState::try_from).collect::<Result<Vec<_>>>())
            .collect::<Result<Vec<_>>>()?;
        Grid::from_rows(cells)
    }
}
