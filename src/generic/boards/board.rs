use log::debug;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use thiserror::Error;

use crate::{Coordinates, Field, GameConfig, Mark};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidMove {
    #[error("coordinates are outside the board")]
    OutOfBounds,
    #[error("cell is already occupied")]
    CellOccupied,
    #[error("game is not active")]
    GameNotActive,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidGrid {
    #[error("grid has no rows")]
    Empty,
    #[error("row {row} has {len} cells, expected {size}")]
    NotSquare { row: usize, len: usize, size: usize },
}

/// A square grid of fields. Its size never changes after creation.
///
/// Boards are treated as values: [`Board::set`] returns a new board and
/// leaves the original untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Field>>", into = "Vec<Vec<Field>>")]
pub struct Board {
    data: Array2<Field>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(GameConfig::DEFAULT_SIZE)
    }
}

impl Board {
    pub fn new(size: usize) -> Self {
        Self {
            data: Array2::from_elem((size, size), Field::Vacant),
        }
    }

    pub fn size(&self) -> usize {
        self.data.nrows()
    }

    pub fn contains(&self, coordinates: Coordinates) -> bool {
        coordinates.0 < self.size() && coordinates.1 < self.size()
    }

    pub fn get(&self, coordinates: Coordinates) -> Result<Field, InvalidMove> {
        self.data
            .get(coordinates)
            .copied()
            .ok_or(InvalidMove::OutOfBounds)
    }

    pub fn set(&self, coordinates: Coordinates, mark: Mark) -> Result<Board, InvalidMove> {
        if !self.contains(coordinates) {
            return Err(InvalidMove::OutOfBounds);
        }
        let mut next = self.clone();
        next.data[coordinates] = Field::from(mark);
        debug!("placed {} at {:?}", mark, coordinates);
        Ok(next)
    }

    pub fn is_full(&self) -> bool {
        self.data.iter().all(|field| !field.is_vacant())
    }

    pub fn is_empty(&self) -> bool {
        self.data.iter().all(Field::is_vacant)
    }

    pub(crate) fn fields(&self) -> &Array2<Field> {
        &self.data
    }

    /// Row-major copy of the grid.
    pub fn rows(&self) -> Vec<Vec<Field>> {
        self.data.rows().into_iter().map(|row| row.to_vec()).collect()
    }
}

impl From<Board> for Vec<Vec<Field>> {
    fn from(board: Board) -> Self {
        board.rows()
    }
}

impl TryFrom<Vec<Vec<Field>>> for Board {
    type Error = InvalidGrid;

    fn try_from(rows: Vec<Vec<Field>>) -> Result<Self, Self::Error> {
        let size = rows.len();
        if size == 0 {
            return Err(InvalidGrid::Empty);
        }
        if let Some((row, cells)) = rows.iter().enumerate().find(|(_, r)| r.len() != size) {
            return Err(InvalidGrid::NotSquare {
                row,
                len: cells.len(),
                size,
            });
        }
        let data = Array2::from_shape_vec((size, size), rows.into_iter().flatten().collect())
            .map_err(|_| InvalidGrid::Empty)?;
        Ok(Self { data })
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.data.rows() {
            let line: Vec<&str> = row.iter().map(Field::symbol).collect();
            writeln!(f, "|{}|", line.join("|"))?;
        }
        Ok(())
    }
}
