use crate::Mark;
use serde::{Deserialize, Serialize};

/// `(row, column)`, both zero based.
pub type Coordinates = (usize, usize);

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub coordinates: Coordinates,
    pub mark: Mark,
}

impl Move {
    pub fn new(coordinates: Coordinates, mark: Mark) -> Self {
        Self { coordinates, mark }
    }
}
