use crate::{Board, Mark};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Active,
    Won,
    Draw,
}

impl GameStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, GameStatus::Active)
    }
}

/// Display names of the two seats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Players {
    pub x: String,
    pub o: String,
}

impl Players {
    pub fn name(&self, mark: Mark) -> &str {
        match mark {
            Mark::X => &self.x,
            Mark::O => &self.o,
        }
    }
}

/// The state handed to rendering, regardless of whether it was computed
/// locally or received from a remote authority.
///
/// `current_player` is meaningless once `status` is terminal, and `winner`
/// is only set when `status` is [`GameStatus::Won`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub board: Board,
    pub current_player: Mark,
    pub status: GameStatus,
    pub winner: Option<Mark>,
    pub win_length: usize,
    pub players: Option<Players>,
}
