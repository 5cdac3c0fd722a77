use serde::Serialize;

use crate::{winning_line, Coordinates, Field, GameSource, GameState, GameStatus, Mark};

/// Everything a renderer needs to draw one frame, derived from whichever
/// [`GameSource`] is active. Never written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameView {
    pub game_id: Option<String>,
    pub board: Vec<Vec<Field>>,
    pub player_x: String,
    pub player_o: String,
    /// Whose turn it is; `None` once the game is over or not started.
    pub turn: Option<Mark>,
    pub status_line: String,
    pub input_enabled: bool,
    pub winning_line: Vec<Coordinates>,
    pub notice: Option<String>,
}

impl GameView {
    pub const WAITING: &'static str = "Waiting for another player...";

    pub fn project(source: &dyn GameSource) -> Self {
        Self::from_state(source.current_state().as_ref(), source.game_id(), source.notice())
    }

    pub fn from_state(
        state: Option<&GameState>,
        game_id: Option<String>,
        notice: Option<String>,
    ) -> Self {
        let Some(state) = state else {
            return Self {
                game_id,
                board: Vec::new(),
                player_x: default_name(Mark::X),
                player_o: default_name(Mark::O),
                turn: None,
                status_line: Self::WAITING.to_string(),
                input_enabled: false,
                winning_line: Vec::new(),
                notice,
            };
        };

        let name = |mark: Mark| {
            state
                .players
                .as_ref()
                .map(|players| players.name(mark))
                .filter(|name| !name.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| default_name(mark))
        };

        let status_line = match (state.status, state.winner) {
            (GameStatus::Won, Some(winner)) => format!("Player {} won!", winner),
            (GameStatus::Won, None) => "Game over".to_string(),
            (GameStatus::Draw, _) => "It's a draw!".to_string(),
            (GameStatus::Active, _) => format!("Current Turn: {}", state.current_player),
        };

        Self {
            game_id,
            board: state.board.rows(),
            player_x: name(Mark::X),
            player_o: name(Mark::O),
            turn: state.status.is_active().then_some(state.current_player),
            status_line,
            input_enabled: state.status.is_active(),
            winning_line: match state.status {
                GameStatus::Won => winning_line(&state.board, state.win_length).unwrap_or_default(),
                _ => Vec::new(),
            },
            notice,
        }
    }
}

fn default_name(mark: Mark) -> String {
    format!("Player {}", mark)
}
