use log::{debug, info};

use crate::{
    find_winner, validate_move, Board, Coordinates, GameConfig, GameState, GameStatus,
    InvalidMove, Mark, Move, Players,
};

/// Rules engine for a single game.
///
/// The state only changes through [`LocalGame::apply_move`], which either
/// applies a complete move (placement, win/draw check and turn change) or
/// leaves everything untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalGame {
    config: GameConfig,
    state: GameState,
}

impl Default for LocalGame {
    fn default() -> Self {
        Self::start(GameConfig::default())
    }
}

impl LocalGame {
    pub fn start(config: GameConfig) -> Self {
        let config = GameConfig::normalized(config.size() as i64, config.win_length() as i64);
        info!(
            "starting {0}x{0} game, {1} in a row wins",
            config.size(),
            config.win_length()
        );
        Self {
            config,
            state: GameState {
                board: Board::new(config.size()),
                current_player: Mark::X,
                status: GameStatus::Active,
                winner: None,
                win_length: config.win_length(),
                players: None,
            },
        }
    }

    /// Starts a game from raw size and win length input; see
    /// [`GameConfig::from_input`].
    pub fn start_from_input(size: &str, win_length: &str) -> Self {
        Self::start(GameConfig::from_input(size, win_length))
    }

    pub fn with_players(mut self, players: Players) -> Self {
        self.state.players = Some(players);
        self
    }

    pub fn set_players(&mut self, players: Option<Players>) {
        self.state.players = players;
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn next_player(&self) -> Mark {
        self.state.current_player
    }

    /// Places the current player's mark at `coordinates`.
    ///
    /// Returns the move that was made. On error the game is unchanged.
    pub fn apply_move(&mut self, coordinates: Coordinates) -> Result<Move, InvalidMove> {
        validate_move(&self.state.board, coordinates, self.state.status)?;

        let mark = self.state.current_player;
        let board = self.state.board.set(coordinates, mark)?;

        let (status, winner, current_player) =
            if let Some(winner) = find_winner(&board, self.config.win_length()) {
                info!("{} wins", winner);
                (GameStatus::Won, Some(winner), mark)
            } else if board.is_full() {
                info!("board is full, game ends in a draw");
                (GameStatus::Draw, None, mark)
            } else {
                (GameStatus::Active, None, mark.other())
            };

        self.state = GameState {
            board,
            current_player,
            status,
            winner,
            win_length: self.config.win_length(),
            players: self.state.players.take(),
        };
        debug!("{} played {:?}, status {:?}", mark, coordinates, status);
        Ok(Move::new(coordinates, mark))
    }

    /// Replaces this game with a fresh one using the same config and players.
    pub fn reset(&mut self) {
        let players = self.state.players.take();
        *self = Self::start(self.config);
        self.state.players = players;
    }
}
