use thiserror::Error;

use crate::{ChannelError, Coordinates, GameConfig, GameState, InvalidMove, LocalGame};

/// Something the player asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    CreateGame {
        config: GameConfig,
        player_name: Option<String>,
    },
    JoinGame {
        game_id: String,
        player_name: String,
    },
    MakeMove {
        coordinates: Coordinates,
    },
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("invalid move: {0}")]
    InvalidMove(#[from] InvalidMove),
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error("no game in progress")]
    NoGameInProgress,
    #[error("{0}")]
    MissingInput(&'static str),
    #[error("{0} is not available in this mode")]
    Unsupported(&'static str),
}

/// Where the state shown to the player comes from.
///
/// [`LocalGame`] evaluates the rules itself. A remote session forwards
/// intents to the authority and reports whatever snapshot it sent last.
pub trait GameSource {
    fn current_state(&self) -> Option<GameState>;

    fn apply_intent(&mut self, intent: Intent) -> Result<(), SourceError>;

    /// A message for the player, such as the last error.
    fn notice(&self) -> Option<String> {
        None
    }

    /// Identifier of the game, if the source has one.
    fn game_id(&self) -> Option<String> {
        None
    }
}

impl GameSource for LocalGame {
    fn current_state(&self) -> Option<GameState> {
        Some(self.state().clone())
    }

    fn apply_intent(&mut self, intent: Intent) -> Result<(), SourceError> {
        match intent {
            Intent::CreateGame { config, .. } => {
                let players = self.state().players.clone();
                *self = LocalGame::start(config);
                self.set_players(players);
            }
            Intent::MakeMove { coordinates } => {
                self.apply_move(coordinates)?;
            }
            Intent::Reset => self.reset(),
            Intent::JoinGame { .. } => return Err(SourceError::Unsupported("joining a game")),
        }
        Ok(())
    }
}
