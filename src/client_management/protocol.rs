use serde::{Deserialize, Serialize};

use crate::{Board, GameConfig, GameState, GameStatus, LocalGame, Mark, Players};

/// Messages sent by a client to the authority.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateGame {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<i64>,
        #[serde(
            rename = "winLength",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        win_length: Option<i64>,
        #[serde(
            rename = "playerName",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        player_name: Option<String>,
    },
    JoinGame {
        #[serde(rename = "gameId")]
        game_id: String,
        #[serde(rename = "playerName")]
        player_name: String,
    },
    MakeMove {
        row: usize,
        col: usize,
    },
    ResetGame,
}

impl ClientMessage {
    pub fn create_game(config: GameConfig, player_name: Option<String>) -> Self {
        ClientMessage::CreateGame {
            size: Some(config.size() as i64),
            win_length: Some(config.win_length() as i64),
            player_name,
        }
    }
}

/// Messages sent by the authority to its clients.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    GameCreated {
        #[serde(rename = "gameId")]
        game_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<usize>,
        #[serde(
            rename = "winLength",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        win_length: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    GameState {
        game: GameSnapshot,
    },
    Error {
        message: String,
    },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub symbol: Option<Mark>,
}

/// Seat state of a game on the server.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LobbyStatus {
    #[default]
    Waiting,
    Active,
    Finished,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub board: Board,
    pub current_player: Mark,
    #[serde(default = "active")]
    pub status: GameStatus,
    #[serde(default)]
    pub winner: Option<Mark>,
    #[serde(default)]
    pub size: usize,
    #[serde(default)]
    pub win_length: usize,
}

fn active() -> GameStatus {
    GameStatus::Active
}

/// The payload of a `game_state` message. It fully describes the game; a
/// client replaces whatever it had with it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub game_id: String,
    #[serde(default)]
    pub player_x: Option<PlayerInfo>,
    #[serde(default)]
    pub player_o: Option<PlayerInfo>,
    #[serde(default)]
    pub status: LobbyStatus,
    pub board: BoardSnapshot,
}

impl GameSnapshot {
    pub fn new(
        game_id: String,
        player_x: Option<PlayerInfo>,
        player_o: Option<PlayerInfo>,
        game: &LocalGame,
    ) -> Self {
        let state = game.state();
        let status = match (&player_x, &player_o, state.status) {
            (Some(_), Some(_), GameStatus::Active) => LobbyStatus::Active,
            (Some(_), Some(_), _) => LobbyStatus::Finished,
            _ => LobbyStatus::Waiting,
        };
        Self {
            game_id,
            player_x,
            player_o,
            status,
            board: BoardSnapshot {
                board: state.board.clone(),
                current_player: state.current_player,
                status: state.status,
                winner: state.winner,
                size: state.board.size(),
                win_length: state.win_length,
            },
        }
    }

    pub fn seats_filled(&self) -> bool {
        self.player_x.is_some() && self.player_o.is_some()
    }

    /// Projects the snapshot onto the state shown to the player. Returns
    /// `None` while a seat is still empty.
    ///
    /// The authority decides the outcome: a winner means the game is won,
    /// and a finished game without a winner is a draw.
    pub fn to_game_state(&self) -> Option<GameState> {
        let (player_x, player_o) = (self.player_x.as_ref()?, self.player_o.as_ref()?);
        let board = &self.board;

        let status = if board.winner.is_some() || board.status == GameStatus::Won {
            GameStatus::Won
        } else if board.status == GameStatus::Draw || self.status == LobbyStatus::Finished {
            GameStatus::Draw
        } else {
            GameStatus::Active
        };

        let win_length = match board.win_length {
            0 => GameConfig::default_win_length(board.board.size()),
            win_length => win_length,
        };

        Some(GameState {
            board: board.board.clone(),
            current_player: board.current_player,
            status,
            winner: board.winner.filter(|_| status == GameStatus::Won),
            win_length,
            players: Some(Players {
                x: player_x.name.clone(),
                o: player_o.name.clone(),
            }),
        })
    }
}
