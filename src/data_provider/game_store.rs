use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{Arc, Mutex},
};

use log::{debug, info};
use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;

use crate::{Coordinates, GameConfig, GameSnapshot, InvalidMove, LocalGame, Mark, Move, PlayerInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("could not acquire lock on the game store")]
    LockError,
    #[error("game not found")]
    GameNotFound,
    #[error("waiting for another player")]
    WaitingForPlayers,
    #[error("{0}")]
    InvalidMove(#[from] InvalidMove),
}

struct StoredGame {
    game: LocalGame,
    player_x: Option<PlayerInfo>,
    player_o: Option<PlayerInfo>,
    updates: watch::Sender<GameSnapshot>,
}

impl StoredGame {
    fn snapshot(&self, game_id: &str) -> GameSnapshot {
        GameSnapshot::new(
            game_id.to_string(),
            self.player_x.clone(),
            self.player_o.clone(),
            &self.game,
        )
    }

    fn publish(&self, game_id: &str) {
        self.updates.send_replace(self.snapshot(game_id));
    }
}

/// In-memory games of the authority server.
///
/// Every game has a watch channel that always holds its latest snapshot;
/// connections bound to the game subscribe to it.
#[derive(Clone, Default)]
pub struct GameStore {
    games: Arc<Mutex<HashMap<String, StoredGame>>>,
}

impl GameStore {
    /// Length of the generated game ids.
    pub const ID_LENGTH: usize = 8;

    pub fn create_game(&self, config: GameConfig) -> Result<String, StoreError> {
        let mut games = self.games.lock().map_err(|_| StoreError::LockError)?;
        loop {
            let game_id = Uuid::new_v4().simple().to_string()[..Self::ID_LENGTH].to_string();
            if let Entry::Vacant(entry) = games.entry(game_id.clone()) {
                let game = LocalGame::start(config);
                let (updates, _) =
                    watch::channel(GameSnapshot::new(game_id.clone(), None, None, &game));
                entry.insert(StoredGame {
                    game,
                    player_x: None,
                    player_o: None,
                    updates,
                });
                info!("created game {}", game_id);
                return Ok(game_id);
            }
        }
    }

    pub fn game_exists(&self, game_id: &str) -> Result<bool, StoreError> {
        let games = self.games.lock().map_err(|_| StoreError::LockError)?;
        Ok(games.contains_key(game_id))
    }

    pub fn config(&self, game_id: &str) -> Result<GameConfig, StoreError> {
        let games = self.games.lock().map_err(|_| StoreError::LockError)?;
        games
            .get(game_id)
            .map(|stored| stored.game.config())
            .ok_or(StoreError::GameNotFound)
    }

    pub fn snapshot(&self, game_id: &str) -> Result<GameSnapshot, StoreError> {
        let games = self.games.lock().map_err(|_| StoreError::LockError)?;
        games
            .get(game_id)
            .map(|stored| stored.snapshot(game_id))
            .ok_or(StoreError::GameNotFound)
    }

    /// Seats `player` in the first free seat, X before O, and publishes the
    /// new snapshot. Returns `None` when both seats are already taken; the
    /// caller can still watch the game.
    pub fn join_game(&self, game_id: &str, player: PlayerInfo) -> Result<Option<Mark>, StoreError> {
        let mut games = self.games.lock().map_err(|_| StoreError::LockError)?;
        let stored = games.get_mut(game_id).ok_or(StoreError::GameNotFound)?;

        let mark = match (&stored.player_x, &stored.player_o) {
            (None, _) => Mark::X,
            (Some(_), None) => Mark::O,
            (Some(_), Some(_)) => {
                debug!("game {} is full, {} only watches", game_id, player.name);
                return Ok(None);
            }
        };
        let player = PlayerInfo {
            symbol: Some(mark),
            ..player
        };
        info!("{} joined game {} as {}", player.name, game_id, mark);
        match mark {
            Mark::X => stored.player_x = Some(player),
            Mark::O => stored.player_o = Some(player),
        }
        stored.publish(game_id);
        Ok(Some(mark))
    }

    /// The seat held by the connection `player_id`, if any.
    pub fn seat_of(&self, game_id: &str, player_id: &str) -> Result<Option<PlayerInfo>, StoreError> {
        let games = self.games.lock().map_err(|_| StoreError::LockError)?;
        let stored = games.get(game_id).ok_or(StoreError::GameNotFound)?;
        let seat = [&stored.player_x, &stored.player_o]
            .into_iter()
            .flatten()
            .find(|player| player.id == player_id)
            .cloned();
        Ok(seat)
    }

    /// Plays the mark whose turn it is at `coordinates` and publishes the new
    /// snapshot. Who sent the move is not checked.
    pub fn make_move(&self, game_id: &str, coordinates: Coordinates) -> Result<Move, StoreError> {
        let mut games = self.games.lock().map_err(|_| StoreError::LockError)?;
        let stored = games.get_mut(game_id).ok_or(StoreError::GameNotFound)?;
        if stored.player_x.is_none() || stored.player_o.is_none() {
            return Err(StoreError::WaitingForPlayers);
        }
        let new_move = stored.game.apply_move(coordinates)?;
        stored.publish(game_id);
        Ok(new_move)
    }

    pub fn subscribe(&self, game_id: &str) -> Result<watch::Receiver<GameSnapshot>, StoreError> {
        let games = self.games.lock().map_err(|_| StoreError::LockError)?;
        games
            .get(game_id)
            .map(|stored| stored.updates.subscribe())
            .ok_or(StoreError::GameNotFound)
    }

    /// Drops the game once no connection watches it anymore.
    pub fn release(&self, game_id: &str) -> Result<(), StoreError> {
        let mut games = self.games.lock().map_err(|_| StoreError::LockError)?;
        if let Entry::Occupied(entry) = games.entry(game_id.to_string()) {
            if entry.get().updates.receiver_count() == 0 {
                debug!("removing game {}", game_id);
                entry.remove();
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.games.lock().map(|games| games.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
