mod boards;
mod config;
mod field;
mod gamestate;
mod local_game;
mod mark;
mod r#move;
mod source;
mod view;

pub use boards::*;
pub use config::GameConfig;
pub use field::{Field, UnknownField};
pub use gamestate::{GameState, GameStatus, Players};
pub use local_game::LocalGame;
pub use mark::Mark;
pub use r#move::{Coordinates, Move};
pub use source::{GameSource, Intent, SourceError};
pub use view::GameView;
