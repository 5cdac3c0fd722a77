mod board;
mod validator;
mod win_detector;

pub use board::{Board, InvalidGrid, InvalidMove};
pub use validator::validate_move;
pub use win_detector::{find_winner, winning_line};
