use crate::{Board, Coordinates, GameStatus, InvalidMove};

/// Checks whether a move at `coordinates` is legal. Has no side effects; the
/// caller places the mark.
pub fn validate_move(
    board: &Board,
    coordinates: Coordinates,
    status: GameStatus,
) -> Result<(), InvalidMove> {
    // GameNotActive
    if !status.is_active() {
        return Err(InvalidMove::GameNotActive);
    }
    // OutOfBounds, CellOccupied
    if !board.get(coordinates)?.is_vacant() {
        return Err(InvalidMove::CellOccupied);
    }
    Ok(())
}
