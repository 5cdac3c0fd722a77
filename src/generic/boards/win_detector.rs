use crate::{Board, Coordinates, Field, Mark};
use itertools::Itertools;

/// → ↓ ↘ ↙, as `(row, column)` steps. The scan order of these directions is
/// part of the detector's contract.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Returns the mark that has `win_length` consecutive fields in a row,
/// column or diagonal.
///
/// Start cells are visited row-major and every direction is tried in the
/// order of [`DIRECTIONS`]; the first run that reaches `win_length` decides.
/// Scanning only forward directions is enough: any line is found from its
/// first cell.
///
/// Usage:
/// ```
/// use caro::{find_winner, Board, Mark};
///
/// // X X X
/// // O O .
/// // . . .
/// let board = Board::new(3)
///     .set((0, 0), Mark::X).unwrap()
///     .set((1, 0), Mark::O).unwrap()
///     .set((0, 1), Mark::X).unwrap()
///     .set((1, 1), Mark::O).unwrap()
///     .set((0, 2), Mark::X).unwrap();
///
/// assert_eq!(find_winner(&board, 3), Some(Mark::X));
/// assert_eq!(find_winner(&Board::new(3), 3), None);
/// ```
pub fn find_winner(board: &Board, win_length: usize) -> Option<Mark> {
    winning_line(board, win_length).and_then(|line| board.get(line[0]).ok()?.mark())
}

/// Like [`find_winner`], but returns the coordinates of the winning run,
/// starting at its first cell.
pub fn winning_line(board: &Board, win_length: usize) -> Option<Vec<Coordinates>> {
    let size = board.size();
    let fields = board.fields();

    for (row, column) in (0..size).cartesian_product(0..size) {
        let Field::Occupied { mark } = fields[(row, column)] else {
            continue;
        };
        for direction in DIRECTIONS {
            let line = run_from(board, (row, column), direction, mark, win_length);
            if line.len() >= win_length {
                return Some(line);
            }
        }
    }
    None
}

/// Collects consecutive cells holding `mark`, starting at `start` and
/// stopping once `limit` cells have been found.
fn run_from(
    board: &Board,
    start: Coordinates,
    (d_row, d_column): (isize, isize),
    mark: Mark,
    limit: usize,
) -> Vec<Coordinates> {
    let mut line = vec![start];
    let (mut row, mut column) = start;
    while line.len() < limit {
        let (Some(next_row), Some(next_column)) = (
            row.checked_add_signed(d_row),
            column.checked_add_signed(d_column),
        ) else {
            break;
        };
        match board.get((next_row, next_column)) {
            Ok(field) if field.mark() == Some(mark) => {
                line.push((next_row, next_column));
                row = next_row;
                column = next_column;
            }
            _ => break,
        }
    }
    line
}
