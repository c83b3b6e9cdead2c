//! Computer opponent: a greedy one-move lookahead.
//!
//! It takes a winning column if there is one, otherwise blocks the opponent's winning column,
//! otherwise plays a random legal column.

use log::debug;
use rand::Rng;

use crate::game::{check_win, BoardState, Column, Side};

/// Picks the column for `me` to play. Returns None only if no column can take a token at all.
pub fn choose_column<R: Rng + ?Sized>(
    board: &BoardState,
    opponent: Side,
    me: Side,
    rng: &mut R,
) -> Option<Column> {
    let candidates = board.droppable_columns();
    if candidates.is_empty() {
        return None;
    }

    if let Some(column) = winning_column(board, me) {
        debug!("ai {}: winning at {}", me, column);
        return Some(column);
    }

    if let Some(column) = winning_column(board, opponent) {
        debug!("ai {}: blocking {} at {}", me, opponent, column);
        return Some(column);
    }

    let column = candidates[rng.random_range(0..candidates.len())];
    debug!("ai {}: nothing urgent, random pick {}", me, column);

    Some(column)
}

/// First column, in ascending index order, where a token of `side` would complete a row.
pub fn winning_column(board: &BoardState, side: Side) -> Option<Column> {
    Column::all().find(|column| match board.simulate_drop(*column, side) {
        Some((sim, coords)) => check_win(&sim, coords, side).is_some(),
        None => false,
    })
}
