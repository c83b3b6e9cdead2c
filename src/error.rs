use crate::game::{Column, Side};

/// Reasons a move request can be turned down. None of them is fatal: the session is left exactly
/// as it was before the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("column {0} is out of range, expected 0..16")]
    InvalidColumn(usize),

    #[error("cell ({x}, {y}, {z}) is out of the board")]
    OutOfBounds { x: usize, y: usize, z: usize },

    #[error("pole {0} is full")]
    ColumnFull(Column),

    #[error("the game is over, reset to play again")]
    GameOver,

    #[error("it's {awaited:?}'s turn, not {requested:?}'s")]
    NotYourTurn { awaited: Side, requested: Side },

    #[error("move was scheduled for game generation {scheduled}, but current one is {current}")]
    StaleMove { scheduled: u64, current: u64 },
}
