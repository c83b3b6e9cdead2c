pub mod ai;
pub mod error;
pub mod game;
pub mod game_manager;

/// Everything presentation needs to draw the game after a change.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GameSnapshot {
    /// Bumped on every reset.
    pub generation: u64,

    /// Number of tokens put since the last reset.
    pub num_moves: usize,

    pub game_state: game::GameState,

    /// Full board state.
    pub board: game::BoardState,

    /// The most recently put token, if any.
    pub last_put: Option<game::CoordsFull>,

    /// Set if the game was won.
    pub win_row: Option<game::WinRow>,
}
