pub mod win;

use std::fmt;

use log::{debug, info};

use crate::error::GameError;
use crate::GameSnapshot;

pub use win::{check_win, WinRow};

// In "Connect Four", ROW_SIZE is the "Four". The board is a cube with this many cells per edge.
pub const ROW_SIZE: usize = 4;

/// Number of poles (columns) a token can be dropped into.
pub const NUM_COLUMNS: usize = ROW_SIZE * ROW_SIZE;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub enum Side {
    A,
    B,
}

/// A cell of the board. Always within bounds: constructors panic on bad coords, and deserializing
/// bad ones fails.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawCoords")]
pub struct CoordsFull {
    x: usize,
    y: usize,
    z: usize,
}

/// A vertical pole at fixed x, z. Its index is x * ROW_SIZE + z.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawColumn")]
pub struct Column {
    x: usize,
    z: usize,
}

// Unchecked shapes of the above, as they come off the wire.
#[derive(serde::Deserialize)]
struct RawCoords {
    x: usize,
    y: usize,
    z: usize,
}

#[derive(serde::Deserialize)]
struct RawColumn {
    x: usize,
    z: usize,
}

/// Full board state. It's a plain value: copying it gives an independent snapshot which can be
/// played on without affecting the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BoardState {
    // Indexed as [x][y][z]; y is the vertical axis.
    tokens: [[[Option<Side>; ROW_SIZE]; ROW_SIZE]; ROW_SIZE],
}

/// State of the session from the turn controller's point of view.
#[derive(Clone, Copy, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
pub enum GameState {
    WaitingFor(Side),
    WonBy(Side),
    Draw,
}

#[derive(Debug)]
pub struct PutResult {
    // Where the new token ended up.
    pub coords: CoordsFull,

    // State of the game after the token was put.
    pub state: GameState,
}

/// A move which was decided on some time ago (e.g. after the computer was "thinking"), and has to
/// be applied only if the game it was computed for is still the current one.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DeferredMove {
    pub side: Side,
    pub column: Column,
    pub generation: u64,
}

/// A single game session: the board plus whose turn it is. Moves of both the human and the
/// computer go through the same put_token state machine.
pub struct Game {
    board: BoardState,
    state: GameState,

    win_row: Option<WinRow>,
    last_put: Option<CoordsFull>,
    num_moves: usize,

    // Bumped on every reset, so that moves computed against an older game can be told apart.
    generation: u64,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match *self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

impl CoordsFull {
    pub fn new(x: usize, y: usize, z: usize) -> CoordsFull {
        panic_if_out_of_bounds(x, y, z);
        CoordsFull { x, y, z }
    }

    pub fn x(&self) -> usize {
        self.x
    }

    pub fn y(&self) -> usize {
        self.y
    }

    pub fn z(&self) -> usize {
        self.z
    }

    pub fn column(&self) -> Column {
        Column { x: self.x, z: self.z }
    }
}

impl TryFrom<RawCoords> for CoordsFull {
    type Error = GameError;

    fn try_from(raw: RawCoords) -> Result<Self, Self::Error> {
        if [raw.x, raw.y, raw.z].iter().any(|v| *v >= ROW_SIZE) {
            return Err(GameError::OutOfBounds {
                x: raw.x,
                y: raw.y,
                z: raw.z,
            });
        }

        Ok(CoordsFull {
            x: raw.x,
            y: raw.y,
            z: raw.z,
        })
    }
}

impl Column {
    pub fn new(x: usize, z: usize) -> Column {
        panic_if_out_of_bounds(x, 0, z);
        Column { x, z }
    }

    /// Column by its index in [0, NUM_COLUMNS). This is what the input side hands us, so it's
    /// validated instead of panicking.
    pub fn from_index(idx: usize) -> Result<Column, GameError> {
        if idx >= NUM_COLUMNS {
            return Err(GameError::InvalidColumn(idx));
        }

        Ok(Column {
            x: idx / ROW_SIZE,
            z: idx % ROW_SIZE,
        })
    }

    pub fn index(&self) -> usize {
        self.x * ROW_SIZE + self.z
    }

    pub fn x(&self) -> usize {
        self.x
    }

    pub fn z(&self) -> usize {
        self.z
    }

    /// All columns, in ascending index order.
    pub fn all() -> impl Iterator<Item = Column> {
        (0..NUM_COLUMNS).map(|idx| Column {
            x: idx / ROW_SIZE,
            z: idx % ROW_SIZE,
        })
    }

    pub fn cell(&self, y: usize) -> CoordsFull {
        CoordsFull::new(self.x, y, self.z)
    }
}

impl TryFrom<RawColumn> for Column {
    type Error = GameError;

    fn try_from(raw: RawColumn) -> Result<Self, Self::Error> {
        if raw.x >= ROW_SIZE || raw.z >= ROW_SIZE {
            return Err(GameError::OutOfBounds {
                x: raw.x,
                y: 0,
                z: raw.z,
            });
        }

        Ok(Column { x: raw.x, z: raw.z })
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.x, self.z)
    }
}

impl BoardState {
    pub fn new() -> BoardState {
        BoardState {
            tokens: [[[None; ROW_SIZE]; ROW_SIZE]; ROW_SIZE],
        }
    }

    pub fn get(&self, coords: CoordsFull) -> Option<Side> {
        panic_if_out_of_bounds(coords.x, coords.y, coords.z);

        self.tokens[coords.x][coords.y][coords.z]
    }

    /// Sets the cell directly, bypassing gravity. Meant for setting up positions; normal play goes
    /// through drop_token.
    pub fn set(&mut self, side: Side, coords: CoordsFull) {
        panic_if_out_of_bounds(coords.x, coords.y, coords.z);

        self.tokens[coords.x][coords.y][coords.z] = Some(side);
    }

    /// True if the topmost cell of the pole is free.
    pub fn can_drop(&self, column: Column) -> bool {
        self.get(column.cell(ROW_SIZE - 1)).is_none()
    }

    /// Number of tokens stacked on the pole.
    pub fn height(&self, column: Column) -> usize {
        (0..ROW_SIZE)
            .take_while(|y| self.get(column.cell(*y)).is_some())
            .count()
    }

    /// Puts the token into the lowest free cell of the pole, and returns where it landed. If the
    /// pole is full, the board is not touched.
    pub fn drop_token(&mut self, column: Column, side: Side) -> Result<CoordsFull, GameError> {
        for y in 0..ROW_SIZE {
            let coords = column.cell(y);
            match self.get(coords) {
                None => {
                    self.set(side, coords);
                    return Ok(coords);
                }

                // Token already exists, gonna try next spot (if any).
                Some(_) => continue,
            }
        }

        Err(GameError::ColumnFull(column))
    }

    /// Plays the drop on a copy of the board. Returns the copy along with the landing coords, or
    /// None if the pole is full; self stays unchanged either way.
    pub fn simulate_drop(&self, column: Column, side: Side) -> Option<(BoardState, CoordsFull)> {
        let mut board = *self;
        let coords = board.drop_token(column, side).ok()?;

        Some((board, coords))
    }

    /// Columns which can still take a token, in ascending index order.
    pub fn droppable_columns(&self) -> Vec<Column> {
        Column::all().filter(|c| self.can_drop(*c)).collect()
    }

    pub fn num_tokens(&self) -> usize {
        Column::all().map(|c| self.height(c)).sum()
    }

    pub fn is_full(&self) -> bool {
        !Column::all().any(|c| self.can_drop(c))
    }

    pub fn reset(&mut self) {
        *self = BoardState::new();
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn is_over(&self) -> bool {
        !matches!(self, GameState::WaitingFor(_))
    }
}

impl Game {
    pub fn new() -> Game {
        Game {
            board: BoardState::new(),
            state: GameState::WaitingFor(Side::A),
            win_row: None,
            last_put: None,
            num_moves: 0,
            generation: 0,
        }
    }

    /// Creates a game resumed from the given board, with `next` to move unless the board is
    /// already decided.
    pub fn from_board(board: &BoardState, next: Side) -> Game {
        let mut game = Game::new();
        game.board = *board;
        game.num_moves = board.num_tokens();

        game.win_row = find_any_win(&game.board);
        game.state = match &game.win_row {
            Some(win_row) => GameState::WonBy(win_row.side),
            None if game.board.is_full() => GameState::Draw,
            None => GameState::WaitingFor(next),
        };

        game
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn win_row(&self) -> Option<&WinRow> {
        self.win_row.as_ref()
    }

    pub fn last_put(&self) -> Option<CoordsFull> {
        self.last_put
    }

    pub fn num_moves(&self) -> usize {
        self.num_moves
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Same as put_token, but takes a raw column index as it comes from the input side.
    pub fn request_move(&mut self, side: Side, column_idx: usize) -> Result<PutResult, GameError> {
        let column = Column::from_index(column_idx)?;
        self.put_token(side, column)
    }

    /// Same as request_move, but only if the game is still the one of the given generation. That's
    /// how input picked by a human against a board which has been reset since is thrown away.
    pub fn request_move_for(
        &mut self,
        generation: u64,
        side: Side,
        column_idx: usize,
    ) -> Result<PutResult, GameError> {
        self.check_generation(generation)?;
        self.request_move(side, column_idx)
    }

    pub fn put_token(&mut self, side: Side, column: Column) -> Result<PutResult, GameError> {
        let awaited = match self.state {
            GameState::WaitingFor(awaited) => awaited,
            GameState::WonBy(_) | GameState::Draw => return Err(GameError::GameOver),
        };

        if side != awaited {
            return Err(GameError::NotYourTurn {
                awaited,
                requested: side,
            });
        }

        if !self.board.can_drop(column) {
            return Err(GameError::ColumnFull(column));
        }

        let coords = self.board.drop_token(column, side)?;
        self.last_put = Some(coords);
        self.num_moves += 1;

        debug!("side {} put token at {:?}", side, coords);

        if let Some(win_row) = check_win(&self.board, coords, side) {
            info!("side {} won: {:?}", side, win_row.row);
            self.state = GameState::WonBy(side);
            self.win_row = Some(win_row);
        } else if self.board.is_full() {
            info!("board is full, it's a draw");
            self.state = GameState::Draw;
        } else {
            self.state = GameState::WaitingFor(side.opposite());
        }

        Ok(PutResult {
            coords,
            state: self.state,
        })
    }

    /// Applies a move which was computed for the given generation of the game. If the game was
    /// reset since then, the move is rejected and nothing changes.
    pub fn apply_deferred(&mut self, mv: DeferredMove) -> Result<PutResult, GameError> {
        self.check_generation(mv.generation)?;
        self.put_token(mv.side, mv.column)
    }

    fn check_generation(&self, generation: u64) -> Result<(), GameError> {
        if generation != self.generation {
            return Err(GameError::StaleMove {
                scheduled: generation,
                current: self.generation,
            });
        }

        Ok(())
    }

    pub fn reset(&mut self) {
        self.board.reset();
        self.state = GameState::WaitingFor(Side::A);
        self.win_row = None;
        self.last_put = None;
        self.num_moves = 0;
        self.generation += 1;

        info!("game reset, generation {}", self.generation);
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            generation: self.generation,
            num_moves: self.num_moves,
            game_state: self.state,
            board: self.board,
            last_put: self.last_put,
            win_row: self.win_row.clone(),
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

// Looks for a winning row anywhere on the board, used when a game is set up from an arbitrary
// position rather than built move by move.
fn find_any_win(board: &BoardState) -> Option<WinRow> {
    for x in 0..ROW_SIZE {
        for y in 0..ROW_SIZE {
            for z in 0..ROW_SIZE {
                let coords = CoordsFull { x, y, z };
                let side = match board.get(coords) {
                    Some(side) => side,
                    None => continue,
                };

                if let Some(win_row) = check_win(board, coords, side) {
                    return Some(win_row);
                }
            }
        }
    }

    None
}

fn panic_if_out_of_bounds(x: usize, y: usize, z: usize) {
    if x >= ROW_SIZE {
        panic!("x is out of bounds: {}", x);
    }

    if y >= ROW_SIZE {
        panic!("y is out of bounds: {}", y);
    }

    if z >= ROW_SIZE {
        panic!("z is out of bounds: {}", z);
    }
}
