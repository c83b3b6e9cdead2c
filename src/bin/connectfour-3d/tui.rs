use anyhow::Result;
use log::{debug, warn};

use std::thread;

use tokio::sync::mpsc;

use connectfour3d::game::{CoordsFull, GameState, Side, ROW_SIZE};
use connectfour3d::game_manager::player_local::PlayerLocalToUI;
use connectfour3d::game_manager::{GameManagerToUI, GameUpdate, UIToGameManager};

const HELP: &str = "\
Commands:
  <n>      put a token into column n (0..15, see the map on the right)
  <x> <z>  put a token into the column at x, z
  r        reset the game
  h        show this help
  q        quit";

/// Terminal front-end: draws the board after every update and turns typed lines into moves.
pub struct Tui {
    from_gm: mpsc::Receiver<GameManagerToUI>,
    from_players: mpsc::Receiver<PlayerLocalToUI>,
    to_gm: mpsc::Sender<UIToGameManager>,
    from_stdin: mpsc::Receiver<String>,

    // Print updates as JSON lines instead of drawing the board.
    json: bool,

    pending_input: Option<PendingInput>,
    last_update: Option<GameUpdate>,
}

struct PendingInput {
    side: Side,
    column_sender: mpsc::Sender<usize>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Put(usize),
    Reset,
    Help,
    Quit,
}

impl Tui {
    pub fn new(
        from_gm: mpsc::Receiver<GameManagerToUI>,
        from_players: mpsc::Receiver<PlayerLocalToUI>,
        to_gm: mpsc::Sender<UIToGameManager>,
        json: bool,
    ) -> Tui {
        Tui {
            from_gm,
            from_players,
            to_gm,
            from_stdin: spawn_stdin_reader(),
            json,
            pending_input: None,
            last_update: None,
        }
    }

    /// Runs until the user quits or stdin is closed.
    pub async fn run(&mut self) -> Result<()> {
        self.say(HELP);

        loop {
            tokio::select! {
                // Updates go first: a player's input request must never be handled before the
                // update it was caused by.
                biased;

                Some(msg) = self.from_gm.recv() => {
                    self.handle_gm_msg(msg)?;
                }

                Some(msg) = self.from_players.recv() => {
                    self.handle_player_msg(msg);
                }

                line = self.from_stdin.recv() => {
                    let line = match line {
                        Some(line) => line,
                        None => return Ok(()),
                    };

                    match parse_command(&line) {
                        Ok(Command::Quit) => return Ok(()),
                        Ok(cmd) => self.handle_command(cmd).await?,
                        Err(msg) => self.say(&msg),
                    }
                }
            }
        }
    }

    fn handle_gm_msg(&mut self, msg: GameManagerToUI) -> Result<()> {
        match msg {
            GameManagerToUI::Update(update) => {
                // A request for input is only good for the state it was made in.
                if let Some(pending) = &self.pending_input {
                    if update.snapshot.game_state != GameState::WaitingFor(pending.side) {
                        self.pending_input = None;
                    }
                }

                if self.json {
                    println!("{}", serde_json::to_string(&update)?);
                } else {
                    println!("\n{}", render(&update));
                }

                self.last_update = Some(update);
            }
            GameManagerToUI::Rejected(status) => {
                self.say(&status);
            }
        }

        Ok(())
    }

    fn handle_player_msg(&mut self, msg: PlayerLocalToUI) {
        match msg {
            PlayerLocalToUI::RequestInput(side, column_sender) => {
                debug!("UI: player {} waits for input", side);
                self.say(&format!("Player {}, pick a column:", side));
                self.pending_input = Some(PendingInput {
                    side,
                    column_sender,
                });
            }
        }
    }

    async fn handle_command(&mut self, cmd: Command) -> Result<()> {
        match cmd {
            Command::Put(column) => {
                let pending = match self.pending_input.take() {
                    Some(pending) => pending,
                    None => {
                        // Nobody asked for a move: the computer is thinking, or the game is over.
                        let status = self
                            .last_update
                            .as_ref()
                            .map(|u| u.status.clone())
                            .unwrap_or_else(|| "Not ready yet.".to_string());
                        self.say(&status);
                        return Ok(());
                    }
                };

                if let Err(err) = pending.column_sender.try_send(column) {
                    warn!("failed sending column to the player: {}", err);
                }
            }
            Command::Reset => {
                self.pending_input = None;
                self.to_gm.send(UIToGameManager::Reset).await?;
            }
            Command::Help => self.say(HELP),
            Command::Quit => {}
        }

        Ok(())
    }

    // Human-facing messages; in JSON mode they go to stderr so that stdout stays parseable.
    fn say(&self, msg: &str) {
        if self.json {
            eprintln!("{}", msg);
        } else {
            println!("{}", msg);
        }
    }
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let words: Vec<&str> = line.split_whitespace().collect();

    match words.as_slice() {
        ["r"] | ["reset"] => Ok(Command::Reset),
        ["h"] | ["help"] | ["?"] => Ok(Command::Help),
        ["q"] | ["quit"] | ["exit"] => Ok(Command::Quit),
        [n] => n
            .parse::<usize>()
            .map(Command::Put)
            .map_err(|_| format!("Unknown command {:?}, type h for help.", line.trim())),
        [x, z] => {
            let x = parse_coord(x)?;
            let z = parse_coord(z)?;
            Ok(Command::Put(x * ROW_SIZE + z))
        }
        _ => Err("Type h for help.".to_string()),
    }
}

fn parse_coord(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(v) if v < ROW_SIZE => Ok(v),
        _ => Err(format!("{:?} is not a coordinate, expected 0..{}.", s, ROW_SIZE - 1)),
    }
}

/// Draws the four levels side by side, top level first. Rows are x, columns are z. The last put
/// token is shown in brackets, tokens of the winning row between asterisks.
pub fn render(update: &GameUpdate) -> String {
    let snapshot = &update.snapshot;
    let win_cells: Vec<CoordsFull> = snapshot
        .win_row
        .as_ref()
        .map(|w| w.row.clone())
        .unwrap_or_default();

    let mut out = String::new();

    out.push_str("    ");
    for y in (0..ROW_SIZE).rev() {
        out.push_str(&format!("{:<14}", format!("y={}", y)));
    }
    out.push_str("columns\n");

    for x in 0..ROW_SIZE {
        out.push_str(&format!("x={} ", x));

        for y in (0..ROW_SIZE).rev() {
            for z in 0..ROW_SIZE {
                let coords = CoordsFull::new(x, y, z);
                let token = match snapshot.board.get(coords) {
                    Some(side) => side.to_string(),
                    None => ".".to_string(),
                };

                let cell = if win_cells.contains(&coords) {
                    format!("*{}*", token)
                } else if snapshot.last_put == Some(coords) {
                    format!("[{}]", token)
                } else {
                    format!(" {} ", token)
                };
                out.push_str(&cell);
            }
            out.push_str("  ");
        }

        for z in 0..ROW_SIZE {
            out.push_str(&format!("{:>3}", x * ROW_SIZE + z));
        }
        out.push('\n');
    }

    out.push_str(&format!("\n{}", update.status));

    out
}

// Stdin is read on a plain thread, so that a pending read never holds up the runtime shutdown.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel::<String>(4);

    thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!("failed reading stdin: {}", err);
                    break;
                }
            };

            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    rx
}
