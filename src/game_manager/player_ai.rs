use anyhow::{anyhow, Result};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{GameManagerToPlayer, PlayerToGameManager};
use crate::ai;
use crate::game::{DeferredMove, GameState, Side};
use crate::GameSnapshot;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};

/// How long the computer pretends to think, same as in the browser version of the game.
pub const DEFAULT_THINK_DELAY: Duration = Duration::from_millis(700);

#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Delay between the computer's turn starting and its move being submitted.
    pub think_delay: Duration,

    /// Seed for the random pick; if not set, it comes from the OS.
    pub seed: Option<u64>,
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig {
            think_delay: DEFAULT_THINK_DELAY,
            seed: None,
        }
    }
}

/// Computer player. When it's its turn, it picks a column right away, and submits it after the
/// thinking delay, stamped with the game generation it was computed for. If the game is reset in
/// the meantime, GameManager throws the move away.
pub struct PlayerAi {
    side: Side,
    config: AiConfig,
    rng: StdRng,

    from_gm: mpsc::Receiver<GameManagerToPlayer>,
    to_gm: mpsc::Sender<PlayerToGameManager>,

    // (generation, num_moves) of the position we've already scheduled a move for, so that the
    // same snapshot delivered twice doesn't produce two moves.
    last_scheduled: Option<(u64, usize)>,
}

impl PlayerAi {
    pub fn new(
        side: Side,
        config: AiConfig,
        from_gm: mpsc::Receiver<GameManagerToPlayer>,
        to_gm: mpsc::Sender<PlayerToGameManager>,
    ) -> PlayerAi {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        PlayerAi {
            side,
            config,
            rng,
            from_gm,
            to_gm,
            last_scheduled: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        while let Some(val) = self.from_gm.recv().await {
            match val {
                GameManagerToPlayer::GameState(snapshot) => {
                    self.handle_game_state(snapshot)?;
                }
            }
        }

        // GameManager is gone.
        Ok(())
    }

    /// Schedules a move if the snapshot says it's our turn. Returns the handle of the deferred
    /// task, if one was spawned.
    pub fn handle_game_state(&mut self, snapshot: GameSnapshot) -> Result<Option<JoinHandle<()>>> {
        if snapshot.game_state != GameState::WaitingFor(self.side) {
            return Ok(None);
        }

        let key = (snapshot.generation, snapshot.num_moves);
        if self.last_scheduled == Some(key) {
            debug!("ai {}: already scheduled a move for {:?}", self.side, key);
            return Ok(None);
        }

        // The game state says it's our turn, so there must be a free column; if there isn't,
        // something is badly broken and we'd better stop.
        let column =
            ai::choose_column(&snapshot.board, self.side.opposite(), self.side, &mut self.rng)
                .ok_or_else(|| anyhow!("ai {}: no legal move, but the game isn't over", self.side))?;

        let mv = DeferredMove {
            side: self.side,
            column,
            generation: snapshot.generation,
        };
        self.last_scheduled = Some(key);

        info!("ai {}: going to put at {} in {:?}", self.side, column, self.config.think_delay);

        let to_gm = self.to_gm.clone();
        let delay = self.config.think_delay;

        Ok(Some(tokio::spawn(async move {
            time::sleep(delay).await;

            if let Err(err) = to_gm.send(PlayerToGameManager::PutDeferred(mv)).await {
                debug!("GM is gone, dropping the move: {}", err);
            }
        })))
    }
}
