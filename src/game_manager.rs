pub mod player_ai;
pub mod player_local;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::error::GameError;
use crate::game::{self, DeferredMove, GameState, PutResult, Side};
use crate::GameSnapshot;

/// Owns a single game and routes moves of both players into it. Every accepted move, rejected
/// move and reset is reported to the UI.
pub struct GameManager {
    game: game::Game,

    to_ui: mpsc::Sender<GameManagerToUI>,
    from_ui: mpsc::Receiver<UIToGameManager>,

    // Index 0 plays Side::A, index 1 plays Side::B.
    players: [PlayerCtx; 2],
}

struct PlayerCtx {
    side: Side,
    kind: PlayerKind,

    to: mpsc::Sender<GameManagerToPlayer>,
    from: mpsc::Receiver<PlayerToGameManager>,
}

/// Channels and kind of one player, as handed to GameManager::new.
pub struct PlayerChannels {
    pub kind: PlayerKind,
    pub to: mpsc::Sender<GameManagerToPlayer>,
    pub from: mpsc::Receiver<PlayerToGameManager>,
}

impl GameManager {
    pub fn new(
        to_ui: mpsc::Sender<GameManagerToUI>,
        from_ui: mpsc::Receiver<UIToGameManager>,

        player_a: PlayerChannels,
        player_b: PlayerChannels,
    ) -> GameManager {
        let pa = PlayerCtx {
            side: Side::A,
            kind: player_a.kind,
            to: player_a.to,
            from: player_a.from,
        };

        let pb = PlayerCtx {
            side: Side::B,
            kind: player_b.kind,
            to: player_b.to,
            from: player_b.from,
        };

        GameManager {
            game: game::Game::new(),
            to_ui,
            from_ui,
            players: [pa, pb],
        }
    }

    /// Runs until the UI goes away.
    pub async fn run(&mut self) -> Result<()> {
        // Let everyone know about the initial empty board.
        self.publish().await.context("initial update")?;

        loop {
            let (pa, pb) = self.players.split_at_mut(1);

            tokio::select! {
                Some(val) = pa[0].from.recv() => {
                    self.handle_player_msg(0, val).await?;
                }

                Some(val) = pb[0].from.recv() => {
                    self.handle_player_msg(1, val).await?;
                }

                cmd = self.from_ui.recv() => {
                    match cmd {
                        Some(UIToGameManager::Reset) => self.handle_reset().await?,
                        None => {
                            info!("GM: UI is gone, stopping");
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    pub async fn handle_player_msg(&mut self, i: usize, msg: PlayerToGameManager) -> Result<()> {
        match msg {
            PlayerToGameManager::PutToken { column, generation } => {
                self.handle_player_put_token(i, column, generation).await
            }
            PlayerToGameManager::PutDeferred(mv) => self.handle_player_put_deferred(i, mv).await,
        }
    }

    async fn handle_player_put_token(
        &mut self,
        i: usize,
        column_idx: usize,
        generation: u64,
    ) -> Result<()> {
        let side = self.players[i].side;
        debug!("GM: player {} put token at column {}", side, column_idx);

        let res = self.game.request_move_for(generation, side, column_idx);
        self.handle_put_result(side, res).await
    }

    async fn handle_player_put_deferred(&mut self, i: usize, mv: DeferredMove) -> Result<()> {
        let side = self.players[i].side;
        debug!("GM: player {} put deferred {:?}", side, mv);

        if mv.side != side {
            warn!("GM: player {} tried to move for {}, ignoring", side, mv.side);
            return Ok(());
        }

        let res = self.game.apply_deferred(mv);
        self.handle_put_result(side, res).await
    }

    async fn handle_put_result(
        &mut self,
        side: Side,
        res: std::result::Result<PutResult, GameError>,
    ) -> Result<()> {
        match res {
            Ok(res) => {
                debug!("GM: token landed at {:?}, now {:?}", res.coords, res.state);
                self.publish().await
            }

            // The game this move was meant for doesn't exist anymore.
            Err(err @ GameError::StaleMove { .. }) => {
                info!("GM: dropping move of {}: {}", side, err);
                Ok(())
            }

            Err(err @ GameError::NotYourTurn { .. }) => {
                warn!("GM: {}", err);
                Ok(())
            }

            Err(err) => {
                warn!("GM: can't put for {}: {}", side, err);
                self.to_ui
                    .send(GameManagerToUI::Rejected(rejection_text(&err)))
                    .await
                    .context("updating UI")?;

                // The move didn't happen, so whoever was asked for it has to be asked again.
                self.upd_players().await
            }
        }
    }

    async fn handle_reset(&mut self) -> Result<()> {
        self.game.reset();
        self.publish().await
    }

    /// Sends the current snapshot to the UI first, and then to the players. The order matters:
    /// whatever the players ask the UI in response must not overtake the update itself.
    async fn publish(&mut self) -> Result<()> {
        let snapshot = self.game.snapshot();
        let status = status_text(snapshot.game_state, self.kinds());

        self.to_ui
            .send(GameManagerToUI::Update(GameUpdate {
                snapshot,
                status,
            }))
            .await
            .context("updating UI")?;

        self.upd_players().await
    }

    async fn upd_players(&self) -> Result<()> {
        let snapshot = self.game.snapshot();

        for p in self.players.iter() {
            p.to
                .send(GameManagerToPlayer::GameState(snapshot.clone()))
                .await
                .context(format!("player {}", p.side))?;
        }

        Ok(())
    }

    fn kinds(&self) -> [PlayerKind; 2] {
        [self.players[0].kind, self.players[1].kind]
    }
}

/// Human-readable status line for the given state. `kinds` are indexed by side, A first.
pub fn status_text(state: GameState, kinds: [PlayerKind; 2]) -> String {
    let kind_of = |side: Side| match side {
        Side::A => kinds[0],
        Side::B => kinds[1],
    };

    // "You" only makes sense if exactly one of the players is a human.
    let vs_ai = kinds.contains(&PlayerKind::Ai) && kinds.contains(&PlayerKind::Human);

    match state {
        GameState::WaitingFor(side) => match kind_of(side) {
            PlayerKind::Ai => "AI is thinking...".to_string(),
            PlayerKind::Human if vs_ai => "Your Turn".to_string(),
            PlayerKind::Human => format!("Player {}'s turn", side),
        },
        GameState::WonBy(side) => {
            let who = match kind_of(side) {
                PlayerKind::Ai => "AI wins!".to_string(),
                PlayerKind::Human if vs_ai => "You win!".to_string(),
                PlayerKind::Human => format!("Player {} wins!", side),
            };
            format!("{} Click Reset to play again.", who)
        }
        GameState::Draw => "Game ended in a draw! Click Reset to play again.".to_string(),
    }
}

/// Status line explaining why a move was turned down.
pub fn rejection_text(err: &GameError) -> String {
    match err {
        GameError::ColumnFull(_) => "Column is full! Try another.".to_string(),
        GameError::InvalidColumn(_) | GameError::OutOfBounds { .. } => {
            "No such column, pick one of 0..15.".to_string()
        }
        GameError::GameOver => "The game is over. Click Reset to play again.".to_string(),
        GameError::NotYourTurn { .. } => "Wait for your turn.".to_string(),
        GameError::StaleMove { .. } => "That move was meant for a previous game.".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PlayerKind {
    Human,
    Ai,
}

/// What the UI gets after every change.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GameUpdate {
    pub snapshot: GameSnapshot,
    pub status: String,
}

/// Message that GameManager can send to a player.
#[derive(Debug)]
pub enum GameManagerToPlayer {
    GameState(GameSnapshot),
}

/// Message that a player can send to GameManager.
#[derive(Debug)]
pub enum PlayerToGameManager {
    /// Column index as picked by the user; validated by the game. `generation` is the one of the
    /// snapshot the input was asked for.
    PutToken { column: usize, generation: u64 },

    /// Move computed some time ago for a particular game generation.
    PutDeferred(DeferredMove),
}

/// Message that a GameManager can send to UI.
#[derive(Debug)]
pub enum GameManagerToUI {
    Update(GameUpdate),

    /// A move was rejected; the game state didn't change.
    Rejected(String),
}

/// Message that UI can send to GameManager.
#[derive(Debug)]
pub enum UIToGameManager {
    Reset,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Column;

    const VS_AI: [PlayerKind; 2] = [PlayerKind::Human, PlayerKind::Ai];
    const LOCAL: [PlayerKind; 2] = [PlayerKind::Human, PlayerKind::Human];

    struct Harness {
        gm: GameManager,
        from_gm: mpsc::Receiver<GameManagerToUI>,
        to_gm: mpsc::Sender<UIToGameManager>,
        from_gm_a: mpsc::Receiver<GameManagerToPlayer>,
        from_gm_b: mpsc::Receiver<GameManagerToPlayer>,

        // Keep the player -> GM senders alive.
        _a_to_gm: mpsc::Sender<PlayerToGameManager>,
        _b_to_gm: mpsc::Sender<PlayerToGameManager>,
    }

    fn harness(kinds: [PlayerKind; 2]) -> Harness {
        let (to_ui, from_gm) = mpsc::channel(64);
        let (to_gm, from_ui) = mpsc::channel(64);
        let (gm_to_a, from_gm_a) = mpsc::channel(64);
        let (a_to_gm, a_from) = mpsc::channel(64);
        let (gm_to_b, from_gm_b) = mpsc::channel(64);
        let (b_to_gm, b_from) = mpsc::channel(64);

        let gm = GameManager::new(
            to_ui,
            from_ui,
            PlayerChannels {
                kind: kinds[0],
                to: gm_to_a,
                from: a_from,
            },
            PlayerChannels {
                kind: kinds[1],
                to: gm_to_b,
                from: b_from,
            },
        );

        Harness {
            gm,
            from_gm,
            to_gm,
            from_gm_a,
            from_gm_b,
            _a_to_gm: a_to_gm,
            _b_to_gm: b_to_gm,
        }
    }

    // A human move picked in the very first game.
    fn put(column: usize) -> PlayerToGameManager {
        PlayerToGameManager::PutToken {
            column,
            generation: 0,
        }
    }

    fn expect_update(rx: &mut mpsc::Receiver<GameManagerToUI>) -> GameUpdate {
        match rx.try_recv() {
            Ok(GameManagerToUI::Update(u)) => u,
            v => panic!("expected update, got {:?}", v),
        }
    }

    #[test]
    fn test_status_vs_ai() {
        assert_eq!(status_text(GameState::WaitingFor(Side::A), VS_AI), "Your Turn");
        assert_eq!(
            status_text(GameState::WaitingFor(Side::B), VS_AI),
            "AI is thinking..."
        );
        assert_eq!(
            status_text(GameState::WonBy(Side::A), VS_AI),
            "You win! Click Reset to play again."
        );
        assert_eq!(
            status_text(GameState::WonBy(Side::B), VS_AI),
            "AI wins! Click Reset to play again."
        );
        assert_eq!(
            status_text(GameState::Draw, VS_AI),
            "Game ended in a draw! Click Reset to play again."
        );
    }

    #[test]
    fn test_status_local() {
        assert_eq!(
            status_text(GameState::WaitingFor(Side::B), LOCAL),
            "Player B's turn"
        );
        assert_eq!(
            status_text(GameState::WonBy(Side::A), LOCAL),
            "Player A wins! Click Reset to play again."
        );
    }

    #[tokio::test]
    async fn test_put_publishes_to_ui_then_players() {
        let mut h = harness(VS_AI);

        h.gm
            .handle_player_msg(0, put(5))
            .await
            .unwrap();

        let u = expect_update(&mut h.from_gm);
        assert_eq!(u.status, "AI is thinking...");
        assert_eq!(u.snapshot.num_moves, 1);
        assert_eq!(
            u.snapshot.board.get(Column::new(1, 1).cell(0)),
            Some(Side::A)
        );

        assert!(h.from_gm_a.try_recv().is_ok());
        assert!(h.from_gm_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_human_refused_while_ai_thinks() {
        let mut h = harness(VS_AI);

        h.gm
            .handle_player_msg(0, put(0))
            .await
            .unwrap();
        expect_update(&mut h.from_gm);

        // Side A again, while B (the computer) is to move.
        h.gm
            .handle_player_msg(0, put(1))
            .await
            .unwrap();

        assert!(h.from_gm.try_recv().is_err());
        assert_eq!(h.gm.game.num_moves(), 1);
    }

    #[tokio::test]
    async fn test_invalid_column_reported() {
        let mut h = harness(VS_AI);

        h.gm
            .handle_player_msg(0, put(42))
            .await
            .unwrap();

        match h.from_gm.try_recv() {
            Ok(GameManagerToUI::Rejected(s)) => {
                assert_eq!(s, "No such column, pick one of 0..15.")
            }
            v => panic!("expected rejection, got {:?}", v),
        }

        // The player is asked again.
        assert!(h.from_gm_a.try_recv().is_ok());
        assert_eq!(h.gm.game.num_moves(), 0);
    }

    #[tokio::test]
    async fn test_deferred_move_after_reset_is_discarded() {
        let mut h = harness(VS_AI);

        h.gm
            .handle_player_msg(0, put(0))
            .await
            .unwrap();
        expect_update(&mut h.from_gm);

        let mv = DeferredMove {
            side: Side::B,
            column: Column::new(2, 2),
            generation: h.gm.game.generation(),
        };

        h.gm.handle_reset().await.unwrap();
        let u = expect_update(&mut h.from_gm);
        assert_eq!(u.status, "Your Turn");
        assert_eq!(u.snapshot.generation, 1);

        h.gm
            .handle_player_msg(1, PlayerToGameManager::PutDeferred(mv))
            .await
            .unwrap();

        assert!(h.from_gm.try_recv().is_err());
        assert_eq!(*h.gm.game.board(), game::BoardState::new());
        assert_eq!(h.gm.game.state(), GameState::WaitingFor(Side::A));
    }

    #[tokio::test]
    async fn test_human_move_from_before_reset_is_discarded() {
        let mut h = harness(LOCAL);

        h.gm.handle_reset().await.unwrap();
        expect_update(&mut h.from_gm);
        h.from_gm_a.try_recv().unwrap();

        // Picked against the board of generation 0, which is gone by now.
        h.gm.handle_player_msg(0, put(6)).await.unwrap();

        assert!(h.from_gm.try_recv().is_err());
        assert_eq!(h.gm.game.num_moves(), 0);
        assert_eq!(*h.gm.game.board(), game::BoardState::new());

        let fresh = PlayerToGameManager::PutToken {
            column: 6,
            generation: 1,
        };
        h.gm.handle_player_msg(0, fresh).await.unwrap();

        let u = expect_update(&mut h.from_gm);
        assert_eq!(u.snapshot.num_moves, 1);
        assert_eq!(u.status, "Player B's turn");
    }

    #[tokio::test]
    async fn test_run_stops_when_ui_is_gone() {
        let h = harness(LOCAL);
        let mut gm = h.gm;
        let mut from_gm = h.from_gm;

        h.to_gm.send(UIToGameManager::Reset).await.unwrap();
        drop(h.to_gm);

        gm.run().await.unwrap();

        // Initial update plus the one after reset.
        assert_eq!(expect_update(&mut from_gm).snapshot.generation, 0);
        assert_eq!(expect_update(&mut from_gm).snapshot.generation, 1);
    }
}
