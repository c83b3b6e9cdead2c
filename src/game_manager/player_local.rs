use anyhow::Result;
use log::debug;

use super::{GameManagerToPlayer, PlayerToGameManager};
use crate::game::{GameState, Side};
use crate::GameSnapshot;

use tokio::sync::mpsc;

#[derive(Debug)]
pub enum PlayerLocalToUI {
    // Lets UI know that we're waiting for the input, and when it's done,
    // the resulting column index should be sent via the provided sender.
    RequestInput(Side, mpsc::Sender<usize>),
}

/// A human sitting at this machine. Input comes from the UI, and only when it's this player's
/// turn: the UI has nowhere to send a column to otherwise.
pub struct PlayerLocal {
    side: Side,

    from_gm: mpsc::Receiver<GameManagerToPlayer>,
    to_gm: mpsc::Sender<PlayerToGameManager>,

    to_ui: mpsc::Sender<PlayerLocalToUI>,

    // The outstanding input request: generation of the game it was made for, and the receiving
    // end of the channel handed to the UI. Every request gets a fresh channel, so a column picked
    // for an older request can't be taken for the current one.
    input: Option<(u64, mpsc::Receiver<usize>)>,
}

impl PlayerLocal {
    pub fn new(
        side: Side,
        from_gm: mpsc::Receiver<GameManagerToPlayer>,
        to_gm: mpsc::Sender<PlayerToGameManager>,
        to_ui: mpsc::Sender<PlayerLocalToUI>,
    ) -> PlayerLocal {
        PlayerLocal {
            side,
            from_gm,
            to_gm,
            to_ui,
            input: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        loop {
            tokio::select! {
                val = self.from_gm.recv() => {
                    let val = match val {
                        Some(val) => val,
                        // GameManager is gone, nothing left to do.
                        None => return Ok(()),
                    };

                    match val {
                        GameManagerToPlayer::GameState(snapshot) => {
                            self.handle_game_state(snapshot).await?;
                        },
                    }
                }

                Some((generation, column)) = recv_input(&mut self.input) => {
                    debug!("player {}: got column from UI: {}", self.side, column);
                    self.input = None;
                    self.to_gm
                        .send(PlayerToGameManager::PutToken { column, generation })
                        .await?;
                }
            }
        }
    }

    async fn handle_game_state(&mut self, snapshot: GameSnapshot) -> Result<()> {
        match snapshot.game_state {
            GameState::WaitingFor(next_move_side) => {
                if self.side != next_move_side {
                    self.input = None;
                    return Ok(());
                }

                // It's our turn, so request input from the UI.
                let (column_sender, column_receiver) = mpsc::channel::<usize>(1);
                self.input = Some((snapshot.generation, column_receiver));

                self.to_ui
                    .send(PlayerLocalToUI::RequestInput(self.side, column_sender))
                    .await?;
            }

            // Nothing to ask for, but still enumerating them all explicitly so that if the enum
            // changes, we're forced by the compiler to revisit this logic.
            GameState::WonBy(_) => self.input = None,
            GameState::Draw => self.input = None,
        };

        Ok(())
    }
}

// Next column from the outstanding input request, along with the generation it was asked for.
// Never resolves if there is no request.
async fn recv_input(input: &mut Option<(u64, mpsc::Receiver<usize>)>) -> Option<(u64, usize)> {
    match input {
        Some((generation, rx)) => rx.recv().await.map(|column| (*generation, column)),
        None => std::future::pending().await,
    }
}
