mod tui;

use anyhow::Result;
use clap::Parser;
use log::{error, info};

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Duration;

use connectfour3d::game::Side;
use connectfour3d::game_manager::player_ai::{AiConfig, PlayerAi};
use connectfour3d::game_manager::player_local::{PlayerLocal, PlayerLocalToUI};
use connectfour3d::game_manager::{
    GameManager, GameManagerToPlayer, GameManagerToUI, PlayerChannels, PlayerKind,
    PlayerToGameManager, UIToGameManager,
};

/// Connect Four on a 4x4x4 board, in the terminal.
#[derive(Parser, Debug)]
#[clap(name = "connectfour-3d", version)]
struct Args {
    /// Who plays against you: the computer, or another human at the same terminal.
    #[clap(long, arg_enum, default_value = "ai")]
    opponent: OpponentKind,

    /// Let the computer make the first move.
    #[clap(long)]
    ai_first: bool,

    /// How long the computer "thinks" before its move, in milliseconds.
    #[clap(long, default_value_t = 700)]
    think_ms: u64,

    /// Seed for the computer's random moves.
    #[clap(long)]
    seed: Option<u64>,

    /// Print every update as a JSON line instead of drawing the board.
    #[clap(long)]
    json: bool,
}

#[derive(clap::ArgEnum, Debug, Copy, Clone, PartialEq, Eq)]
pub enum OpponentKind {
    Local,
    Ai,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let ai_side = match args.opponent {
        OpponentKind::Ai if args.ai_first => Some(Side::A),
        OpponentKind::Ai => Some(Side::B),
        OpponentKind::Local => None,
    };

    let ai_config = AiConfig {
        think_delay: Duration::from_millis(args.think_ms),
        seed: args.seed,
    };

    let (gm_to_ui_tx, gm_to_ui_rx) = mpsc::channel::<GameManagerToUI>(16);
    let (ui_to_gm_tx, ui_to_gm_rx) = mpsc::channel::<UIToGameManager>(16);
    let (player_to_ui_tx, player_to_ui_rx) = mpsc::channel::<PlayerLocalToUI>(1);

    let mut set = JoinSet::new();

    let player_a = spawn_player(&mut set, Side::A, ai_side, &ai_config, &player_to_ui_tx);
    let player_b = spawn_player(&mut set, Side::B, ai_side, &ai_config, &player_to_ui_tx);
    drop(player_to_ui_tx);

    set.spawn(async move {
        let mut gm = GameManager::new(gm_to_ui_tx, ui_to_gm_rx, player_a, player_b);
        gm.run().await
    });

    let mut ui = tui::Tui::new(gm_to_ui_rx, player_to_ui_rx, ui_to_gm_tx, args.json);

    // Normally the tasks run for as long as the UI does; if some of them finish earlier, it's
    // because of an error, and there is no game to play anymore.
    tokio::select! {
        res = ui.run() => {
            res?;
        }

        Some(v) = set.join_next() => {
            match v {
                Err(err) => error!("task panicked {:?}", err),
                Ok(Err(err)) => error!("task returned error {:?}", err),
                Ok(Ok(())) => info!("task returned ok"),
            }
        }
    }

    set.shutdown().await;

    Ok(())
}

/// Creates the player for the given side and spawns it on the set. Returns the GameManager's end
/// of its channels.
fn spawn_player(
    set: &mut JoinSet<Result<()>>,
    side: Side,
    ai_side: Option<Side>,
    ai_config: &AiConfig,
    to_ui: &mpsc::Sender<PlayerLocalToUI>,
) -> PlayerChannels {
    let (gm_to_player_tx, gm_to_player_rx) = mpsc::channel::<GameManagerToPlayer>(16);
    let (player_to_gm_tx, player_to_gm_rx) = mpsc::channel::<PlayerToGameManager>(16);

    let kind = if ai_side == Some(side) {
        let mut p = PlayerAi::new(side, ai_config.clone(), gm_to_player_rx, player_to_gm_tx);
        set.spawn(async move { p.run().await });

        PlayerKind::Ai
    } else {
        let mut p = PlayerLocal::new(side, gm_to_player_rx, player_to_gm_tx, to_ui.clone());
        set.spawn(async move { p.run().await });

        PlayerKind::Human
    };

    PlayerChannels {
        kind,
        to: gm_to_player_tx,
        from: player_to_gm_rx,
    }
}
