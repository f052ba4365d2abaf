use clap::Parser;
use log::{debug, info, warn};
use pong_client::ai::{AiController, AiTuning};
use pong_client::controller::InputController;
use pong_client::input::{KeyBinding, KeyboardState};
use pong_client::network::UdpLink;
use pong_client::projection::WorldBounds;
use pong_client::{GameManager, GameMode, MatchCallbacks, MatchConfig};
use pong_shared::{GameState, Movement, Phase, PlayerNames, Side, DEFAULT_MAX_SCORE};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Game mode: local_multiplayer, local_vs_ai or online
    #[arg(short = 'm', long, default_value = "local_vs_ai")]
    mode: String,

    /// Points needed to win
    #[arg(long, default_value_t = DEFAULT_MAX_SCORE)]
    max_score: u32,

    /// Stop after this many ticks even if nobody has won
    #[arg(short = 't', long, default_value = "20000")]
    ticks: u64,

    #[arg(long, default_value = "Player 1")]
    left_name: String,

    #[arg(long, default_value = "Player 2")]
    right_name: String,

    /// Side the keyboard player takes in online mode (left or right)
    #[arg(long, default_value = "left")]
    side: String,

    /// Server address for online mode
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Seed for the autopilot and the computer opponent
    #[arg(long, default_value = "12345")]
    seed: u64,

    /// Milliseconds between ticks, 0 runs as fast as possible
    #[arg(long, default_value = "0")]
    tick_ms: u64,
}

/// Presses keys on behalf of a keyboard player so the binary can run headless.
struct Autopilot {
    pilot: AiController,
    binding: KeyBinding,
    serves: bool,
}

impl Autopilot {
    fn new(side: Side, binding: KeyBinding, tuning: AiTuning, serves: bool) -> Self {
        Self {
            pilot: AiController::new(side, tuning),
            binding,
            serves,
        }
    }

    fn drive(&mut self, state: &GameState, keyboard: &KeyboardState) {
        let movement = if self.serves && !state.ball.active {
            Movement::Up
        } else {
            self.pilot.movement(state.view())
        };

        keyboard.release(&self.binding.increase);
        keyboard.release(&self.binding.decrease);
        match movement {
            Movement::Up => keyboard.press(&self.binding.increase),
            Movement::Down => keyboard.press(&self.binding.decrease),
            Movement::Idle => {}
        }
    }
}

fn autopilots(mode: Option<GameMode>, local_player: Side, seed: u64) -> Vec<Autopilot> {
    let tuning = |offset: u64| AiTuning {
        seed: seed.wrapping_add(offset),
        ..AiTuning::default()
    };

    match mode {
        Some(GameMode::LocalMultiplayer) => vec![
            Autopilot::new(Side::Left, KeyBinding::wasd(), tuning(1), true),
            Autopilot::new(Side::Right, KeyBinding::arrows(), tuning(2), false),
        ],
        Some(GameMode::LocalVsAi) => vec![Autopilot::new(
            Side::Left,
            KeyBinding::arrows(),
            tuning(1),
            true,
        )],
        Some(GameMode::Online) => vec![Autopilot::new(
            local_player,
            KeyBinding::arrows(),
            tuning(1),
            false,
        )],
        None => Vec::new(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let local_player = match args.side.to_lowercase().as_str() {
        "right" => Side::Right,
        "left" => Side::Left,
        other => {
            warn!("Unknown side {}, playing left", other);
            Side::Left
        }
    };

    let mut config = MatchConfig {
        max_score: args.max_score,
        player_names: PlayerNames {
            left: args.left_name.clone(),
            right: args.right_name.clone(),
        },
        local_player,
        ..MatchConfig::default()
    };
    config.ai.seed = args.seed;

    info!("Starting {} match, first to {}", args.mode, args.max_score);

    let mut manager = match args.mode.parse::<GameMode>() {
        Ok(GameMode::Online) => {
            info!("Connecting to: {}", args.server);
            let name = config.player_names.get(local_player).to_string();
            let link = UdpLink::connect(&args.server, &name).await?;
            GameManager::online(config, Box::new(link))
        }
        _ => GameManager::from_mode_name(&args.mode, config),
    };

    manager.set_callbacks(
        MatchCallbacks::default()
            .on_goal(|side, scores| {
                debug!("Goal for {}, now {}-{}", side, scores.left, scores.right)
            })
            .on_game_over(|side| info!("Match finished, {} side wins", side)),
    );

    let keyboard = manager.keyboard();
    let mut pilots = autopilots(manager.mode(), local_player, args.seed);
    let mut interval = (args.tick_ms > 0)
        .then(|| tokio::time::interval(Duration::from_millis(args.tick_ms)));

    let mut ticks = 0;
    while ticks < args.ticks && manager.phase() == Phase::Playing {
        if let Some(interval) = interval.as_mut() {
            interval.tick().await;
        } else if manager.mode() == Some(GameMode::Online) {
            // Leave the transport tasks room to run.
            tokio::task::yield_now().await;
        }

        for pilot in pilots.iter_mut() {
            pilot.drive(manager.game_state(), &keyboard);
        }
        manager.update(1.0);
        ticks += 1;
    }

    let state = manager.game_state();
    match state.winner {
        Some(winner) => info!(
            "{} wins {}-{} after {} ticks",
            state.player_names.get(winner),
            state.scores.left,
            state.scores.right,
            ticks
        ),
        None => info!(
            "Stopped after {} ticks at {}-{}",
            ticks, state.scores.left, state.scores.right
        ),
    }

    let world = manager.world_coordinates(&WorldBounds::new(-25.0, 25.0, -25.0, 25.0));
    debug!("Final world coordinates: {:?}", world);

    manager.destroy();
    Ok(())
}
