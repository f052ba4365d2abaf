//! Match orchestration.
//!
//! [`GameManager`] owns the [`GameState`] and is its only writer. Each call to
//! [`GameManager::update`] advances the match by exactly one tick: controllers
//! are polled, then either the rules engine runs (local modes) or the latest
//! authoritative snapshot is applied (online mode). Nothing in here blocks.

use crate::ai::AiController;
use crate::config::{ConfigUpdate, GameMode, MatchConfig, SetupError};
use crate::controller::InputController;
use crate::input::{KeyBinding, KeyboardState, LocalController};
use crate::network::{NetworkChannel, NetworkController};
use crate::projection::{self, WorldBounds, WorldCoordinates};
use log::{debug, error, info};
use pong_shared::physics;
use pong_shared::{GameState, Movement, Phase, Scores, ServerSnapshot, Side, SideMap};

type Controller = Box<dyn InputController>;

/// Hooks fired synchronously from inside [`GameManager::update`].
#[derive(Default)]
pub struct MatchCallbacks {
    pub on_goal: Option<Box<dyn FnMut(Side, Scores)>>,
    pub on_game_over: Option<Box<dyn FnMut(Side)>>,
    pub on_ball_activate: Option<Box<dyn FnMut()>>,
}

impl MatchCallbacks {
    pub fn on_goal(mut self, f: impl FnMut(Side, Scores) + 'static) -> Self {
        self.on_goal = Some(Box::new(f));
        self
    }

    pub fn on_game_over(mut self, f: impl FnMut(Side) + 'static) -> Self {
        self.on_game_over = Some(Box::new(f));
        self
    }

    pub fn on_ball_activate(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_ball_activate = Some(Box::new(f));
        self
    }
}

pub struct GameManager {
    mode: Option<GameMode>,
    config: MatchConfig,
    state: GameState,
    left: Option<Controller>,
    right: Option<Controller>,
    keyboard: KeyboardState,
    pending_channel: Option<Box<dyn NetworkChannel>>,
    callbacks: MatchCallbacks,
}

impl GameManager {
    pub fn new(mode: GameMode, config: MatchConfig) -> Self {
        let mut manager = Self::idle(Some(mode), config);
        manager.initialize_mode();
        manager
    }

    /// Online match over `channel`.
    pub fn online(config: MatchConfig, channel: Box<dyn NetworkChannel>) -> Self {
        let mut manager = Self::idle(Some(GameMode::Online), config);
        manager.pending_channel = Some(channel);
        manager.initialize_mode();
        manager
    }

    /// Builds a manager from a mode name. An unknown name is logged and
    /// leaves the manager without controllers.
    pub fn from_mode_name(name: &str, config: MatchConfig) -> Self {
        match name.parse::<GameMode>() {
            Ok(mode) => Self::new(mode, config),
            Err(e) => {
                error!("{}", e);
                Self::idle(None, config)
            }
        }
    }

    fn idle(mode: Option<GameMode>, config: MatchConfig) -> Self {
        let config = config.validated();
        let state = Self::fresh_state(&config);
        Self {
            mode,
            config,
            state,
            left: None,
            right: None,
            keyboard: KeyboardState::new(),
            pending_channel: None,
            callbacks: MatchCallbacks::default(),
        }
    }

    fn fresh_state(config: &MatchConfig) -> GameState {
        GameState::new(
            &config.physics,
            config.player_names.clone(),
            config.max_score,
        )
    }

    fn initialize_mode(&mut self) {
        let Some(mode) = self.mode else {
            return;
        };

        match self.build_controllers(mode) {
            Ok((left, right)) => {
                self.left = Some(left);
                self.right = Some(right);
                info!("Mode {} ready", mode);
            }
            Err(e) => {
                error!("Cannot start {}: {}", mode, e);
                self.left = None;
                self.right = None;
            }
        }
    }

    fn build_controllers(&mut self, mode: GameMode) -> Result<(Controller, Controller), SetupError> {
        let keyboard = self.keyboard.clone();
        let local = |binding: KeyBinding| -> Controller {
            Box::new(LocalController::new(keyboard.clone(), binding))
        };

        let controllers: (Controller, Controller) = match mode {
            GameMode::LocalMultiplayer => (local(KeyBinding::wasd()), local(KeyBinding::arrows())),
            GameMode::LocalVsAi => (
                local(KeyBinding::arrows()),
                Box::new(AiController::new(Side::Right, self.config.ai)),
            ),
            GameMode::Online => {
                let player = local(KeyBinding::arrows());
                let channel = self
                    .pending_channel
                    .take()
                    .ok_or(SetupError::MissingChannel)?;
                let remote: Controller = Box::new(NetworkController::new(
                    channel,
                    self.config.local_player,
                ));
                match self.config.local_player {
                    Side::Left => (player, remote),
                    Side::Right => (remote, player),
                }
            }
        };
        Ok(controllers)
    }

    /// Advances the match by one tick. `delta_time` is in ticks; pass `1.0`
    /// from a fixed-step loop.
    pub fn update(&mut self, delta_time: f32) {
        if self.state.game_over {
            return;
        }

        let left_movement = poll(&mut self.left, &self.state);
        let right_movement = poll(&mut self.right, &self.state);

        if self.mode == Some(GameMode::Online) {
            self.update_online(left_movement, right_movement);
            return;
        }

        self.move_paddle(Side::Left, left_movement);
        self.move_paddle(Side::Right, right_movement);

        let config = self.config.physics;
        let ball = &mut self.state.ball;
        physics::update_ball_position(ball, delta_time);

        if physics::is_touching_wall(ball) {
            physics::elaborate_wall_collision(ball);
        }

        // One paddle bounce per tick, left first. The vx gate keeps a ball
        // that is already heading away from a paddle from bouncing again.
        let paddles = self.state.paddles;
        if ball.vx < 0.0 && physics::check_paddle_collision(ball, &paddles.left, Side::Left, &config)
        {
            physics::elaborate_paddle_collision(ball, &paddles.left, 1.0, &config);
        } else if ball.vx > 0.0
            && physics::check_paddle_collision(ball, &paddles.right, Side::Right, &config)
        {
            physics::elaborate_paddle_collision(ball, &paddles.right, -1.0, &config);
        }

        if let Some(scorer) = physics::check_goal(ball, &config) {
            self.handle_goal(scorer);
        }
    }

    fn move_paddle(&mut self, side: Side, movement: Movement) {
        if movement.is_idle() {
            return;
        }

        let paddle = self.state.paddles.get_mut(side);
        paddle.y = physics::move_paddle(paddle.y, movement, &self.config.physics);

        if !self.state.ball.active {
            self.state.ball.active = true;
            debug!("Ball served by {} paddle", side);
            if let Some(on_ball_activate) = self.callbacks.on_ball_activate.as_mut() {
                on_ball_activate();
            }
        }
    }

    fn update_online(&mut self, left_movement: Movement, right_movement: Movement) {
        let local_side = self.config.local_player;
        let local_movement = match local_side {
            Side::Left => left_movement,
            Side::Right => right_movement,
        };

        let slot = match local_side.opposite() {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        };
        let Some(network) = slot.as_mut().and_then(|c| c.as_network_mut()) else {
            return;
        };

        network.send_movement(local_movement);
        let snapshot = network.server_game_state();
        let side_map = network.side_map();

        if let Some(snapshot) = snapshot {
            self.apply_snapshot(snapshot, side_map);
        }
    }

    /// Replaces local state with whatever the snapshot carries. Absent fields
    /// leave the local values untouched.
    fn apply_snapshot(&mut self, snapshot: ServerSnapshot, side_map: Option<SideMap>) {
        debug!("Applying server snapshot for tick {}", snapshot.tick);

        if let Some(ball) = snapshot.ball {
            self.state.ball = ball;
        }

        let Some(sides) = side_map else {
            if snapshot.paddles.is_some() || snapshot.scores.is_some() || snapshot.winner.is_some()
            {
                debug!("No side assignment yet, skipping paddles and scores");
            }
            return;
        };

        if let Some(paddles) = snapshot.paddles {
            for side in [Side::Left, Side::Right] {
                if let Some(remote) = paddles.get(&sides.id(side)) {
                    let paddle = self.state.paddles.get_mut(side);
                    paddle.y = remote.y;
                    if let Some(height) = remote.height {
                        paddle.height = height;
                    }
                }
            }
        }

        if let Some(scores) = snapshot.scores {
            let before = self.state.scores;
            for side in [Side::Left, Side::Right] {
                if let Some(&score) = scores.get(&sides.id(side)) {
                    self.state.scores.set(side, score);
                }
            }
            for side in [Side::Left, Side::Right] {
                if self.state.scores.get(side) > before.get(side) {
                    self.announce_goal(side);
                }
            }
        }

        if let Some(winner) = snapshot.winner.and_then(|id| sides.side_of(id)) {
            self.finish(winner);
        }
    }

    /// Scores a point for `scorer` and serves toward the side that conceded.
    fn handle_goal(&mut self, scorer: Side) {
        if self.state.game_over {
            return;
        }
        let score = self.state.scores.increment(scorer);

        let config = self.config.physics;
        let ball = &mut self.state.ball;
        physics::reset_ball(ball, scorer.opposite().serve_direction(), &config);
        let multiplier = config.serve_multiplier(self.state.scores.total());
        ball.vx *= multiplier;
        ball.vy *= multiplier;

        if config.recenter_paddles_on_goal {
            physics::center_paddle(&mut self.state.paddles.left);
            physics::center_paddle(&mut self.state.paddles.right);
        }

        self.announce_goal(scorer);

        if score >= self.state.max_score {
            self.finish(scorer);
        }
    }

    fn announce_goal(&mut self, scorer: Side) {
        let scores = self.state.scores;
        info!(
            "{} scores ({} - {})",
            self.state.player_names.get(scorer),
            scores.left,
            scores.right
        );
        if let Some(on_goal) = self.callbacks.on_goal.as_mut() {
            on_goal(scorer, scores);
        }
    }

    fn finish(&mut self, winner: Side) {
        if self.state.game_over {
            return;
        }
        self.state.game_over = true;
        self.state.winner = Some(winner);
        info!("Game Over! Winner: {}", self.state.player_names.get(winner));
        if let Some(on_game_over) = self.callbacks.on_game_over.as_mut() {
            on_game_over(winner);
        }
    }

    pub fn set_callbacks(&mut self, callbacks: MatchCallbacks) {
        self.callbacks = callbacks;
    }

    /// Borrowed view for renderers. Copy what needs to outlive the tick.
    pub fn game_state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn mode(&self) -> Option<GameMode> {
        self.mode
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Handle for the key listener feeding the local controllers.
    pub fn keyboard(&self) -> KeyboardState {
        self.keyboard.clone()
    }

    pub fn has_controllers(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }

    pub fn world_coordinates(&self, bounds: &WorldBounds) -> WorldCoordinates {
        projection::project(&self.state, bounds)
    }

    /// Channel for the next online initialization.
    pub fn attach_channel(&mut self, channel: Box<dyn NetworkChannel>) {
        if let Some(mut previous) = self.pending_channel.replace(channel) {
            previous.close();
        }
    }

    /// Swaps in a custom controller for one side and releases the old one.
    pub fn replace_controller(&mut self, side: Side, controller: Controller) {
        let slot = match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        };
        if let Some(mut previous) = slot.replace(controller) {
            previous.destroy();
        }
    }

    /// Fresh match with the current configuration. Controllers are kept.
    pub fn reset(&mut self) {
        self.state = Self::fresh_state(&self.config);
    }

    /// Tears down the controllers, applies `update` and starts over in `mode`.
    pub fn change_mode(&mut self, mode: GameMode, update: ConfigUpdate) {
        self.destroy();
        self.keyboard.release_all();
        self.mode = Some(mode);
        self.config.merge(update);
        self.config = self.config.clone().validated();
        self.reset();
        self.initialize_mode();
    }

    /// Releases both controllers. Safe to call more than once.
    pub fn destroy(&mut self) {
        for slot in [&mut self.left, &mut self.right] {
            if let Some(mut controller) = slot.take() {
                controller.destroy();
            }
        }
    }
}

impl Drop for GameManager {
    fn drop(&mut self) {
        self.destroy();
        if let Some(mut channel) = self.pending_channel.take() {
            channel.close();
        }
    }
}

fn poll(slot: &mut Option<Controller>, state: &GameState) -> Movement {
    slot.as_mut()
        .map(|controller| controller.movement(state.view()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{ChannelLink, NetworkChannel};
    use assert_approx_eq::assert_approx_eq;
    use pong_shared::{Packet, PaddleSnapshot, PlayerNames};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    fn local_manager() -> GameManager {
        GameManager::new(GameMode::LocalMultiplayer, MatchConfig::default())
    }

    fn place_ball(manager: &mut GameManager, x: f32, y: f32, vx: f32, vy: f32) {
        let ball = &mut manager.state.ball;
        ball.x = x;
        ball.y = y;
        ball.vx = vx;
        ball.vy = vy;
        ball.active = true;
    }

    #[test]
    fn test_first_movement_serves_the_ball() {
        let mut manager = local_manager();
        let keyboard = manager.keyboard();
        let start_y = manager.game_state().paddles.left.y;
        let config = manager.config().physics;

        keyboard.press("w");
        manager.update(1.0);

        let state = manager.game_state();
        assert!(state.ball.active);
        assert_approx_eq!(state.paddles.left.y, start_y + config.paddle_speed);
        assert_approx_eq!(state.ball.x, 0.5 + config.ball_speed_x);
        assert_approx_eq!(state.ball.y, 0.5 + config.ball_speed_y);
    }

    #[test]
    fn test_ball_stays_parked_without_input() {
        let mut manager = local_manager();
        for _ in 0..100 {
            manager.update(1.0);
        }

        let ball = &manager.game_state().ball;
        assert!(!ball.active);
        assert!(ball.is_centered());
    }

    #[test]
    fn test_goal_serves_toward_conceding_side() {
        let mut manager = local_manager();

        place_ball(&mut manager, 0.979, 0.1, 0.006, 0.0);
        manager.update(1.0);

        let state = manager.game_state();
        assert_eq!(state.scores.left, 1);
        assert!(state.ball.vx > 0.0);
        assert!(!state.ball.active);
        assert!(state.ball.is_centered());

        place_ball(&mut manager, 0.021, 0.9, -0.006, 0.0);
        manager.update(1.0);

        let state = manager.game_state();
        assert_eq!(state.scores.right, 1);
        assert!(state.ball.vx < 0.0);
    }

    #[test]
    fn test_outbound_ball_does_not_bounce_twice() {
        let mut manager = local_manager();

        // Inside the left paddle's zone but already heading right.
        place_ball(&mut manager, 0.03, 0.5, 0.006, 0.0);
        manager.update(1.0);

        assert_eq!(manager.game_state().ball.vx, 0.006);
    }

    #[test]
    fn test_inbound_ball_bounces_off_paddle() {
        let mut manager = local_manager();

        place_ball(&mut manager, 0.966, 0.52, 0.006, 0.0);
        manager.update(1.0);

        let ball = manager.game_state().ball;
        assert_eq!(ball.vx, -0.006);
        assert!(ball.vy > 0.0);
    }

    #[test]
    fn test_game_over_is_terminal() {
        let mut manager = local_manager();
        let keyboard = manager.keyboard();

        for _ in 0..5 {
            place_ball(&mut manager, 0.979, 0.1, 0.006, 0.0);
            manager.update(1.0);
        }
        assert_eq!(manager.game_state().scores.left, 5);

        assert_eq!(manager.phase(), Phase::GameOver);
        assert_eq!(manager.game_state().winner, Some(Side::Left));

        let frozen = manager.game_state().clone();
        keyboard.press("ArrowUp");
        for _ in 0..10 {
            manager.update(1.0);
        }
        assert_eq!(manager.game_state(), &frozen);

        manager.reset();
        assert_eq!(manager.phase(), Phase::Playing);
        assert_eq!(manager.game_state().scores, Scores::default());
        assert_eq!(manager.game_state().max_score, 5);
    }

    #[test]
    fn test_goal_after_game_over_is_ignored() {
        let mut manager = GameManager::new(
            GameMode::LocalMultiplayer,
            MatchConfig {
                max_score: 1,
                ..MatchConfig::default()
            },
        );
        manager.handle_goal(Side::Right);
        assert_eq!(manager.phase(), Phase::GameOver);

        let frozen = manager.game_state().clone();
        manager.handle_goal(Side::Right);
        manager.handle_goal(Side::Left);

        assert_eq!(manager.game_state(), &frozen);
        assert_eq!(manager.game_state().scores.right, 1);
    }

    #[test]
    fn test_change_mode_releases_held_keys() {
        let mut manager = local_manager();
        let keyboard = manager.keyboard();
        keyboard.press("ArrowUp");

        manager.change_mode(GameMode::LocalVsAi, ConfigUpdate::default());
        manager.update(1.0);

        assert!(!keyboard.is_down("ArrowUp"));
        assert!(!manager.game_state().ball.active);
    }

    #[test]
    fn test_callbacks_fire_in_order() {
        let mut manager = GameManager::new(
            GameMode::LocalMultiplayer,
            MatchConfig {
                max_score: 1,
                ..MatchConfig::default()
            },
        );
        let events = Rc::new(RefCell::new(Vec::new()));

        let goal_log = Rc::clone(&events);
        let over_log = Rc::clone(&events);
        let serve_log = Rc::clone(&events);
        manager.set_callbacks(
            MatchCallbacks::default()
                .on_goal(move |side, scores| {
                    goal_log
                        .borrow_mut()
                        .push(format!("goal {} {}-{}", side, scores.left, scores.right))
                })
                .on_game_over(move |side| over_log.borrow_mut().push(format!("over {}", side)))
                .on_ball_activate(move || serve_log.borrow_mut().push("serve".to_string())),
        );

        manager.keyboard().press("ArrowDown");
        manager.update(1.0);
        manager.keyboard().release("ArrowDown");

        place_ball(&mut manager, 0.021, 0.9, -0.006, 0.0);
        manager.update(1.0);

        assert_eq!(
            *events.borrow(),
            vec![
                "serve".to_string(),
                "goal right 0-1".to_string(),
                "over right".to_string()
            ]
        );
    }

    #[test]
    fn test_unknown_mode_leaves_manager_idle() {
        let mut manager = GameManager::from_mode_name("tournament", MatchConfig::default());

        assert_eq!(manager.mode(), None);
        assert!(!manager.has_controllers());

        manager.keyboard().press("w");
        manager.update(1.0);
        assert!(!manager.game_state().ball.active);
    }

    #[test]
    fn test_online_without_channel_is_idle() {
        let mut manager = GameManager::new(GameMode::Online, MatchConfig::default());
        assert!(!manager.has_controllers());
        manager.update(1.0);
        assert!(manager.game_state().ball.is_centered());

        let (link, _server) = ChannelLink::pair();
        manager.attach_channel(Box::new(link));
        manager.change_mode(GameMode::Online, ConfigUpdate::default());
        assert!(manager.has_controllers());
    }

    #[test]
    fn test_change_mode_resets_and_merges() {
        let mut manager = local_manager();
        place_ball(&mut manager, 0.979, 0.1, 0.006, 0.0);
        manager.update(1.0);
        assert_eq!(manager.game_state().scores.left, 1);

        manager.change_mode(
            GameMode::LocalVsAi,
            ConfigUpdate {
                max_score: Some(7),
                ..ConfigUpdate::default()
            },
        );

        let state = manager.game_state();
        assert_eq!(manager.mode(), Some(GameMode::LocalVsAi));
        assert_eq!(state.scores, Scores::default());
        assert_eq!(state.max_score, 7);
        assert_eq!(state.player_names, PlayerNames::default());
        assert!(manager.has_controllers());
    }

    #[test]
    fn test_online_applies_snapshot_without_local_physics() {
        let (link, mut server) = ChannelLink::pair();
        let mut manager = GameManager::online(MatchConfig::default(), Box::new(link));
        let keyboard = manager.keyboard();

        server
            .send(Packet::SessionStart {
                left: 7,
                right: 3,
                you: 7,
            })
            .unwrap();

        let mut ball = manager.game_state().ball;
        ball.x = 0.3;
        ball.active = true;
        let mut paddles = HashMap::new();
        paddles.insert(
            3,
            PaddleSnapshot {
                y: 0.2,
                height: None,
            },
        );
        let mut scores = HashMap::new();
        scores.insert(7, 1);
        server
            .send(Packet::Snapshot(ServerSnapshot {
                tick: 10,
                ball: Some(ball),
                paddles: Some(paddles),
                scores: Some(scores),
                winner: None,
            }))
            .unwrap();

        let left_before = manager.game_state().paddles.left;
        keyboard.press("ArrowUp");
        manager.update(1.0);

        let state = manager.game_state();
        assert_eq!(state.ball, ball);
        assert_eq!(state.paddles.left, left_before);
        assert_eq!(state.paddles.right.y, 0.2);
        assert_eq!(state.scores.left, 1);
        assert_eq!(state.scores.right, 0);

        assert_eq!(
            server.try_recv(),
            Some(Packet::Movement {
                sequence: 1,
                movement: Movement::Up
            })
        );

        // No snapshot pending: last state persists untouched.
        manager.update(1.0);
        assert_eq!(manager.game_state().ball, ball);
    }

    #[test]
    fn test_online_winner_ends_match() {
        let (link, mut server) = ChannelLink::pair();
        let mut manager = GameManager::online(
            MatchConfig {
                local_player: Side::Right,
                ..MatchConfig::default()
            },
            Box::new(link),
        );

        server
            .send(Packet::SessionStart {
                left: 1,
                right: 2,
                you: 2,
            })
            .unwrap();
        server
            .send(Packet::Snapshot(ServerSnapshot {
                tick: 99,
                winner: Some(2),
                ..ServerSnapshot::default()
            }))
            .unwrap();

        manager.update(1.0);

        assert_eq!(manager.phase(), Phase::GameOver);
        assert_eq!(manager.game_state().winner, Some(Side::Right));
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut manager = local_manager();
        manager.destroy();
        manager.destroy();
        assert!(!manager.has_controllers());
        manager.update(1.0);
    }
}
