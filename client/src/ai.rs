use crate::controller::InputController;
use pong_shared::physics::paddle_x;
use pong_shared::{Ball, GameStateView, Movement, Side};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Knobs for the computer opponent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTuning {
    /// Horizontal distance at which the AI starts tracking an incoming ball.
    pub reaction_distance: f32,
    /// The paddle holds still while its center is this close to the target.
    pub dead_zone: f32,
    /// Largest aim offset, as a fraction of the paddle height.
    pub aim_error: f32,
    pub seed: u64,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            reaction_distance: 0.4,
            dead_zone: 0.014,
            aim_error: 0.25,
            seed: 12345,
        }
    }
}

/// Computer opponent that tracks the predicted intercept of the ball.
///
/// Reads the match only through the view it is handed each tick; moving the
/// paddle stays with the manager.
pub struct AiController {
    side: Side,
    tuning: AiTuning,
    rng: StdRng,
    aim_offset: f32,
    tracking: bool,
}

impl AiController {
    pub fn new(side: Side, tuning: AiTuning) -> Self {
        Self {
            side,
            tuning,
            rng: StdRng::seed_from_u64(tuning.seed),
            aim_offset: 0.0,
            tracking: false,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    fn is_incoming(&self, ball: &Ball) -> bool {
        ball.vx * self.side.serve_direction() > 0.0
    }

    /// Where the ball will cross this side's paddle plane, folding the path at
    /// the walls.
    fn predict_intercept(&self, ball: &Ball) -> f32 {
        if ball.vx == 0.0 {
            return ball.y;
        }
        let ticks = (paddle_x(self.side) - ball.x) / ball.vx;
        fold_into(ball.y + ball.vy * ticks.max(0.0), ball.radius, 1.0 - ball.radius)
    }
}

impl InputController for AiController {
    fn movement(&mut self, view: GameStateView<'_>) -> Movement {
        let ball = view.ball();
        let paddle = view.paddle(self.side);

        if !ball.active {
            self.tracking = false;
            return Movement::Idle;
        }

        let incoming = self.is_incoming(ball);
        if incoming && !self.tracking {
            self.aim_offset = self.rng.gen_range(-1.0f32..=1.0)
                * self.tuning.aim_error
                * paddle.height
                / 2.0;
        }
        self.tracking = incoming;

        let in_range = (paddle_x(self.side) - ball.x).abs() <= self.tuning.reaction_distance;
        let target = if incoming && in_range {
            self.predict_intercept(ball) + self.aim_offset
        } else {
            0.5
        };

        let diff = target - paddle.center();
        if diff > self.tuning.dead_zone {
            Movement::Up
        } else if diff < -self.tuning.dead_zone {
            Movement::Down
        } else {
            Movement::Idle
        }
    }
}

fn fold_into(value: f32, low: f32, high: f32) -> f32 {
    let span = high - low;
    if span <= 0.0 {
        return low;
    }
    let period = 2.0 * span;
    let mut t = (value - low) % period;
    if t < 0.0 {
        t += period;
    }
    if t > span {
        t = period - t;
    }
    low + t
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use pong_shared::{GameState, PhysicsConfig, PlayerNames};

    fn state_with_ball(x: f32, y: f32, vx: f32, vy: f32) -> GameState {
        let mut state = GameState::new(&PhysicsConfig::default(), PlayerNames::default(), 5);
        state.ball.x = x;
        state.ball.y = y;
        state.ball.vx = vx;
        state.ball.vy = vy;
        state.ball.active = true;
        state
    }

    fn steady() -> AiTuning {
        AiTuning {
            aim_error: 0.0,
            ..AiTuning::default()
        }
    }

    #[test]
    fn test_fold_into_reflects_at_walls() {
        assert_approx_eq!(fold_into(0.5, 0.0, 1.0), 0.5);
        assert_approx_eq!(fold_into(1.2, 0.0, 1.0), 0.8);
        assert_approx_eq!(fold_into(-0.3, 0.0, 1.0), 0.3);
        assert_approx_eq!(fold_into(2.25, 0.0, 1.0), 0.25);
    }

    #[test]
    fn test_tracks_incoming_ball() {
        let mut ai = AiController::new(Side::Right, steady());

        let above = state_with_ball(0.8, 0.8, 0.006, 0.0);
        assert_eq!(ai.movement(above.view()), Movement::Up);

        let below = state_with_ball(0.8, 0.2, 0.006, 0.0);
        assert_eq!(ai.movement(below.view()), Movement::Down);

        let level = state_with_ball(0.8, 0.5, 0.006, 0.0);
        assert_eq!(ai.movement(level.view()), Movement::Idle);
    }

    #[test]
    fn test_ignores_distant_ball_and_recenters() {
        let mut ai = AiController::new(Side::Right, steady());

        let mut far = state_with_ball(0.3, 0.9, 0.006, 0.0);
        assert_eq!(ai.movement(far.view()), Movement::Idle);

        far.paddles.right.y = 0.1;
        assert_eq!(ai.movement(far.view()), Movement::Up);
    }

    #[test]
    fn test_outgoing_ball_returns_to_center() {
        let mut ai = AiController::new(Side::Left, steady());
        let mut state = state_with_ball(0.2, 0.9, 0.006, 0.0);
        state.paddles.left.y = 0.8;

        assert_eq!(ai.movement(state.view()), Movement::Down);
    }

    #[test]
    fn test_idle_while_ball_is_parked() {
        let mut ai = AiController::new(Side::Right, AiTuning::default());
        let mut state = GameState::new(&PhysicsConfig::default(), PlayerNames::default(), 5);
        state.paddles.right.y = 0.0;

        assert_eq!(ai.movement(state.view()), Movement::Idle);
    }

    #[test]
    fn test_same_seed_same_decisions() {
        let tuning = AiTuning {
            aim_error: 1.0,
            ..AiTuning::default()
        };
        let mut first = AiController::new(Side::Right, tuning);
        let mut second = AiController::new(Side::Right, tuning);

        for step in 0..50 {
            let y = 0.1 + step as f32 * 0.015;
            let state = state_with_ball(0.75, y, 0.006, 0.004);
            assert_eq!(first.movement(state.view()), second.movement(state.view()));
        }
    }
}
