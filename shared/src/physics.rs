//! Rules engine: pure transformations over normalized coordinates.
//!
//! The field spans `[0, 1]` on both axes. `x` runs from the left end to the
//! right end, `y` runs along the paddle-length axis. None of these functions
//! hold state; the caller owns the [`GameState`](crate::GameState) and decides
//! when each rule applies.

use crate::state::{Ball, Movement, Paddle, Side};
use crate::{
    BALL_RADIUS, BALL_SPEED_X, BALL_SPEED_Y, DEFLECTION, GOAL_MARGIN, LEFT_PADDLE_X,
    PADDLE_HALF_WIDTH, PADDLE_HEIGHT, PADDLE_SPEED, RIGHT_PADDLE_X,
};
use serde::{Deserialize, Serialize};

/// Tuning for the rules engine. All lengths and speeds are normalized, speeds
/// are per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub paddle_speed: f32,
    pub paddle_height: f32,
    pub paddle_half_width: f32,
    pub ball_radius: f32,
    pub ball_speed_x: f32,
    pub ball_speed_y: f32,
    pub goal_margin: f32,
    pub deflection: f32,
    /// Serve velocity grows by this fraction per goal scored in the match.
    pub serve_speed_gain: f32,
    pub recenter_paddles_on_goal: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            paddle_speed: PADDLE_SPEED,
            paddle_height: PADDLE_HEIGHT,
            paddle_half_width: PADDLE_HALF_WIDTH,
            ball_radius: BALL_RADIUS,
            ball_speed_x: BALL_SPEED_X,
            ball_speed_y: BALL_SPEED_Y,
            goal_margin: GOAL_MARGIN,
            deflection: DEFLECTION,
            serve_speed_gain: 0.0,
            recenter_paddles_on_goal: false,
        }
    }
}

impl PhysicsConfig {
    /// Highest legal paddle `y`.
    pub fn paddle_max_y(&self) -> f32 {
        (1.0 - self.paddle_height).max(0.0)
    }

    /// Fastest horizontal speed that still lands at least one tick inside a
    /// paddle's collision zone before the goal line.
    pub fn max_ball_speed_x(&self) -> f32 {
        (self.paddle_half_width + self.ball_radius - self.goal_margin).max(0.0)
    }

    /// Multiplier applied to a serve after `goals` goals in the match, capped
    /// so the serve never exceeds `max_ball_speed_x`.
    pub fn serve_multiplier(&self, goals: u32) -> f32 {
        let multiplier = 1.0 + self.serve_speed_gain * goals as f32;
        if self.ball_speed_x <= 0.0 {
            return multiplier;
        }
        let cap = (self.max_ball_speed_x() / self.ball_speed_x).max(1.0);
        multiplier.min(cap)
    }
}

pub fn paddle_x(side: Side) -> f32 {
    match side {
        Side::Left => LEFT_PADDLE_X,
        Side::Right => RIGHT_PADDLE_X,
    }
}

/// Applies one step of movement and clamps the paddle inside the field.
pub fn move_paddle(current_y: f32, movement: Movement, config: &PhysicsConfig) -> f32 {
    let next = current_y + movement.delta() * config.paddle_speed;
    next.clamp(0.0, config.paddle_max_y())
}

/// Integrates the ball over `delta_time` ticks. Inactive balls do not move.
pub fn update_ball_position(ball: &mut Ball, delta_time: f32) {
    if !ball.active {
        return;
    }
    ball.x += ball.vx * delta_time;
    ball.y += ball.vy * delta_time;
}

pub fn is_touching_wall(ball: &Ball) -> bool {
    ball.y <= ball.radius || ball.y >= 1.0 - ball.radius
}

/// Elastic bounce off the side walls.
///
/// The vertical velocity is inverted so that it points back into the field,
/// which keeps a ball that is still overlapping the wall on the next tick from
/// flipping back out again.
pub fn elaborate_wall_collision(ball: &mut Ball) {
    if ball.y <= ball.radius {
        ball.vy = ball.vy.abs();
    } else if ball.y >= 1.0 - ball.radius {
        ball.vy = -ball.vy.abs();
    }
}

/// Axis-aligned overlap between the ball and the paddle on `side`.
pub fn check_paddle_collision(
    ball: &Ball,
    paddle: &Paddle,
    side: Side,
    config: &PhysicsConfig,
) -> bool {
    let lateral = (ball.x - paddle_x(side)).abs() <= ball.radius + config.paddle_half_width;
    let depth = (ball.y - paddle.center()).abs() <= ball.radius + paddle.height / 2.0;
    lateral && depth
}

/// Sends the ball back along `bounce_sign` with an angle set by the hit offset.
pub fn elaborate_paddle_collision(
    ball: &mut Ball,
    paddle: &Paddle,
    bounce_sign: f32,
    config: &PhysicsConfig,
) {
    ball.vx = bounce_sign.signum() * ball.vx.abs();
    ball.vy = (ball.y - paddle.center()) * config.deflection;
}

/// Returns the side that scored, if the ball crossed a goal line.
pub fn check_goal(ball: &Ball, config: &PhysicsConfig) -> Option<Side> {
    if ball.x > 1.0 - config.goal_margin {
        Some(Side::Left)
    } else if ball.x < config.goal_margin {
        Some(Side::Right)
    } else {
        None
    }
}

/// Parks the ball at the center, ready to be served along `direction`.
pub fn reset_ball(ball: &mut Ball, direction: f32, config: &PhysicsConfig) {
    ball.x = 0.5;
    ball.y = 0.5;
    ball.vx = direction.signum() * config.ball_speed_x;
    ball.vy = config.ball_speed_y;
    ball.active = false;
}

pub fn center_paddle(paddle: &mut Paddle) {
    paddle.y = (1.0 - paddle.height) / 2.0;
}
