//! Mapping from normalized field space to a renderer's world rectangle.
//!
//! `x` maps directly (`0 -> min_x`, `1 -> max_x`). The paddle-length axis is
//! inverted: normalized `y = 0` lands on `max_z` and `y = 1` on `min_z`.
//! Renderers rely on this orientation.

use pong_shared::{GameState, Scores, Side};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl WorldBounds {
    pub fn new(min_x: f32, max_x: f32, min_z: f32, max_z: f32) -> Self {
        Self {
            min_x,
            max_x,
            min_z,
            max_z,
        }
    }

    pub fn x(&self, normalized: f32) -> f32 {
        self.min_x + normalized * (self.max_x - self.min_x)
    }

    pub fn z(&self, normalized: f32) -> f32 {
        self.max_z - normalized * (self.max_z - self.min_z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldPoint {
    pub x: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldPaddles {
    pub left: WorldPoint,
    pub right: WorldPoint,
}

/// Render-ready copy of the match. Owns its data; nothing here aliases the
/// manager's state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldCoordinates {
    pub ball: WorldPoint,
    pub paddles: WorldPaddles,
    pub scores: Scores,
    pub game_over: bool,
    pub winner: Option<Side>,
}

pub fn project(state: &GameState, bounds: &WorldBounds) -> WorldCoordinates {
    let left = &state.paddles.left;
    let right = &state.paddles.right;

    WorldCoordinates {
        ball: WorldPoint {
            x: bounds.x(state.ball.x),
            z: bounds.z(state.ball.y),
        },
        paddles: WorldPaddles {
            left: WorldPoint {
                x: bounds.min_x,
                z: bounds.z(left.center()),
            },
            right: WorldPoint {
                x: bounds.max_x,
                z: bounds.z(right.center()),
            },
        },
        scores: state.scores,
        game_over: state.game_over,
        winner: state.winner,
    }
}
