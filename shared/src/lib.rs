//! Shared game model for the 3D pong client.
//!
//! Everything here lives in normalized space: both field axes run from 0 to 1
//! and nothing depends on how the field is rendered. The `physics` module is a
//! set of pure functions over the data types in `state`; `protocol` carries
//! the packets exchanged with a remote authority.

pub mod physics;
pub mod protocol;
pub mod state;

pub use physics::PhysicsConfig;
pub use protocol::{CodecError, Packet, PaddleSnapshot, PlayerId, ServerSnapshot, SideMap};
pub use state::{
    Ball, GameState, GameStateView, Movement, Paddle, Paddles, Phase, PlayerNames, Scores, Side,
};

pub const PADDLE_SPEED: f32 = 0.01;
pub const PADDLE_HEIGHT: f32 = 0.1;
pub const PADDLE_HALF_WIDTH: f32 = 0.02;
pub const BALL_RADIUS: f32 = 0.02;
pub const BALL_SPEED_X: f32 = 0.006;
pub const BALL_SPEED_Y: f32 = 0.008;
pub const GOAL_MARGIN: f32 = 0.02;
/// Hit-offset coefficient applied on paddle contact.
pub const DEFLECTION: f32 = 0.1;
pub const DEFAULT_MAX_SCORE: u32 = 5;

/// Normalized x of the left paddle plane.
pub const LEFT_PADDLE_X: f32 = 0.0;
/// Normalized x of the right paddle plane.
pub const RIGHT_PADDLE_X: f32 = 1.0;
