use crate::physics::PhysicsConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One end of the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Sign of `vx` for a ball travelling toward this side's end.
    pub fn serve_direction(self) -> f32 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-tick paddle intent. `Up` increases the paddle's normalized `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Movement {
    Down,
    #[default]
    Idle,
    Up,
}

impl Movement {
    pub fn delta(self) -> f32 {
        match self {
            Movement::Down => -1.0,
            Movement::Idle => 0.0,
            Movement::Up => 1.0,
        }
    }

    /// Net effect of an (increase, decrease) key pair.
    pub fn from_keys(increase: bool, decrease: bool) -> Self {
        match (increase, decrease) {
            (true, false) => Movement::Up,
            (false, true) => Movement::Down,
            _ => Movement::Idle,
        }
    }

    pub fn is_idle(self) -> bool {
        self == Movement::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// An inactive ball is parked at the center and is not integrated.
    pub active: bool,
    pub radius: f32,
}

impl Ball {
    /// A dormant ball at the center, served toward the right end.
    pub fn new(config: &PhysicsConfig) -> Self {
        Self {
            x: 0.5,
            y: 0.5,
            vx: config.ball_speed_x,
            vy: config.ball_speed_y,
            active: false,
            radius: config.ball_radius,
        }
    }

    pub fn is_centered(&self) -> bool {
        self.x == 0.5 && self.y == 0.5
    }
}

/// A paddle. `y` is the low edge of its span, so the span is `[y, y + height]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    pub y: f32,
    pub height: f32,
}

impl Paddle {
    pub fn new(height: f32) -> Self {
        Self {
            y: (1.0 - height) / 2.0,
            height,
        }
    }

    pub fn center(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Paddles {
    pub left: Paddle,
    pub right: Paddle,
}

impl Paddles {
    pub fn get(&self, side: Side) -> &Paddle {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut Paddle {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scores {
    pub left: u32,
    pub right: u32,
}

impl Scores {
    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn set(&mut self, side: Side, value: u32) {
        match side {
            Side::Left => self.left = value,
            Side::Right => self.right = value,
        }
    }

    pub fn increment(&mut self, side: Side) -> u32 {
        let value = self.get(side) + 1;
        self.set(side, value);
        value
    }

    pub fn total(&self) -> u32 {
        self.left + self.right
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerNames {
    pub left: String,
    pub right: String,
}

impl PlayerNames {
    pub fn get(&self, side: Side) -> &str {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

impl Default for PlayerNames {
    fn default() -> Self {
        Self {
            left: "Player 1".to_string(),
            right: "Player 2".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Playing,
    GameOver,
}

/// Complete state of one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub ball: Ball,
    pub paddles: Paddles,
    pub scores: Scores,
    pub player_names: PlayerNames,
    pub max_score: u32,
    pub game_over: bool,
    pub winner: Option<Side>,
}

impl GameState {
    pub fn new(config: &PhysicsConfig, player_names: PlayerNames, max_score: u32) -> Self {
        Self {
            ball: Ball::new(config),
            paddles: Paddles {
                left: Paddle::new(config.paddle_height),
                right: Paddle::new(config.paddle_height),
            },
            scores: Scores::default(),
            player_names,
            max_score,
            game_over: false,
            winner: None,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.game_over {
            Phase::GameOver
        } else {
            Phase::Playing
        }
    }

    pub fn view(&self) -> GameStateView<'_> {
        GameStateView { state: self }
    }
}

/// Read-only window onto a [`GameState`], handed to controllers each tick.
#[derive(Debug, Clone, Copy)]
pub struct GameStateView<'a> {
    state: &'a GameState,
}

impl<'a> GameStateView<'a> {
    pub fn ball(&self) -> &'a Ball {
        &self.state.ball
    }

    pub fn paddle(&self, side: Side) -> &'a Paddle {
        self.state.paddles.get(side)
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }
}
