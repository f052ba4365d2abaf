use crate::ai::AiTuning;
use log::warn;
use pong_shared::{PhysicsConfig, PlayerNames, Side, DEFAULT_MAX_SCORE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("unknown game mode: {0}")]
    UnknownMode(String),

    #[error("online mode needs a network channel")]
    MissingChannel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Two players on one keyboard.
    LocalMultiplayer,
    /// Keyboard player on the left, computer on the right.
    LocalVsAi,
    /// Keyboard player against a remote player; the server is authoritative.
    Online,
}

impl GameMode {
    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::LocalMultiplayer => "local_multiplayer",
            GameMode::LocalVsAi => "local_vs_ai",
            GameMode::Online => "online",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "local_multiplayer" => Ok(GameMode::LocalMultiplayer),
            "local_vs_ai" => Ok(GameMode::LocalVsAi),
            "online" => Ok(GameMode::Online),
            _ => Err(SetupError::UnknownMode(s.to_string())),
        }
    }
}

/// Settings for one match. Missing fields take their defaults when
/// deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub max_score: u32,
    pub player_names: PlayerNames,
    /// Side the keyboard player controls in online play.
    pub local_player: Side,
    pub physics: PhysicsConfig,
    pub ai: AiTuning,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_score: DEFAULT_MAX_SCORE,
            player_names: PlayerNames::default(),
            local_player: Side::Left,
            physics: PhysicsConfig::default(),
            ai: AiTuning::default(),
        }
    }
}

impl MatchConfig {
    /// Replaces values that would make a match unplayable.
    pub fn validated(mut self) -> Self {
        if self.max_score == 0 {
            warn!("max_score must be positive, using {}", DEFAULT_MAX_SCORE);
            self.max_score = DEFAULT_MAX_SCORE;
        }

        let max_speed = self.physics.max_ball_speed_x();
        if self.physics.ball_speed_x > max_speed {
            warn!(
                "ball_speed_x {} would skip past the paddles, using {}",
                self.physics.ball_speed_x, max_speed
            );
            self.physics.ball_speed_x = max_speed;
        }
        self
    }

    pub fn merge(&mut self, update: ConfigUpdate) {
        if let Some(max_score) = update.max_score {
            self.max_score = max_score;
        }
        if let Some(player_names) = update.player_names {
            self.player_names = player_names;
        }
        if let Some(local_player) = update.local_player {
            self.local_player = local_player;
        }
        if let Some(physics) = update.physics {
            self.physics = physics;
        }
        if let Some(ai) = update.ai {
            self.ai = ai;
        }
    }
}

/// Partial configuration applied on a mode change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    pub max_score: Option<u32>,
    pub player_names: Option<PlayerNames>,
    pub local_player: Option<Side>,
    pub physics: Option<PhysicsConfig>,
    pub ai: Option<AiTuning>,
}
