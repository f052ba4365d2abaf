//! # Pong Client Library
//!
//! Everything that runs a match on the player's machine: the [`game::GameManager`]
//! that owns the state and advances it one tick at a time, the controllers that
//! feed it paddle movement, and the network plumbing for online play.
//!
//! ## Module Organization
//!
//! - `game`: the manager, its tick loop and the online snapshot merge
//! - `controller`: the [`controller::InputController`] seam every input source implements
//! - `input`: keyboard state and the key-driven controller
//! - `ai`: the computer opponent
//! - `network`: the channel contract, UDP and in-process transports, and the relay controller
//! - `config`: game modes and match configuration
//! - `projection`: mapping normalized coordinates into a renderer's world space
//!
//! ## Usage Example
//!
//! ```rust
//! use pong_client::config::{GameMode, MatchConfig};
//! use pong_client::game::GameManager;
//!
//! let mut manager = GameManager::new(GameMode::LocalVsAi, MatchConfig::default());
//! let keyboard = manager.keyboard();
//!
//! keyboard.press("ArrowUp");
//! manager.update(1.0);
//! assert!(manager.game_state().ball.active);
//! ```
//!
//! The simulation itself is single-threaded. Online transports run on tokio but
//! only ever hand packets to the manager through non-blocking queues.

pub mod ai;
pub mod config;
pub mod controller;
pub mod game;
pub mod input;
pub mod network;
pub mod projection;

pub use config::{ConfigUpdate, GameMode, MatchConfig, SetupError};
pub use game::{GameManager, MatchCallbacks};
