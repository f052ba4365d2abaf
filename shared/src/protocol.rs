//! Packets exchanged with the remote authority in online play.
//!
//! Encoded with bincode. The authority identifies players by [`PlayerId`];
//! `SessionStart` tells the client once which id plays which side so that
//! snapshots never rely on map ordering.

use crate::state::{Ball, Movement, Side};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub type PlayerId = u32;

pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode error: {0}")]
    Encode(#[source] bincode::Error),

    #[error("decode error: {0}")]
    Decode(#[source] bincode::Error),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    Hello {
        client_version: u32,
        name: String,
    },
    SessionStart {
        left: PlayerId,
        right: PlayerId,
        you: PlayerId,
    },
    Movement {
        sequence: u32,
        movement: Movement,
    },
    Snapshot(ServerSnapshot),
    Disconnect {
        reason: String,
    },
}

impl Packet {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(self).map_err(CodecError::Encode)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        bincode::deserialize(bytes).map_err(CodecError::Decode)
    }
}

/// Paddle entry of a snapshot. A missing height keeps the local one.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct PaddleSnapshot {
    pub y: f32,
    pub height: Option<f32>,
}

/// Authoritative state pushed by the server. Every field is optional so a
/// partial message only touches what it carries.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ServerSnapshot {
    pub tick: u32,
    pub ball: Option<Ball>,
    pub paddles: Option<HashMap<PlayerId, PaddleSnapshot>>,
    pub scores: Option<HashMap<PlayerId, u32>>,
    pub winner: Option<PlayerId>,
}

/// Player-id to side assignment for one online session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideMap {
    pub left: PlayerId,
    pub right: PlayerId,
}

impl SideMap {
    pub fn id(&self, side: Side) -> PlayerId {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn side_of(&self, id: PlayerId) -> Option<Side> {
        if id == self.left {
            Some(Side::Left)
        } else if id == self.right {
            Some(Side::Right)
        } else {
            None
        }
    }
}
