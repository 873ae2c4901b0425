//! Tagged-JSON wire protocol.
//!
//! This module owns **every frame that crosses the socket boundary** between
//! the server core and any client (browser renderer, AI agent, test probe…).
//!
//! ## Frame inventory
//!
//! | Direction       | Types                                                        |
//! |-----------------|--------------------------------------------------------------|
//! | client → server | `move`, `chat`, `requestChunk`, `placeBlock`, `removeBlock`, |
//! |                 | `setProfile`, `identify`, `interact`                         |
//! | server → client | `welcome`, `existingPlayers`, `playerJoined`, `playerLeft`,  |
//! |                 | `playerMoved`, `positionCorrection`, `profileUpdate`,        |
//! |                 | `chunkData`, `chatMessage`, `blockUpdate`, `zoneChanged`,    |
//! |                 | `interactResult`, `error`                                    |
//!
//! ## Design rules
//!
//! 1. Every frame is a JSON object tagged by a `type` field; the tag string
//!    is the sole external contract.
//! 2. Inbound frames are a closed sum ([`ClientMessage`]) so dispatch is
//!    exhaustive and unknown types cannot silently drift.
//! 3. Unknown fields in a valid-type frame are ignored; missing required
//!    fields are an [`DecodeError::InvalidPayload`].
//! 4. Tile ids cross the wire as bare integers in `[0, 7]`.

use crate::players::Player;
use crate::types::{Chunk, Tile, CHUNK_SIZE, TILE_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Inbound (client → server)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Horizontal move proposal plus jump intent. The `y` member is accepted
    /// for wire compatibility and never honored; the simulator owns Y.
    #[serde(rename = "move")]
    Move {
        x: f64,
        #[serde(default)]
        jump: bool,
        #[serde(default)]
        y: Option<f64>,
    },
    #[serde(rename = "chat")]
    Chat { message: String },
    #[serde(rename = "requestChunk", rename_all = "camelCase")]
    RequestChunk { chunk_x: i32, chunk_y: i32 },
    /// Raw tile id on purpose: out-of-range values must surface as a
    /// validation error, not a parse failure.
    #[serde(rename = "placeBlock")]
    PlaceBlock { x: i64, y: i64, tile: i64 },
    #[serde(rename = "removeBlock")]
    RemoveBlock { x: i64, y: i64 },
    #[serde(rename = "setProfile")]
    SetProfile {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        color: Option<String>,
    },
    /// Toggles the sender's agent flag. The boolean is accepted for wire
    /// compatibility and never read.
    #[serde(rename = "identify")]
    Identify {
        #[serde(rename = "isAI")]
        is_ai: bool,
    },
    #[serde(rename = "interact")]
    Interact { target: String, action: String },
}

/// Tag strings of every accepted inbound frame.
pub const CLIENT_TYPES: [&str; 8] = [
    "move",
    "chat",
    "requestChunk",
    "placeBlock",
    "removeBlock",
    "setProfile",
    "identify",
    "interact",
];

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum DecodeError {
    /// Not a JSON object carrying a string `type`. Logged and dropped; no
    /// reply.
    BadFrame(String),
    /// Well-formed frame with an unrecognized tag. Replied with `error`.
    UnknownType(String),
    /// Recognized tag with missing or malformed fields. Replied with `error`.
    InvalidPayload { msg_type: String, detail: String },
}

pub fn decode_client(text: &str) -> Result<ClientMessage, DecodeError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| DecodeError::BadFrame(e.to_string()))?;
    let Some(msg_type) = value.get("type").and_then(|t| t.as_str()) else {
        return Err(DecodeError::BadFrame("missing type field".to_string()));
    };
    let msg_type = msg_type.to_string();
    if !CLIENT_TYPES.contains(&msg_type.as_str()) {
        return Err(DecodeError::UnknownType(msg_type));
    }
    serde_json::from_value(value).map_err(|e| DecodeError::InvalidPayload {
        msg_type,
        detail: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Outbound (server → client)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "welcome", rename_all = "camelCase")]
    Welcome {
        id: String,
        name: String,
        color: String,
        x: f64,
        y: f64,
        zone: String,
        /// 3×3 merged-chunk grid around spawn, keyed `"cx,cy"`. Ordered map
        /// so identically seeded nodes emit byte-identical frames.
        chunks: BTreeMap<String, ChunkPayload>,
        world_config: WorldConfigInfo,
    },
    #[serde(rename = "existingPlayers")]
    ExistingPlayers { players: Vec<PlayerInfo> },
    #[serde(rename = "playerJoined")]
    PlayerJoined {
        id: String,
        name: String,
        color: String,
        x: f64,
        y: f64,
    },
    #[serde(rename = "playerLeft")]
    PlayerLeft {
        id: String,
        name: String,
        color: String,
    },
    #[serde(rename = "playerMoved")]
    PlayerMoved { id: String, x: f64, y: f64 },
    #[serde(rename = "positionCorrection", rename_all = "camelCase")]
    PositionCorrection { x: f64, y: f64, on_ground: bool },
    #[serde(rename = "profileUpdate")]
    ProfileUpdate {
        id: String,
        name: String,
        color: String,
    },
    #[serde(rename = "chunkData")]
    ChunkData { chunk: ChunkPayload },
    #[serde(rename = "chatMessage")]
    ChatMessage {
        id: String,
        message: String,
        /// Milliseconds since the Unix epoch.
        timestamp: u64,
    },
    #[serde(rename = "blockUpdate", rename_all = "camelCase")]
    BlockUpdate {
        x: i64,
        y: i64,
        tile: Tile,
        placed_by: String,
    },
    #[serde(rename = "zoneChanged")]
    ZoneChanged { zone: String },
    #[serde(rename = "interactResult")]
    InteractResult {
        target: String,
        action: String,
        result: String,
    },
    #[serde(rename = "error")]
    Error { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub x: i32,
    pub y: i32,
    /// Row-major `tiles[local_y][local_x]`, `CHUNK_SIZE` rows of raw ids.
    pub tiles: Vec<Vec<u8>>,
}

impl From<&Chunk> for ChunkPayload {
    fn from(chunk: &Chunk) -> Self {
        Self {
            x: chunk.coord.x,
            y: chunk.coord.y,
            tiles: chunk.rows(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldConfigInfo {
    pub chunk_size: usize,
    pub tile_size: u32,
}

impl Default for WorldConfigInfo {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            tile_size: TILE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: String,
    pub name: String,
    pub color: String,
    pub x: f64,
    pub y: f64,
}

impl From<&Player> for PlayerInfo {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            color: p.color.clone(),
            x: p.x,
            y: p.y,
        }
    }
}

/// Welcome-frame key for a chunk coordinate.
pub fn chunk_key(cx: i32, cy: i32) -> String {
    format!("{},{}", cx, cy)
}
