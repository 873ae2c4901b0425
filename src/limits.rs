//! Anti-abuse perimeter: per-session rate limiting, delta/range validation,
//! and user-string sanitization.
//!
//! Every inbound frame passes through here before the router sees it.
//! Rejections are single-line messages safe to display in a chat log;
//! rate-limit hits are dropped silently to avoid amplification.

use parking_lot::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Minimum spacing between accepted frames from one session.
pub const MIN_MESSAGE_INTERVAL: Duration = Duration::from_millis(50);

/// Largest accepted horizontal move per frame, in tiles.
pub const MAX_MOVE_DELTA: f64 = 20.0;

/// Block mutation reach in tiles (Chebyshev), by declared client kind.
pub const HUMAN_BLOCK_RANGE: i64 = 10;
pub const AGENT_BLOCK_RANGE: i64 = 50;

/// Farthest requestable chunk, Chebyshev distance from the player's chunk.
pub const CHUNK_REQUEST_RADIUS: i32 = 5;

pub const MAX_CHAT_LEN: usize = 500;
pub const MAX_NAME_LEN: usize = 16;

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

/// Validation failures replied to the sender as `error` frames. The display
/// string is the wire message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Reject {
    #[error("Movement too large")]
    MovementTooLarge,
    #[error("Invalid numeric value")]
    NotFinite,
    #[error("Invalid tile type")]
    InvalidTile,
    #[error("Target out of range")]
    OutOfRange,
    #[error("Chunk out of range")]
    ChunkTooFar,
    #[error("No block to remove at that position")]
    NoBlockToRemove,
    #[error("Unknown message type: {0}")]
    UnknownType(String),
    #[error("Invalid {0} message")]
    BadPayload(String),
}

// ---------------------------------------------------------------------------
// Rate gate
// ---------------------------------------------------------------------------

/// Per-session arrival-rate gate. A frame landing within
/// [`MIN_MESSAGE_INTERVAL`] of the previous *accepted* frame is dropped.
pub struct RateGate {
    last_accepted: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn new() -> Self {
        Self {
            last_accepted: Mutex::new(None),
        }
    }

    /// Record an arrival; true means the frame may proceed.
    pub fn admit(&self, now: Instant) -> bool {
        let mut last = self.last_accepted.lock();
        if let Some(prev) = *last {
            if now.duration_since(prev) < MIN_MESSAGE_INTERVAL {
                return false;
            }
        }
        *last = Some(now);
        true
    }
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// String sanitization
// ---------------------------------------------------------------------------

fn strip_control(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(*c, '\u{0000}'..='\u{001F}' | '\u{007F}'))
        .collect()
}

/// Trim, clamp to [`MAX_CHAT_LEN`] characters, strip control code points,
/// in that order. Empty results are dropped.
pub fn sanitize_chat(input: &str) -> Option<String> {
    let clipped: String = input.trim().chars().take(MAX_CHAT_LEN).collect();
    let cleaned = strip_control(&clipped);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Same as chat sanitization, with the 16-character display-name clamp.
pub fn sanitize_name(input: &str) -> Option<String> {
    let cleaned: String = strip_control(input).trim().chars().take(MAX_NAME_LEN).collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Strict `#RRGGBB` check.
pub fn valid_color(input: &str) -> bool {
    let bytes = input.as_bytes();
    bytes.len() == 7 && bytes[0] == b'#' && bytes[1..].iter().all(|b| b.is_ascii_hexdigit())
}

// ---------------------------------------------------------------------------
// Spatial guards
// ---------------------------------------------------------------------------

/// Block mutation reach, measured Chebyshev from the rounded avatar position.
pub fn within_block_range(px: f64, py: f64, x: i64, y: i64, is_agent: bool) -> bool {
    let range = if is_agent {
        AGENT_BLOCK_RANGE
    } else {
        HUMAN_BLOCK_RANGE
    };
    let dx = (x - px.round() as i64).abs();
    let dy = (y - py.round() as i64).abs();
    dx.max(dy) <= range
}

/// Raw inbound tile id to the closed material set.
pub fn check_tile(raw: i64) -> Result<crate::types::Tile, Reject> {
    u8::try_from(raw)
        .ok()
        .and_then(|v| crate::types::Tile::try_from(v).ok())
        .ok_or(Reject::InvalidTile)
}
