//! Inbound message routing.
//!
//! Every frame runs the same gauntlet: rate gate → decode → dispatch. The
//! dispatch match is exhaustive over [`ClientMessage`], so a new frame type
//! cannot be half-wired. Failures reply only to the sender and never
//! broadcast; rate-limit hits do not reply at all.

use crate::limits::{self, Reject};
use crate::physics;
use crate::protocol::{decode_client, ChunkPayload, ClientMessage, DecodeError, ServerMessage};
use crate::server::Server;
use crate::types::{ChunkCoord, Tile};
use log::debug;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl Server {
    pub fn handle_frame(&self, session_id: &str, text: &str) {
        self.handle_frame_at(session_id, text, Instant::now());
    }

    /// Testable entry point with an explicit arrival instant for the rate
    /// gate.
    pub fn handle_frame_at(&self, session_id: &str, text: &str, now: Instant) {
        let Some(handle) = self.broadcaster.handle(session_id) else {
            return;
        };
        if !handle.gate.admit(now) {
            debug!("rate-limited frame from {}", session_id);
            return;
        }

        let msg = match decode_client(text) {
            Ok(msg) => msg,
            Err(DecodeError::BadFrame(detail)) => {
                debug!("bad frame from {}: {}", session_id, detail);
                return;
            }
            Err(DecodeError::UnknownType(t)) => {
                self.send_error(session_id, Reject::UnknownType(t).to_string());
                return;
            }
            Err(DecodeError::InvalidPayload { msg_type, detail }) => {
                debug!("invalid {} payload from {}: {}", msg_type, session_id, detail);
                self.send_error(session_id, Reject::BadPayload(msg_type).to_string());
                return;
            }
        };

        if let Err(reject) = self.dispatch(session_id, msg) {
            self.send_error(session_id, reject.to_string());
        }
    }

    fn dispatch(&self, session_id: &str, msg: ClientMessage) -> Result<(), Reject> {
        match msg {
            // The y hint is accepted on the wire and never applied; the
            // simulator owns vertical position.
            ClientMessage::Move { x, jump, y: _ } => self.on_move(session_id, x, jump),
            ClientMessage::Chat { message } => self.on_chat(session_id, &message),
            ClientMessage::RequestChunk { chunk_x, chunk_y } => {
                self.on_request_chunk(session_id, chunk_x, chunk_y)
            }
            ClientMessage::PlaceBlock { x, y, tile } => {
                self.on_place_block(session_id, x, y, tile)
            }
            ClientMessage::RemoveBlock { x, y } => self.on_remove_block(session_id, x, y),
            ClientMessage::SetProfile { name, color } => {
                self.on_set_profile(session_id, name, color)
            }
            // The payload value is decoded for wire compatibility and
            // ignored; each frame toggles the flag.
            ClientMessage::Identify { is_ai: _ } => self.on_identify(session_id),
            ClientMessage::Interact { target, action } => {
                self.on_interact(session_id, &target, &action)
            }
        }
    }

    // -----------------------------------------------------------------------
    // move
    // -----------------------------------------------------------------------

    fn on_move(&self, session_id: &str, x: f64, jump: bool) -> Result<(), Reject> {
        if !x.is_finite() {
            return Err(Reject::NotFinite);
        }

        let stepped = self
            .players
            .with(session_id, |player| {
                if (x - player.x).abs() > limits::MAX_MOVE_DELTA {
                    return Err(Reject::MovementTooLarge);
                }
                if !physics::horizontal_blocked(&self.world, x, player.y) {
                    player.x = x;
                }
                if jump {
                    physics::apply_jump(player);
                }
                Ok((player.x, player.y, player.zone.clone()))
            })
            .transpose()?;
        let Some((new_x, y, old_zone)) = stepped else {
            return Ok(());
        };

        let zone = self
            .zones
            .assign(session_id, new_x.floor() as i64, y.floor() as i64);
        if zone != old_zone {
            let identity = self.players.with(session_id, |player| {
                player.zone = zone.clone();
                (player.name.clone(), player.color.clone())
            });
            if let Some((name, color)) = identity {
                self.to_zone(
                    &old_zone,
                    &ServerMessage::PlayerLeft {
                        id: session_id.to_string(),
                        name: name.clone(),
                        color: color.clone(),
                    },
                    Some(session_id),
                );
                self.to_zone(
                    &zone,
                    &ServerMessage::PlayerJoined {
                        id: session_id.to_string(),
                        name,
                        color,
                        x: new_x,
                        y,
                    },
                    Some(session_id),
                );
                self.send_to(session_id, &ServerMessage::ZoneChanged { zone: zone.clone() });
            }
        }

        self.to_zone(
            &zone,
            &ServerMessage::PlayerMoved {
                id: session_id.to_string(),
                x: new_x,
                y,
            },
            Some(session_id),
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // chat
    // -----------------------------------------------------------------------

    fn on_chat(&self, session_id: &str, message: &str) -> Result<(), Reject> {
        let Some(message) = limits::sanitize_chat(message) else {
            return Ok(());
        };
        let Some(zone) = self.zones.zone_of_session(session_id) else {
            return Ok(());
        };
        self.to_zone(
            &zone,
            &ServerMessage::ChatMessage {
                id: session_id.to_string(),
                message,
                timestamp: now_millis(),
            },
            None,
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // requestChunk
    // -----------------------------------------------------------------------

    fn on_request_chunk(&self, session_id: &str, chunk_x: i32, chunk_y: i32) -> Result<(), Reject> {
        let Some((px, py)) = self.players.with(session_id, |p| (p.x, p.y)) else {
            return Ok(());
        };
        let player_chunk = ChunkCoord::from_world(px.floor() as i64, py.floor() as i64);
        let requested = ChunkCoord::new(chunk_x, chunk_y);
        if player_chunk.chebyshev_distance(requested) > limits::CHUNK_REQUEST_RADIUS {
            return Err(Reject::ChunkTooFar);
        }
        let merged = self.world.chunk_merged(requested);
        self.send_to(
            session_id,
            &ServerMessage::ChunkData {
                chunk: ChunkPayload::from(&merged),
            },
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // placeBlock / removeBlock
    // -----------------------------------------------------------------------

    fn on_place_block(&self, session_id: &str, x: i64, y: i64, raw_tile: i64) -> Result<(), Reject> {
        let tile = limits::check_tile(raw_tile)?;
        let Some((px, py, is_agent, zone)) = self
            .players
            .with(session_id, |p| (p.x, p.y, p.is_agent, p.zone.clone()))
        else {
            return Ok(());
        };
        if !limits::within_block_range(px, py, x, y, is_agent) {
            return Err(Reject::OutOfRange);
        }

        self.world.place_tile(x, y, tile);
        self.to_zone(
            &zone,
            &ServerMessage::BlockUpdate {
                x,
                y,
                tile,
                placed_by: session_id.to_string(),
            },
            None,
        );
        Ok(())
    }

    fn on_remove_block(&self, session_id: &str, x: i64, y: i64) -> Result<(), Reject> {
        let Some((px, py, is_agent, zone)) = self
            .players
            .with(session_id, |p| (p.x, p.y, p.is_agent, p.zone.clone()))
        else {
            return Ok(());
        };
        if !limits::within_block_range(px, py, x, y, is_agent) {
            return Err(Reject::OutOfRange);
        }

        let current = self.world.tile_at(x, y);
        if current == Tile::Air {
            return Err(Reject::NoBlockToRemove);
        }

        self.world.remove_tile(x, y);
        // Mining credits the material to the miner.
        self.players.with(session_id, |p| p.grant(current, 1));
        self.to_zone(
            &zone,
            &ServerMessage::BlockUpdate {
                x,
                y,
                tile: Tile::Air,
                placed_by: session_id.to_string(),
            },
            None,
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // setProfile / identify / interact
    // -----------------------------------------------------------------------

    fn on_set_profile(
        &self,
        session_id: &str,
        name: Option<String>,
        color: Option<String>,
    ) -> Result<(), Reject> {
        // Invalid inputs are silently clipped; the handshake surface stays
        // quiet.
        let updated = self.players.with(session_id, |player| {
            if let Some(name) = name.as_deref().and_then(limits::sanitize_name) {
                player.name = name;
            }
            if let Some(color) = color.filter(|c| limits::valid_color(c)) {
                player.color = color;
            }
            (player.name.clone(), player.color.clone(), player.zone.clone())
        });
        let Some((name, color, zone)) = updated else {
            return Ok(());
        };
        self.to_zone(
            &zone,
            &ServerMessage::ProfileUpdate {
                id: session_id.to_string(),
                name,
                color,
            },
            None,
        );
        Ok(())
    }

    fn on_identify(&self, session_id: &str) -> Result<(), Reject> {
        let flipped = self.players.with(session_id, |player| {
            player.is_agent = !player.is_agent;
            player.is_agent
        });
        if let Some(is_agent) = flipped {
            debug!("session {} toggled agent flag to {}", session_id, is_agent);
        }
        Ok(())
    }

    fn on_interact(&self, session_id: &str, target: &str, action: &str) -> Result<(), Reject> {
        self.send_to(
            session_id,
            &ServerMessage::InteractResult {
                target: target.to_string(),
                action: action.to_string(),
                result: "not_implemented".to_string(),
            },
        );
        Ok(())
    }
}
