//! The authoritative server value: owns the world store, player registry,
//! zone index, and session table, and drives the physics and heartbeat
//! clocks.
//!
//! Handlers receive the server explicitly; nothing here is a global. Locks
//! are held only for the duration of a per-player step or a table snapshot,
//! never across an await.

use crate::broadcast::Broadcaster;
use crate::physics;
use crate::players::{Player, PlayerRegistry};
use crate::protocol::{chunk_key, ChunkPayload, PlayerInfo, ServerMessage, WorldConfigInfo};
use crate::types::{ChunkCoord, ServerConfig, ServerStats};
use crate::world::WorldStore;
use crate::zones::ZoneIndex;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

/// Column probed for a safe spawn surface.
const SPAWN_X: i64 = 0;

/// Chebyshev radius of the welcome chunk grid (1 → the 3×3 around spawn).
const WELCOME_CHUNK_RADIUS: i32 = 1;

pub struct Server {
    pub config: ServerConfig,
    pub world: WorldStore,
    pub players: PlayerRegistry,
    pub zones: ZoneIndex,
    pub broadcaster: Broadcaster,
    tick_count: AtomicU64,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        let world = WorldStore::new(config.world_seed);
        Self {
            config,
            world,
            players: PlayerRegistry::new(),
            zones: ZoneIndex::with_default_regions(),
            broadcaster: Broadcaster::new(),
            tick_count: AtomicU64::new(0),
        }
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    /// Accept a session: allocate an id, spawn its player, send the welcome
    /// payload, and announce the join to the zone. Returns the session id.
    pub fn join(&self, sender: UnboundedSender<Message>) -> String {
        let session_id = Uuid::new_v4().to_string();
        self.broadcaster.register(&session_id, sender);

        let spawn_y = self.world.surface_spawn(SPAWN_X);
        let zone = self.zones.assign(&session_id, SPAWN_X, spawn_y);
        let player = Player::spawn(&session_id, SPAWN_X as f64, spawn_y as f64, zone.clone());

        let spawn_chunk = ChunkCoord::from_world(SPAWN_X, spawn_y);
        let mut chunks = BTreeMap::new();
        for dy in -WELCOME_CHUNK_RADIUS..=WELCOME_CHUNK_RADIUS {
            for dx in -WELCOME_CHUNK_RADIUS..=WELCOME_CHUNK_RADIUS {
                let coord = ChunkCoord::new(spawn_chunk.x + dx, spawn_chunk.y + dy);
                let merged = self.world.chunk_merged(coord);
                chunks.insert(chunk_key(coord.x, coord.y), ChunkPayload::from(&merged));
            }
        }

        let welcome = ServerMessage::Welcome {
            id: player.id.clone(),
            name: player.name.clone(),
            color: player.color.clone(),
            x: player.x,
            y: player.y,
            zone: zone.clone(),
            chunks,
            world_config: WorldConfigInfo::default(),
        };
        let joined = ServerMessage::PlayerJoined {
            id: player.id.clone(),
            name: player.name.clone(),
            color: player.color.clone(),
            x: player.x,
            y: player.y,
        };

        // Roster is sampled before the insert so the newcomer is excluded.
        let roster: Vec<PlayerInfo> = self.players.roster().iter().map(PlayerInfo::from).collect();
        self.players.insert(player);

        self.broadcaster.send_to(&session_id, &welcome);
        self.to_zone(&zone, &joined, Some(&session_id));
        self.broadcaster
            .send_to(&session_id, &ServerMessage::ExistingPlayers { players: roster });

        info!("session {} joined zone {} at y={}", session_id, zone, spawn_y);
        session_id
    }

    /// Tear a session down. Idempotent: the heartbeat and the reader task
    /// may both arrive here for the same session.
    pub fn leave(&self, session_id: &str) {
        let Some(handle) = self.broadcaster.unregister(session_id) else {
            return;
        };
        handle.send_raw(Message::Close(None));

        let zone = self.zones.remove(session_id);
        if let Some(player) = self.players.remove(session_id) {
            if let Some(zone) = zone {
                self.to_zone(
                    &zone,
                    &ServerMessage::PlayerLeft {
                        id: player.id,
                        name: player.name,
                        color: player.color,
                    },
                    None,
                );
            }
        }
        info!("session {} disconnected", session_id);
    }

    // -----------------------------------------------------------------------
    // Outbound helpers
    // -----------------------------------------------------------------------

    /// Zone-scoped fan-out over a point-in-time member snapshot.
    pub fn to_zone(&self, zone: &str, msg: &ServerMessage, exclude: Option<&str>) {
        let members = self.zones.members(zone);
        self.broadcaster.to_many(&members, msg, exclude);
    }

    pub fn send_to(&self, session_id: &str, msg: &ServerMessage) {
        self.broadcaster.send_to(session_id, msg);
    }

    pub fn send_error(&self, session_id: &str, message: String) {
        self.broadcaster
            .send_to(session_id, &ServerMessage::Error { message });
    }

    // -----------------------------------------------------------------------
    // Physics clock
    // -----------------------------------------------------------------------

    /// Advance every player by one tick, then emit corrections. The registry
    /// lock is held for the stepping only; sends happen after release.
    pub fn tick_physics(&self) {
        self.tick_count.fetch_add(1, Ordering::Relaxed);

        let mut corrections: Vec<(String, f64, f64, bool, String)> = Vec::new();
        self.players.for_each_mut(|player| {
            if physics::step(&self.world, player) {
                corrections.push((
                    player.id.clone(),
                    player.x,
                    player.y,
                    player.on_ground,
                    player.zone.clone(),
                ));
            }
        });

        for (session_id, x, y, on_ground, zone) in corrections {
            self.send_to(
                &session_id,
                &ServerMessage::PositionCorrection { x, y, on_ground },
            );
            self.to_zone(
                &zone,
                &ServerMessage::PlayerMoved {
                    id: session_id.clone(),
                    x,
                    y,
                },
                Some(&session_id),
            );
        }
    }

    pub async fn run_physics(self: Arc<Self>) {
        let mut timer = tokio::time::interval(physics::TICK);
        loop {
            timer.tick().await;
            self.tick_physics();
        }
    }

    // -----------------------------------------------------------------------
    // Heartbeat
    // -----------------------------------------------------------------------

    /// Ping every session; sessions whose previous ping was never
    /// acknowledged are returned for termination.
    pub fn heartbeat_sweep(&self) -> Vec<String> {
        let mut stale = Vec::new();
        for session_id in self.broadcaster.session_ids() {
            let Some(handle) = self.broadcaster.handle(&session_id) else {
                continue;
            };
            if !handle.arm_ping() {
                stale.push(session_id);
                continue;
            }
            if !handle.send_raw(Message::Ping(Vec::new())) {
                stale.push(session_id);
            }
        }
        stale
    }

    pub async fn run_heartbeat(self: Arc<Self>) {
        let mut timer = tokio::time::interval(Duration::from_millis(self.config.heartbeat_ms));
        // The first interval tick fires immediately; skip it so fresh
        // sessions get a full period before their first ping.
        timer.tick().await;
        loop {
            timer.tick().await;
            for session_id in self.heartbeat_sweep() {
                warn!("session {} failed heartbeat, closing", session_id);
                self.leave(&session_id);
            }
        }
    }

    pub fn note_pong(&self, session_id: &str) {
        if let Some(handle) = self.broadcaster.handle(session_id) {
            handle.note_pong();
        } else {
            debug!("pong from unknown session {}", session_id);
        }
    }

    // -----------------------------------------------------------------------
    // Stats
    // -----------------------------------------------------------------------

    pub fn stats(&self) -> ServerStats {
        ServerStats {
            connected_sessions: self.broadcaster.session_count(),
            active_zones: self.zones.active_zone_count(),
            world_overrides: self.world.override_count(),
            total_ticks: self.tick_count.load(Ordering::Relaxed),
        }
    }
}
