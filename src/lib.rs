//! Aetharia World Server
//!
//! A server-authoritative multiplayer 2D voxel world core.
//!
//! ## Architecture
//!
//! ```text
//! session  (session.rs)  ← WebSocket accept, reader/writer tasks, heartbeat
//!   └── Server  (server.rs)  ← owns every table, physics + heartbeat clocks
//!         ├── router  (router.rs)      ← rate gate → decode → dispatch
//!         ├── WorldStore  (world.rs)   ← override map over generated terrain
//!         │     └── TerrainGenerator  (terrain.rs)
//!         ├── PlayerRegistry  (players.rs)
//!         ├── ZoneIndex  (zones.rs)
//!         └── Broadcaster  (broadcast.rs)
//! ```
//!
//! The physics clock in `server.rs` ticks every 50 ms and is the sole writer
//! of vertical motion; clients only propose horizontal movement and jump
//! intent through the router. Every outbound event is scoped to the zone of
//! its originator.

pub mod broadcast;
pub mod limits;
pub mod physics;
pub mod players;
pub mod protocol;
pub mod router;
pub mod server;
pub mod session;
pub mod terrain;
pub mod types;
pub mod world;
pub mod zones;

// Convenience re-exports
pub use broadcast::Broadcaster;
pub use players::{Player, PlayerRegistry};
pub use protocol::{ClientMessage, ServerMessage};
pub use server::Server;
pub use terrain::TerrainGenerator;
pub use types::{Chunk, ChunkCoord, ServerConfig, ServerStats, Tile, CHUNK_SIZE};
pub use world::{MutationObserver, WorldStore};
pub use zones::{ZoneDef, ZoneIndex};
