//! Core world types shared across all modules.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// World constants
// ---------------------------------------------------------------------------

/// Width/height of a chunk in tiles. The unit of generation and transmission.
pub const CHUNK_SIZE: usize = 32;

/// Pixel size of a tile, advertised to clients in the welcome frame.
pub const TILE_SIZE: u32 = 32;

// ---------------------------------------------------------------------------
// Tiles
// ---------------------------------------------------------------------------

/// The closed material set. Wire encoding is the bare integer in `[0, 7]`;
/// no other values may enter the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum Tile {
    Air = 0,
    Dirt = 1,
    Stone = 2,
    Grass = 3,
    Water = 4,
    Sand = 5,
    Wood = 6,
    Leaves = 7,
}

impl Tile {
    /// Solid tiles block movement; AIR and WATER do not.
    pub fn is_solid(self) -> bool {
        !matches!(self, Tile::Air | Tile::Water)
    }

    /// Display name used for inventory entries.
    pub fn material_name(self) -> &'static str {
        match self {
            Tile::Air => "Air",
            Tile::Dirt => "Dirt",
            Tile::Stone => "Stone",
            Tile::Grass => "Grass",
            Tile::Water => "Water",
            Tile::Sand => "Sand",
            Tile::Wood => "Wood",
            Tile::Leaves => "Leaves",
        }
    }
}

impl From<Tile> for u8 {
    fn from(t: Tile) -> u8 {
        t as u8
    }
}

impl TryFrom<u8> for Tile {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Ok(match v {
            0 => Tile::Air,
            1 => Tile::Dirt,
            2 => Tile::Stone,
            3 => Tile::Grass,
            4 => Tile::Water,
            5 => Tile::Sand,
            6 => Tile::Wood,
            7 => Tile::Leaves,
            other => return Err(format!("tile id {} out of range", other)),
        })
    }
}

// ---------------------------------------------------------------------------
// Spatial chunking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk containing a world tile coordinate. `div_euclid` keeps negative
    /// coordinates on the correct side of the origin.
    pub fn from_world(world_x: i64, world_y: i64) -> Self {
        Self {
            x: world_x.div_euclid(CHUNK_SIZE as i64) as i32,
            y: world_y.div_euclid(CHUNK_SIZE as i64) as i32,
        }
    }

    /// World tile coordinate of this chunk's top-left corner.
    pub fn origin(&self) -> (i64, i64) {
        (
            self.x as i64 * CHUNK_SIZE as i64,
            self.y as i64 * CHUNK_SIZE as i64,
        )
    }

    pub fn chebyshev_distance(&self, other: ChunkCoord) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{}]", self.x, self.y)
    }
}

/// Local cell index within a chunk for a world tile coordinate.
pub fn local_index(world_x: i64, world_y: i64) -> (usize, usize) {
    (
        world_x.rem_euclid(CHUNK_SIZE as i64) as usize,
        world_y.rem_euclid(CHUNK_SIZE as i64) as usize,
    )
}

// ---------------------------------------------------------------------------
// Chunk grid
// ---------------------------------------------------------------------------

/// A `CHUNK_SIZE × CHUNK_SIZE` tile grid, row-major (`tiles[local_y][local_x]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub coord: ChunkCoord,
    tiles: [[Tile; CHUNK_SIZE]; CHUNK_SIZE],
}

impl Chunk {
    pub fn filled(coord: ChunkCoord, tile: Tile) -> Self {
        Self {
            coord,
            tiles: [[tile; CHUNK_SIZE]; CHUNK_SIZE],
        }
    }

    pub fn get(&self, local_x: usize, local_y: usize) -> Tile {
        self.tiles[local_y][local_x]
    }

    pub fn set(&mut self, local_x: usize, local_y: usize, tile: Tile) {
        self.tiles[local_y][local_x] = tile;
    }

    /// Rows of raw tile ids, the shape sent over the wire.
    pub fn rows(&self) -> Vec<Vec<u8>> {
        self.tiles
            .iter()
            .map(|row| row.iter().map(|t| *t as u8).collect())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Stats & config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStats {
    pub connected_sessions: usize,
    pub active_zones: usize,
    pub world_overrides: usize,
    pub total_ticks: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port the WebSocket listener binds to.
    pub port: u16,
    /// Deterministic terrain seed.
    pub world_seed: u64,
    /// Heartbeat period in milliseconds.
    pub heartbeat_ms: u64,
    /// Verbose logging toggle.
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            world_seed: 12345,
            heartbeat_ms: 30_000,
            debug: false,
        }
    }
}
