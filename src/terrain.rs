//! Terrain subsystem: deterministic chunk synthesis and the generated-chunk
//! cache.
//!
//! Every cell is a pure function of `(seed, world_x, world_y)`. No global
//! clock, no cross-chunk reads, no randomness outside [`SplitMix64`] streams
//! seeded from the world seed. Regenerating a chunk therefore yields an
//! identical grid, which is what lets any node synthesize the same world
//! without coordination.

use crate::types::{Chunk, ChunkCoord, Tile, CHUNK_SIZE};
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

/// World row of the water surface. Rows greater than this (deeper) flood.
pub const SEA_LEVEL: i64 = -2;

/// Surface bands relative to `S(x)`.
const DIRT_DEPTH: i64 = 4;
const BEACH_BAND: i64 = 2;
const CAVE_MIN_DEPTH: i64 = 8;

/// Per-column chance that a tree grows; per-cell chance a deep stone cell
/// hollows into a cave.
const TREE_CHANCE: f64 = 0.15;
const CAVE_CHANCE: f64 = 0.08;

/// Rows of trunk above the surface; the crown sits one row higher.
const TREE_TRUNK_ROWS: i64 = 4;

// Distinct odd primes keep (a, b) and (b, a) cell seeds apart.
const PRIME_X: u64 = 73_856_093;
const PRIME_Y: u64 = 19_349_663;

const TREE_SALT: u64 = 0x7472_6565;
const CAVE_SALT: u64 = 0x6361_7665;

// ---------------------------------------------------------------------------
// Deterministic PRNG
// ---------------------------------------------------------------------------

/// SplitMix64 stream. Fast, integer-only, and stable across platforms.
pub struct SplitMix64(u64);

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform draw in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

fn column_seed(seed: u64, world_x: i64) -> u64 {
    seed.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(TREE_SALT)
        ^ (world_x as u64).wrapping_mul(PRIME_X)
}

fn cell_seed(seed: u64, world_x: i64, world_y: i64, salt: u64) -> u64 {
    seed.wrapping_add(salt)
        ^ (world_x as u64).wrapping_mul(PRIME_X)
        ^ (world_y as u64).wrapping_mul(PRIME_Y)
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

pub struct TerrainGenerator {
    pub seed: u64,
    /// Octave phases, fixed at construction from the seed.
    phases: [f64; 3],
    cache: RwLock<HashMap<ChunkCoord, Arc<Chunk>>>,
}

impl TerrainGenerator {
    pub fn new(seed: u64) -> Self {
        let mut rng = SplitMix64::new(seed);
        let phases = [
            rng.next_f64() * std::f64::consts::TAU,
            rng.next_f64() * std::f64::consts::TAU,
            rng.next_f64() * std::f64::consts::TAU,
        ];
        Self {
            seed,
            phases,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Integer surface row for a world column, in roughly `[-8, 8]`.
    ///
    /// Three sinusoidal octaves at fixed per-seed phases. Up is negative, so
    /// smaller values are higher ground.
    pub fn surface_height(&self, world_x: i64) -> i64 {
        let x = world_x as f64;
        let h = 4.0 * (x * 0.045 + self.phases[0]).sin()
            + 2.5 * (x * 0.013 + self.phases[1]).sin()
            + 1.5 * (x * 0.11 + self.phases[2]).sin();
        h.round() as i64
    }

    fn column_has_tree(&self, world_x: i64) -> bool {
        SplitMix64::new(column_seed(self.seed, world_x)).next_f64() < TREE_CHANCE
    }

    fn cave_at(&self, world_x: i64, world_y: i64) -> bool {
        SplitMix64::new(cell_seed(self.seed, world_x, world_y, CAVE_SALT)).next_f64() < CAVE_CHANCE
    }

    /// Generated material at one world cell.
    ///
    /// Rules apply in order: surface bands, water flood, beach sand, trees,
    /// caves. Later rules only overwrite as described, so the whole pipeline
    /// stays a pure per-cell function.
    pub fn tile_at(&self, world_x: i64, world_y: i64) -> Tile {
        let surface = self.surface_height(world_x);
        let depth = world_y - surface;

        let mut tile = if depth < 0 {
            Tile::Air
        } else if depth == 0 {
            Tile::Grass
        } else if depth <= DIRT_DEPTH {
            Tile::Dirt
        } else {
            Tile::Stone
        };

        if tile == Tile::Air && world_y > SEA_LEVEL {
            tile = Tile::Water;
        }

        if tile == Tile::Grass && (surface - SEA_LEVEL).abs() <= BEACH_BAND {
            tile = Tile::Sand;
        }

        if tile == Tile::Air && self.column_has_tree(world_x) {
            let rows_above = surface - world_y;
            if (1..=TREE_TRUNK_ROWS).contains(&rows_above) {
                tile = Tile::Wood;
            } else if rows_above == TREE_TRUNK_ROWS + 1 {
                tile = Tile::Leaves;
            }
        }

        if tile == Tile::Stone && depth > CAVE_MIN_DEPTH && self.cave_at(world_x, world_y) {
            tile = Tile::Air;
        }

        tile
    }

    /// Synthesize a full chunk grid. Pure: two calls with the same coordinate
    /// return identical grids.
    pub fn generate(&self, coord: ChunkCoord) -> Chunk {
        let (origin_x, origin_y) = coord.origin();
        let mut chunk = Chunk::filled(coord, Tile::Air);
        for local_y in 0..CHUNK_SIZE {
            for local_x in 0..CHUNK_SIZE {
                let tile = self.tile_at(origin_x + local_x as i64, origin_y + local_y as i64);
                chunk.set(local_x, local_y, tile);
            }
        }
        chunk
    }

    /// Cached read. The cache is never evicted, so a cached grid can never
    /// diverge from regeneration.
    pub fn get_or_generate(&self, coord: ChunkCoord) -> Arc<Chunk> {
        let mut cache = self.cache.write();
        match cache.entry(coord) {
            Entry::Occupied(e) => e.get().clone(),
            Entry::Vacant(v) => {
                let chunk = Arc::new(self.generate(coord));
                v.insert(chunk.clone());
                chunk
            }
        }
    }

    /// Generated tile at a world coordinate, through the chunk cache.
    pub fn tile(&self, world_x: i64, world_y: i64) -> Tile {
        let chunk = self.get_or_generate(ChunkCoord::from_world(world_x, world_y));
        let (lx, ly) = crate::types::local_index(world_x, world_y);
        chunk.get(lx, ly)
    }
}
