//! World state store: the sparse tile-override map layered over generated
//! terrain, plus spawn selection.
//!
//! Readers prefer an override when present and otherwise fall through to the
//! generator. Removing a block stores an AIR override rather than deleting
//! the key, so reads stay O(1) and stable even where the generated tile is
//! also AIR.

use crate::terrain::TerrainGenerator;
use crate::types::{Chunk, ChunkCoord, Tile, CHUNK_SIZE};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Vertical span scanned when probing for a spawn surface.
const SPAWN_SCAN_MIN: i64 = -64;
const SPAWN_SCAN_MAX: i64 = 64;

/// Write-through observer of world mutations.
///
/// A persistence layer hooks in here to journal every override as it lands;
/// recovery replays the journal through [`WorldStore::restore`] before the
/// server accepts sessions.
pub trait MutationObserver: Send + Sync {
    fn tile_written(&self, x: i64, y: i64, tile: Tile);
}

pub struct WorldStore {
    terrain: TerrainGenerator,
    overrides: RwLock<HashMap<(i64, i64), Tile>>,
    observer: RwLock<Option<Arc<dyn MutationObserver>>>,
}

impl WorldStore {
    pub fn new(seed: u64) -> Self {
        Self {
            terrain: TerrainGenerator::new(seed),
            overrides: RwLock::new(HashMap::new()),
            observer: RwLock::new(None),
        }
    }

    /// Attach the persistence observer. At most one; later calls replace it.
    pub fn set_observer(&self, observer: Arc<dyn MutationObserver>) {
        *self.observer.write() = Some(observer);
    }

    pub fn terrain(&self) -> &TerrainGenerator {
        &self.terrain
    }

    /// Authoritative tile at a world coordinate.
    pub fn tile_at(&self, x: i64, y: i64) -> Tile {
        if let Some(tile) = self.overrides.read().get(&(x, y)) {
            return *tile;
        }
        self.terrain.tile(x, y)
    }

    pub fn is_solid(&self, x: i64, y: i64) -> bool {
        self.tile_at(x, y).is_solid()
    }

    /// Write an override. The [`Tile`] type already restricts values to the
    /// closed material set, so no range check can fail here.
    pub fn place_tile(&self, x: i64, y: i64, tile: Tile) {
        self.overrides.write().insert((x, y), tile);
        if let Some(observer) = self.observer.read().as_ref() {
            observer.tile_written(x, y, tile);
        }
    }

    /// Store an AIR override at the coordinate.
    pub fn remove_tile(&self, x: i64, y: i64) {
        self.place_tile(x, y, Tile::Air);
    }

    /// Point-in-time copy of the override map, for snapshots.
    pub fn overrides_snapshot(&self) -> Vec<(i64, i64, Tile)> {
        self.overrides
            .read()
            .iter()
            .map(|(&(x, y), &tile)| (x, y, tile))
            .collect()
    }

    /// Bulk-load overrides during recovery. Does not notify the observer;
    /// the entries came from it.
    pub fn restore(&self, entries: impl IntoIterator<Item = (i64, i64, Tile)>) {
        let mut overrides = self.overrides.write();
        for (x, y, tile) in entries {
            overrides.insert((x, y), tile);
        }
    }

    /// Fresh chunk grid with every applicable override layered on top.
    pub fn chunk_merged(&self, coord: ChunkCoord) -> Chunk {
        let mut chunk = (*self.terrain.get_or_generate(coord)).clone();
        let (origin_x, origin_y) = coord.origin();
        let overrides = self.overrides.read();
        for local_y in 0..CHUNK_SIZE {
            for local_x in 0..CHUNK_SIZE {
                let key = (origin_x + local_x as i64, origin_y + local_y as i64);
                if let Some(tile) = overrides.get(&key) {
                    chunk.set(local_x, local_y, *tile);
                }
            }
        }
        chunk
    }

    pub fn override_count(&self) -> usize {
        self.overrides.read().len()
    }

    /// Spawn probe: first row in the scan span where the cell is AIR and the
    /// cell directly beneath is solid. Falls back to row 0; the physics
    /// unstick step corrects a pathological fallback on the first tick.
    pub fn surface_spawn(&self, x: i64) -> i64 {
        for y in SPAWN_SCAN_MIN..SPAWN_SCAN_MAX {
            if self.tile_at(x, y) == Tile::Air && self.is_solid(x, y + 1) {
                return y;
            }
        }
        0
    }
}
