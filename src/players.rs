//! Player registry: lifecycle and avatar state for every live session.
//!
//! The registry is the canonical state. The physics loop mutates vertical
//! motion in place under the registry lock; broadcasters clone snapshots
//! under the same lock, so torn reads are impossible.

use crate::types::Tile;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default avatar colors, picked by session-id hash on join.
const PALETTE: [&str; 8] = [
    "#E74C3C", "#3498DB", "#2ECC71", "#F1C40F", "#9B59B6", "#E67E22", "#1ABC9C", "#EC87C0",
];

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Tile,
    pub quantity: u32,
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub color: String,
    /// Position in tile units. Up is negative y.
    pub x: f64,
    pub y: f64,
    /// Tiles per second; positive while descending.
    pub vertical_velocity: f64,
    pub on_ground: bool,
    pub zone: String,
    pub inventory: Vec<InventoryItem>,
    pub is_agent: bool,
}

impl Player {
    /// Fresh avatar at a spawn point, resting on the probed surface.
    pub fn spawn(id: &str, x: f64, y: f64, zone: String) -> Self {
        let short = &id[..4.min(id.len())];
        Self {
            id: id.to_string(),
            name: format!("Player-{}", short),
            color: default_color(id).to_string(),
            x,
            y,
            vertical_velocity: 0.0,
            on_ground: true,
            zone,
            inventory: default_inventory(),
            is_agent: false,
        }
    }

    /// Credit mined material. Quantities stay strictly positive; a
    /// zero-quantity grant is a no-op.
    pub fn grant(&mut self, tile: Tile, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(item) = self.inventory.iter_mut().find(|i| i.kind == tile) {
            item.quantity += quantity;
            return;
        }
        self.inventory.push(InventoryItem {
            name: tile.material_name().to_string(),
            kind: tile,
            quantity,
        });
    }
}

fn default_color(id: &str) -> &'static str {
    let hash: u32 = id.bytes().fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(b as u32));
    PALETTE[(hash as usize) % PALETTE.len()]
}

fn default_inventory() -> Vec<InventoryItem> {
    [Tile::Dirt, Tile::Stone, Tile::Wood]
        .into_iter()
        .map(|tile| InventoryItem {
            name: tile.material_name().to_string(),
            kind: tile,
            quantity: 64,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

pub struct PlayerRegistry {
    inner: RwLock<HashMap<String, Player>>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, player: Player) {
        self.inner.write().insert(player.id.clone(), player);
    }

    pub fn remove(&self, session_id: &str) -> Option<Player> {
        self.inner.write().remove(session_id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Atomic field snapshot (welcome payloads, broadcasts).
    pub fn snapshot(&self, session_id: &str) -> Option<Player> {
        self.inner.read().get(session_id).cloned()
    }

    /// Snapshot of every player, for the `existingPlayers` frame.
    pub fn roster(&self) -> Vec<Player> {
        self.inner.read().values().cloned().collect()
    }

    /// Run a closure against one player under the registry lock.
    pub fn with<R>(&self, session_id: &str, f: impl FnOnce(&mut Player) -> R) -> Option<R> {
        self.inner.write().get_mut(session_id).map(f)
    }

    /// Run a closure against every player under a single lock hold. The
    /// physics tick uses this so each per-player step is atomic.
    pub fn for_each_mut(&self, mut f: impl FnMut(&mut Player)) {
        for player in self.inner.write().values_mut() {
            f(player);
        }
    }
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
