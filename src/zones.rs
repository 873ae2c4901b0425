//! Zone index: named rectangular regions in chunk-coordinate space that
//! scope every broadcast, with a default zone absorbing the remainder.

use crate::types::ChunkCoord;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// Zone id for any position not covered by a named region.
pub const DEFAULT_ZONE: &str = "zone_frontier";

/// Inclusive rectangle in chunk coordinates.
#[derive(Debug, Clone)]
pub struct ZoneDef {
    pub id: String,
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl ZoneDef {
    pub fn new(id: impl Into<String>, min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> Self {
        Self {
            id: id.into(),
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    fn contains(&self, chunk: ChunkCoord) -> bool {
        chunk.x >= self.min_x && chunk.x <= self.max_x && chunk.y >= self.min_y && chunk.y <= self.max_y
    }
}

// Both tables live under one lock so a session is never observable in two
// member sets at once.
#[derive(Default)]
struct ZoneTables {
    members: HashMap<String, HashSet<String>>,
    session_zone: HashMap<String, String>,
}

pub struct ZoneIndex {
    defs: Vec<ZoneDef>,
    tables: Mutex<ZoneTables>,
}

impl ZoneIndex {
    pub fn new(defs: Vec<ZoneDef>) -> Self {
        Self {
            defs,
            tables: Mutex::new(ZoneTables::default()),
        }
    }

    /// The built-in layout: a central spawn region ringed by four named
    /// zones, with [`DEFAULT_ZONE`] beyond. Regions do not overlap.
    pub fn with_default_regions() -> Self {
        Self::new(vec![
            ZoneDef::new("zone_central", -2, 2, -2, 2),
            ZoneDef::new("zone_north", -2, 2, -8, -3),
            ZoneDef::new("zone_south", -2, 2, 3, 8),
            ZoneDef::new("zone_west", -8, -3, -8, 8),
            ZoneDef::new("zone_east", 3, 8, -8, 8),
        ])
    }

    /// Zone containing a world tile position. Linear scan of the named
    /// regions; the default zone matches anything else.
    pub fn zone_of(&self, world_x: i64, world_y: i64) -> &str {
        let chunk = ChunkCoord::from_world(world_x, world_y);
        self.defs
            .iter()
            .find(|def| def.contains(chunk))
            .map(|def| def.id.as_str())
            .unwrap_or(DEFAULT_ZONE)
    }

    /// Move a session into the zone containing the position. Idempotent when
    /// the zone is unchanged. Returns the new zone id.
    pub fn assign(&self, session_id: &str, world_x: i64, world_y: i64) -> String {
        let zone = self.zone_of(world_x, world_y).to_string();
        let mut tables = self.tables.lock();
        if let Some(old) = tables.session_zone.get(session_id).cloned() {
            if old == zone {
                return zone;
            }
            if let Some(set) = tables.members.get_mut(&old) {
                set.remove(session_id);
                if set.is_empty() {
                    tables.members.remove(&old);
                }
            }
        }
        tables
            .members
            .entry(zone.clone())
            .or_default()
            .insert(session_id.to_string());
        tables
            .session_zone
            .insert(session_id.to_string(), zone.clone());
        zone
    }

    /// Drop a session entirely. Returns the zone it was in, if any.
    pub fn remove(&self, session_id: &str) -> Option<String> {
        let mut tables = self.tables.lock();
        let zone = tables.session_zone.remove(session_id)?;
        if let Some(set) = tables.members.get_mut(&zone) {
            set.remove(session_id);
            if set.is_empty() {
                tables.members.remove(&zone);
            }
        }
        Some(zone)
    }

    /// Point-in-time snapshot of a zone's member sessions.
    pub fn members(&self, zone: &str) -> Vec<String> {
        self.tables
            .lock()
            .members
            .get(zone)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn zone_of_session(&self, session_id: &str) -> Option<String> {
        self.tables.lock().session_zone.get(session_id).cloned()
    }

    /// Number of zones with at least one member.
    pub fn active_zone_count(&self) -> usize {
        self.tables.lock().members.len()
    }
}
