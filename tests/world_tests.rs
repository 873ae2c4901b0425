//! World store unit tests

#[cfg(test)]
mod tests {
    use aetharia::types::{ChunkCoord, Tile, CHUNK_SIZE};
    use aetharia::world::WorldStore;

    fn make_store(seed: u64) -> WorldStore {
        WorldStore::new(seed)
    }

    /// A column whose surface sits safely above the water line, so the
    /// spawn probe lands on terrain rather than falling back.
    fn dry_column(store: &WorldStore) -> i64 {
        (-500..500)
            .find(|&x| store.terrain().surface_height(x) <= -3)
            .expect("seed should produce dry land")
    }

    // -----------------------------------------------------------------------
    // Override layering
    // -----------------------------------------------------------------------

    #[test]
    fn unmodified_reads_match_generation() {
        let store = make_store(12345);
        for (x, y) in [(0_i64, 0_i64), (-1, -1), (100, -40), (-70, 33)] {
            assert_eq!(store.tile_at(x, y), store.terrain().tile(x, y));
        }
    }

    #[test]
    fn placed_tile_shadows_generated_terrain() {
        let store = make_store(12345);
        store.place_tile(10, 10, Tile::Wood);
        assert_eq!(store.tile_at(10, 10), Tile::Wood);
        // Neighbors stay generated.
        assert_eq!(store.tile_at(11, 10), store.terrain().tile(11, 10));
    }

    #[test]
    fn remove_stores_air_override() {
        let store = make_store(12345);
        let x = dry_column(&store);
        let y = store.surface_spawn(x) + 1; // guaranteed solid
        assert!(store.tile_at(x, y).is_solid());

        store.remove_tile(x, y);
        assert_eq!(store.tile_at(x, y), Tile::Air);
        assert_eq!(store.override_count(), 1);

        // Removing where the generated tile is already air still pins an
        // override; reads stay stable.
        store.remove_tile(x, y - 8);
        assert_eq!(store.tile_at(x, y - 8), Tile::Air);
        assert_eq!(store.override_count(), 2);
    }

    #[test]
    fn place_then_remove_round_trip_is_air() {
        let store = make_store(12345);
        store.place_tile(2, 0, Tile::Stone);
        assert_eq!(store.tile_at(2, 0), Tile::Stone);
        store.remove_tile(2, 0);
        assert_eq!(store.tile_at(2, 0), Tile::Air);
    }

    // -----------------------------------------------------------------------
    // Merged chunks
    // -----------------------------------------------------------------------

    #[test]
    fn merged_chunk_layers_every_override() {
        let store = make_store(12345);
        let coord = ChunkCoord::new(0, 0);
        store.place_tile(2, 0, Tile::Stone);
        store.place_tile(31, 31, Tile::Leaves);

        let merged = store.chunk_merged(coord);
        assert_eq!(merged.get(2, 0), Tile::Stone);
        assert_eq!(merged.get(31, 31), Tile::Leaves);

        // Cells without overrides equal plain generation.
        let generated = store.terrain().generate(coord);
        let mut diffs = 0;
        for ly in 0..CHUNK_SIZE {
            for lx in 0..CHUNK_SIZE {
                if merged.get(lx, ly) != generated.get(lx, ly) {
                    diffs += 1;
                }
            }
        }
        assert!(diffs <= 2);
    }

    #[test]
    fn merged_chunk_handles_negative_coordinates() {
        let store = make_store(12345);
        store.place_tile(-1, -1, Tile::Sand);
        let merged = store.chunk_merged(ChunkCoord::new(-1, -1));
        assert_eq!(merged.get(CHUNK_SIZE - 1, CHUNK_SIZE - 1), Tile::Sand);
    }

    #[test]
    fn replaying_mutations_reproduces_live_state() {
        let mutations = [
            (5_i64, 2_i64, Tile::Stone),
            (6, 2, Tile::Wood),
            (5, 2, Tile::Dirt), // overwrite
            (7, 3, Tile::Air),
        ];

        let live = make_store(42);
        for (x, y, t) in mutations {
            live.place_tile(x, y, t);
        }

        let replayed = make_store(42);
        for (x, y, t) in mutations {
            replayed.place_tile(x, y, t);
        }

        let coord = ChunkCoord::new(0, 0);
        assert_eq!(live.chunk_merged(coord), replayed.chunk_merged(coord));
    }

    // -----------------------------------------------------------------------
    // Persistence hook
    // -----------------------------------------------------------------------

    #[derive(Default)]
    struct Journal {
        entries: parking_lot::Mutex<Vec<(i64, i64, Tile)>>,
    }

    impl aetharia::world::MutationObserver for Journal {
        fn tile_written(&self, x: i64, y: i64, tile: Tile) {
            self.entries.lock().push((x, y, tile));
        }
    }

    #[test]
    fn observer_sees_every_write_through() {
        let store = make_store(12345);
        let journal = std::sync::Arc::new(Journal::default());
        store.set_observer(journal.clone());

        store.place_tile(1, 2, Tile::Stone);
        store.remove_tile(1, 2);

        let entries = journal.entries.lock();
        assert_eq!(*entries, vec![(1, 2, Tile::Stone), (1, 2, Tile::Air)]);
    }

    #[test]
    fn restore_repopulates_without_notifying() {
        let source = make_store(12345);
        source.place_tile(4, 4, Tile::Wood);
        source.place_tile(5, 4, Tile::Leaves);

        let recovered = make_store(12345);
        let journal = std::sync::Arc::new(Journal::default());
        recovered.set_observer(journal.clone());
        recovered.restore(source.overrides_snapshot());

        assert_eq!(recovered.tile_at(4, 4), Tile::Wood);
        assert_eq!(recovered.tile_at(5, 4), Tile::Leaves);
        assert_eq!(
            recovered.chunk_merged(ChunkCoord::new(0, 0)),
            source.chunk_merged(ChunkCoord::new(0, 0))
        );
        assert!(journal.entries.lock().is_empty(), "replay must not re-journal");
    }

    // -----------------------------------------------------------------------
    // Spawn probe
    // -----------------------------------------------------------------------

    #[test]
    fn spawn_probe_finds_air_above_solid() {
        let store = make_store(12345);
        let x = dry_column(&store);
        let y = store.surface_spawn(x);
        assert_eq!(store.tile_at(x, y), Tile::Air);
        assert!(store.is_solid(x, y + 1));
    }

    #[test]
    fn spawn_probe_respects_overrides() {
        let store = make_store(12345);
        let x = dry_column(&store);
        // A platform high above any natural terrain is found first.
        store.place_tile(x, -20, Tile::Stone);
        assert_eq!(store.surface_spawn(x), -21);
    }
}
