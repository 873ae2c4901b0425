//! Terrain generator unit tests

#[cfg(test)]
mod tests {
    use aetharia::terrain::{TerrainGenerator, SEA_LEVEL};
    use aetharia::types::{ChunkCoord, Tile, CHUNK_SIZE};
    use std::sync::Arc;

    fn make_terrain(seed: u64) -> TerrainGenerator {
        TerrainGenerator::new(seed)
    }

    // -----------------------------------------------------------------------
    // Determinism
    // -----------------------------------------------------------------------

    #[test]
    fn regeneration_is_byte_identical() {
        let t = make_terrain(12345);
        for coord in [
            ChunkCoord::new(0, 0),
            ChunkCoord::new(3, -1),
            ChunkCoord::new(-7, 4),
        ] {
            let a = t.generate(coord);
            let b = t.generate(coord);
            assert_eq!(a, b, "chunk {} must regenerate identically", coord);
        }
    }

    #[test]
    fn independent_generators_agree() {
        let t1 = make_terrain(12345);
        let t2 = make_terrain(12345);
        let coord = ChunkCoord::new(3, -1);
        assert_eq!(t1.generate(coord), t2.generate(coord));
    }

    #[test]
    fn different_seeds_produce_different_terrain() {
        let t1 = make_terrain(1);
        let t2 = make_terrain(999_999);
        let coords = [
            ChunkCoord::new(0, 0),
            ChunkCoord::new(5, 5),
            ChunkCoord::new(-2, 1),
        ];
        let all_same = coords.iter().all(|c| t1.generate(*c) == t2.generate(*c));
        assert!(!all_same, "at least one chunk should differ between seeds");
    }

    // -----------------------------------------------------------------------
    // Surface bands
    // -----------------------------------------------------------------------

    #[test]
    fn surface_height_stays_in_band() {
        let t = make_terrain(12345);
        for x in -500..500 {
            let s = t.surface_height(x);
            assert!((-9..=9).contains(&s), "surface {} out of band at x={}", s, x);
        }
    }

    #[test]
    fn column_layers_follow_depth_rules() {
        let t = make_terrain(12345);
        for x in [-40_i64, 0, 17, 250] {
            let s = t.surface_height(x);
            let top = t.tile_at(x, s);
            assert!(
                top == Tile::Grass || top == Tile::Sand,
                "surface cell should be grass or sand, got {:?} at x={}",
                top,
                x
            );
            // Sand only appears near the shoreline.
            if (s - SEA_LEVEL).abs() > 2 {
                assert_eq!(top, Tile::Grass);
            }
            assert_eq!(t.tile_at(x, s + 1), Tile::Dirt);
            assert_eq!(t.tile_at(x, s + 4), Tile::Dirt);
            // Depth 5..8 is always stone; caves only open deeper.
            assert_eq!(t.tile_at(x, s + 5), Tile::Stone);
            assert_eq!(t.tile_at(x, s + 8), Tile::Stone);
        }
    }

    #[test]
    fn water_floods_only_below_sea_level() {
        let t = make_terrain(12345);
        for x in -100..100 {
            for y in -30..0 {
                if t.tile_at(x, y) == Tile::Water {
                    assert!(y > SEA_LEVEL, "water above sea level at ({}, {})", x, y);
                }
            }
        }
    }

    #[test]
    fn submerged_columns_hold_water() {
        let t = make_terrain(12345);
        // Find a column whose surface sits below sea level; the cell just
        // above the water line must have flooded.
        let x = (-500..500)
            .find(|&x| t.surface_height(x) >= 0)
            .expect("seed should produce at least one submerged column");
        assert_eq!(t.tile_at(x, SEA_LEVEL + 1), Tile::Water);
    }

    #[test]
    fn trees_stand_on_air_columns() {
        let t = make_terrain(12345);
        let mut seen_tree = false;
        for x in -500..500 {
            let s = t.surface_height(x);
            if t.tile_at(x, s - 1) == Tile::Wood {
                seen_tree = true;
                // Trunk is contiguous wood with a leaf crown.
                for row in 1..=4 {
                    let cell = t.tile_at(x, s - row);
                    assert!(
                        cell == Tile::Wood || cell == Tile::Water,
                        "trunk interrupted at x={} row {}",
                        x,
                        row
                    );
                }
            }
        }
        assert!(seen_tree, "a 1000-column sweep should contain trees");
    }

    // -----------------------------------------------------------------------
    // Coordinate handling
    // -----------------------------------------------------------------------

    #[test]
    fn negative_world_coordinates_map_into_local_cells() {
        let t = make_terrain(12345);
        for (x, y) in [(-1_i64, -1_i64), (-33, -33), (-64, 10), (5, -100)] {
            let coord = ChunkCoord::from_world(x, y);
            let chunk = t.generate(coord);
            let (lx, ly) = aetharia::types::local_index(x, y);
            assert!(lx < CHUNK_SIZE && ly < CHUNK_SIZE);
            assert_eq!(chunk.get(lx, ly), t.tile_at(x, y));
        }
    }

    // -----------------------------------------------------------------------
    // Chunk cache
    // -----------------------------------------------------------------------

    #[test]
    fn chunk_cache_returns_same_arc() {
        let t = make_terrain(12345);
        let c1 = t.get_or_generate(ChunkCoord::new(0, 0));
        let c2 = t.get_or_generate(ChunkCoord::new(0, 0));
        assert!(Arc::ptr_eq(&c1, &c2));
    }

    #[test]
    fn cached_reads_match_regeneration() {
        let t = make_terrain(777);
        let coord = ChunkCoord::new(2, 2);
        let cached = t.get_or_generate(coord);
        assert_eq!(*cached, t.generate(coord));
    }
}
