//! Zone index unit tests

#[cfg(test)]
mod tests {
    use aetharia::zones::{ZoneDef, ZoneIndex, DEFAULT_ZONE};

    fn make_index() -> ZoneIndex {
        ZoneIndex::with_default_regions()
    }

    // -----------------------------------------------------------------------
    // Region lookup
    // -----------------------------------------------------------------------

    #[test]
    fn spawn_area_is_central() {
        let zones = make_index();
        assert_eq!(zones.zone_of(0, 0), "zone_central");
        // Chunk (2, 2) is the inclusive corner of the central region.
        assert_eq!(zones.zone_of(95, 95), "zone_central");
    }

    #[test]
    fn named_regions_surround_the_center() {
        let zones = make_index();
        assert_eq!(zones.zone_of(0, -100), "zone_north");
        assert_eq!(zones.zone_of(0, 100), "zone_south");
        assert_eq!(zones.zone_of(-100, 0), "zone_west");
        assert_eq!(zones.zone_of(100, 0), "zone_east");
    }

    #[test]
    fn default_zone_absorbs_the_remainder() {
        let zones = make_index();
        assert_eq!(zones.zone_of(10_000, 10_000), DEFAULT_ZONE);
        assert_eq!(zones.zone_of(-10_000, 3), DEFAULT_ZONE);
    }

    #[test]
    fn negative_coordinates_resolve_through_chunk_floor() {
        let zones = make_index();
        // Tile -1 lives in chunk -1, still central.
        assert_eq!(zones.zone_of(-1, -1), "zone_central");
        // Tile -65 lives in chunk -3, into the west band.
        assert_eq!(zones.zone_of(-65, 0), "zone_west");
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    #[test]
    fn assign_moves_membership_between_zones() {
        let zones = make_index();
        assert_eq!(zones.assign("alice", 0, 0), "zone_central");
        assert!(zones.members("zone_central").contains(&"alice".to_string()));

        assert_eq!(zones.assign("alice", 100, 0), "zone_east");
        assert!(zones.members("zone_central").is_empty());
        assert!(zones.members("zone_east").contains(&"alice".to_string()));
    }

    #[test]
    fn assign_is_idempotent_within_a_zone() {
        let zones = make_index();
        zones.assign("alice", 0, 0);
        zones.assign("alice", 5, 5);
        let members = zones.members("zone_central");
        assert_eq!(members.len(), 1);
        assert_eq!(zones.zone_of_session("alice").as_deref(), Some("zone_central"));
    }

    #[test]
    fn session_is_in_at_most_one_zone() {
        let zones = make_index();
        zones.assign("alice", 0, 0);
        zones.assign("alice", 0, -100);
        zones.assign("alice", 100, 0);

        let holding: Vec<&str> = ["zone_central", "zone_north", "zone_east", DEFAULT_ZONE]
            .into_iter()
            .filter(|z| zones.members(z).contains(&"alice".to_string()))
            .collect();
        assert_eq!(holding, vec!["zone_east"]);
    }

    #[test]
    fn remove_clears_membership() {
        let zones = make_index();
        zones.assign("alice", 0, 0);
        assert_eq!(zones.remove("alice").as_deref(), Some("zone_central"));
        assert!(zones.members("zone_central").is_empty());
        assert_eq!(zones.remove("alice"), None);
    }

    #[test]
    fn active_zone_count_tracks_occupied_zones() {
        let zones = make_index();
        assert_eq!(zones.active_zone_count(), 0);
        zones.assign("alice", 0, 0);
        zones.assign("bob", 0, 0);
        zones.assign("carol", 0, -100);
        assert_eq!(zones.active_zone_count(), 2);
        zones.remove("carol");
        assert_eq!(zones.active_zone_count(), 1);
    }

    // -----------------------------------------------------------------------
    // Custom layouts
    // -----------------------------------------------------------------------

    #[test]
    fn custom_defs_take_precedence_over_default() {
        let zones = ZoneIndex::new(vec![ZoneDef::new("arena", 0, 0, 0, 0)]);
        assert_eq!(zones.zone_of(31, 31), "arena");
        assert_eq!(zones.zone_of(32, 0), DEFAULT_ZONE);
    }
}
