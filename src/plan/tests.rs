//! Plan Module Tests
//!
//! Validates plan deserialization, the sentinel key-bound ordering, and the
//! structural checks (dangling references, inverted and overlapping ranges).
//!
//! ## Test Scopes
//! - **Key bounds**: Min/Value/Max ordering and lexicographic compound keys.
//! - **Validation**: every `PlanError` variant is reachable and specific.
//! - **Coverage**: gap detection over partially- and fully-covered key spaces.
//! - **Properties**: randomly generated disjoint plans always validate;
//!   injected overlaps are always caught.

#[cfg(test)]
mod tests {
    use crate::plan::types::*;
    use crate::plan::validate::{PlanError, coverage_gaps, first_overlap};
    use proptest::prelude::*;

    fn shard(name: &str, port: u16) -> ShardSpec {
        ShardSpec {
            name: name.to_string(),
            host: format!("mongo-{}", name),
            port,
            replica_set_id: format!("{}ReplSet", name),
        }
    }

    fn city_range(collection: &str, zone: &str, city: &str) -> RangeAssignment {
        RangeAssignment {
            collection: collection.to_string(),
            zone: zone.to_string(),
            min: RangeKey(vec![KeyBound::Value(city.to_string()), KeyBound::Min]),
            max: RangeKey(vec![KeyBound::Value(city.to_string()), KeyBound::Max]),
        }
    }

    /// The six-shard hybrid topology: users/vehicles/payments pinned whole
    /// to one shard each, bookings split geographically across three zones.
    fn hybrid_plan() -> TopologyPlan {
        TopologyPlan {
            database: "rental".to_string(),
            shards: vec![
                shard("shard1", 27021),
                shard("shard2", 27022),
                shard("shard3a", 27025),
                shard("shard3b", 27026),
                shard("shard3c", 27027),
                shard("shard4", 27024),
            ],
            collections: vec![
                CollectionSpec {
                    name: "users".to_string(),
                    key: PartitionKey::Hashed {
                        field: "_id".to_string(),
                    },
                    indexes: vec![IndexSpec {
                        fields: vec![IndexField {
                            name: "email".to_string(),
                            descending: false,
                        }],
                        unique: true,
                    }],
                },
                CollectionSpec {
                    name: "bookings".to_string(),
                    key: PartitionKey::Compound {
                        fields: vec!["pickup_location".to_string(), "_id".to_string()],
                    },
                    indexes: vec![],
                },
            ],
            zones: vec![
                ZoneSpec {
                    name: "ZONE_USERS".to_string(),
                    member_shards: vec!["shard1".to_string()],
                },
                ZoneSpec {
                    name: "ZONE_NORTH".to_string(),
                    member_shards: vec!["shard3a".to_string()],
                },
                ZoneSpec {
                    name: "ZONE_SOUTH".to_string(),
                    member_shards: vec!["shard3b".to_string()],
                },
                ZoneSpec {
                    name: "ZONE_CENTRAL".to_string(),
                    member_shards: vec!["shard3c".to_string()],
                },
            ],
            ranges: vec![
                RangeAssignment {
                    collection: "users".to_string(),
                    zone: "ZONE_USERS".to_string(),
                    min: RangeKey::min(1),
                    max: RangeKey::max(1),
                },
                city_range("bookings", "ZONE_NORTH", "HANOI"),
                city_range("bookings", "ZONE_SOUTH", "HO_CHI_MINH"),
                city_range("bookings", "ZONE_CENTRAL", "DA_NANG"),
            ],
        }
    }

    // ============================================================
    // TEST 1: KeyBound ordering
    // ============================================================

    #[test]
    fn test_key_bound_ordering() {
        assert!(KeyBound::Min < KeyBound::Value("".to_string()));
        assert!(KeyBound::Value("HANOI".to_string()) < KeyBound::Value("HUE".to_string()));
        assert!(KeyBound::Value("ZZZ".to_string()) < KeyBound::Max);
        assert!(KeyBound::Min < KeyBound::Max);
        assert_eq!(KeyBound::Min, KeyBound::Min);
    }

    #[test]
    fn test_range_key_lexicographic_ordering() {
        let hanoi_min = RangeKey(vec![KeyBound::Value("HANOI".to_string()), KeyBound::Min]);
        let hanoi_max = RangeKey(vec![KeyBound::Value("HANOI".to_string()), KeyBound::Max]);
        let hue_min = RangeKey(vec![KeyBound::Value("HUE".to_string()), KeyBound::Min]);

        // The whole HANOI slice sits strictly below the HUE slice.
        assert!(hanoi_min < hanoi_max);
        assert!(hanoi_max < hue_min);
        assert!(RangeKey::min(2) < hanoi_min);
        assert!(hue_min < RangeKey::max(2));
    }

    // ============================================================
    // TEST 2: Overlap predicate
    // ============================================================

    #[test]
    fn test_adjacent_city_ranges_do_not_overlap() {
        let a = city_range("bookings", "ZONE_NORTH", "HANOI");
        let b = city_range("bookings", "ZONE_CENTRAL", "DA_NANG");
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_identical_interval_overlaps() {
        let a = city_range("bookings", "ZONE_NORTH", "HANOI");
        let b = city_range("bookings", "ZONE_SOUTH", "HANOI");
        assert!(a.overlaps(&b));
    }

    #[test]
    fn test_same_interval_different_collections_do_not_overlap() {
        let a = city_range("bookings", "ZONE_NORTH", "HANOI");
        let b = city_range("invoices", "ZONE_NORTH", "HANOI");
        assert!(!a.overlaps(&b));
    }

    // ============================================================
    // TEST 3: Plan validation
    // ============================================================

    #[test]
    fn test_hybrid_plan_validates() {
        assert_eq!(hybrid_plan().validate(), Ok(()));
    }

    #[test]
    fn test_unknown_shard_in_zone_rejected() {
        let mut plan = hybrid_plan();
        plan.zones[0].member_shards.push("shard9".to_string());

        let err = plan.validate().unwrap_err();
        assert_eq!(
            err,
            PlanError::UnknownShard {
                zone: "ZONE_USERS".to_string(),
                shard: "shard9".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_zone_in_range_rejected() {
        let mut plan = hybrid_plan();
        plan.ranges.push(city_range("bookings", "ZONE_WEST", "HUE"));

        let err = plan.validate().unwrap_err();
        assert!(matches!(err, PlanError::UnknownZone { .. }));
    }

    #[test]
    fn test_unknown_collection_in_range_rejected() {
        let mut plan = hybrid_plan();
        plan.ranges.push(city_range("invoices", "ZONE_NORTH", "HUE"));

        let err = plan.validate().unwrap_err();
        assert_eq!(err, PlanError::UnknownCollection("invoices".to_string()));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut plan = hybrid_plan();
        plan.ranges.push(RangeAssignment {
            collection: "bookings".to_string(),
            zone: "ZONE_NORTH".to_string(),
            min: RangeKey(vec![KeyBound::Value("HUE".to_string()), KeyBound::Max]),
            max: RangeKey(vec![KeyBound::Value("HUE".to_string()), KeyBound::Min]),
        });

        assert!(matches!(plan.validate(), Err(PlanError::EmptyRange(_))));
    }

    #[test]
    fn test_arity_mismatch_rejected() {
        let mut plan = hybrid_plan();
        // Single-bound key against the compound (two-field) bookings key.
        plan.ranges.push(RangeAssignment {
            collection: "bookings".to_string(),
            zone: "ZONE_NORTH".to_string(),
            min: RangeKey(vec![KeyBound::Value("VINH".to_string())]),
            max: RangeKey(vec![KeyBound::Max]),
        });

        assert!(matches!(plan.validate(), Err(PlanError::ArityMismatch { .. })));
    }

    #[test]
    fn test_duplicate_interval_rejected_as_overlap() {
        let mut plan = hybrid_plan();
        // Same HANOI interval, routed to a second zone.
        plan.ranges.push(city_range("bookings", "ZONE_SOUTH", "HANOI"));

        let err = plan.validate().unwrap_err();
        assert!(matches!(err, PlanError::Overlap { .. }));
        assert!(err.to_string().contains("HANOI"));
    }

    // ============================================================
    // TEST 4: Plan JSON round trip (wire format of the plan file)
    // ============================================================

    #[test]
    fn test_plan_deserializes_from_json() {
        let raw = r#"{
            "database": "rental",
            "shards": [
                {"name": "shard1", "host": "mongo-shard1", "port": 27021,
                 "replica_set_id": "shard1ReplSet"}
            ],
            "collections": [
                {"name": "users", "key": {"kind": "hashed", "field": "_id"}},
                {"name": "bookings",
                 "key": {"kind": "compound", "fields": ["pickup_location", "_id"]}}
            ],
            "zones": [{"name": "ZONE_USERS", "member_shards": ["shard1"]}],
            "ranges": [
                {"collection": "users", "zone": "ZONE_USERS",
                 "min": ["min"], "max": ["max"]},
                {"collection": "bookings", "zone": "ZONE_USERS",
                 "min": [{"value": "HANOI"}, "min"],
                 "max": [{"value": "HANOI"}, "max"]}
            ]
        }"#;

        let plan: TopologyPlan = serde_json::from_str(raw).expect("plan should parse");
        assert_eq!(plan.validate(), Ok(()));
        assert_eq!(plan.shards[0].connection_string(), "shard1ReplSet/mongo-shard1:27021");
        assert_eq!(plan.namespace("users"), "rental.users");
        assert_eq!(plan.ranges[1].min.0[0], KeyBound::Value("HANOI".to_string()));
    }

    // ============================================================
    // TEST 5: Coverage gaps
    // ============================================================

    #[test]
    fn test_full_range_has_no_gaps() {
        let plan = hybrid_plan();
        assert!(coverage_gaps(&plan, "users").is_empty());
    }

    #[test]
    fn test_city_ranges_leave_gaps() {
        let plan = hybrid_plan();
        let gaps = coverage_gaps(&plan, "bookings");

        // Below the first city, between cities, and above the last city.
        assert_eq!(gaps.len(), 4);
        assert_eq!(gaps[0].0, RangeKey::min(2));
        assert_eq!(gaps[gaps.len() - 1].1, RangeKey::max(2));
    }

    #[test]
    fn test_three_thirds_cover_key_space() {
        let mut plan = hybrid_plan();
        plan.collections.push(CollectionSpec {
            name: "events".to_string(),
            key: PartitionKey::Range {
                field: "region".to_string(),
            },
            indexes: vec![],
        });
        let cut = |v: &str| RangeKey(vec![KeyBound::Value(v.to_string())]);
        plan.ranges.extend([
            RangeAssignment {
                collection: "events".to_string(),
                zone: "ZONE_NORTH".to_string(),
                min: RangeKey::min(1),
                max: cut("H"),
            },
            RangeAssignment {
                collection: "events".to_string(),
                zone: "ZONE_CENTRAL".to_string(),
                min: cut("H"),
                max: cut("P"),
            },
            RangeAssignment {
                collection: "events".to_string(),
                zone: "ZONE_SOUTH".to_string(),
                min: cut("P"),
                max: RangeKey::max(1),
            },
        ]);

        assert_eq!(plan.validate(), Ok(()));
        assert!(coverage_gaps(&plan, "events").is_empty());
    }

    // ============================================================
    // TEST 6: Property: disjoint city plans validate, overlaps are caught
    // ============================================================

    fn city_names() -> impl Strategy<Value = Vec<String>> {
        proptest::collection::hash_set("[A-Z]{2,8}", 1..12)
            .prop_map(|set| set.into_iter().collect())
    }

    proptest! {
        #[test]
        fn prop_disjoint_city_ranges_never_overlap(cities in city_names()) {
            let ranges: Vec<RangeAssignment> = cities
                .iter()
                .map(|city| city_range("bookings", "ZONE_NORTH", city))
                .collect();

            prop_assert!(first_overlap(&ranges).is_none());
        }

        #[test]
        fn prop_duplicated_city_always_overlaps(cities in city_names(), pick in any::<proptest::sample::Index>()) {
            let mut ranges: Vec<RangeAssignment> = cities
                .iter()
                .map(|city| city_range("bookings", "ZONE_NORTH", city))
                .collect();
            let duplicated = pick.get(&ranges).clone();
            ranges.push(RangeAssignment {
                zone: "ZONE_SOUTH".to_string(),
                ..duplicated
            });

            let (existing, new) = first_overlap(&ranges).expect("duplicate must conflict");
            prop_assert_eq!(&existing.min, &new.min);
            prop_assert_eq!(&existing.max, &new.max);
        }
    }
}
