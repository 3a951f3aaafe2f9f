//! Property tests over the public API.

use glam::Vec3;
use proptest::prelude::*;
use zombie_core::commands::layout;
use zombie_core::config::{GridConfig, PlacementRules};
use zombie_core::economy::ResourceLedger;
use zombie_core::feedback::NullFeedback;
use zombie_core::grid::GridSnapper;
use zombie_core::placement::{validate, Candidate};
use zombie_core::spatial::{LayerMask, Obb, Terrain};
use zombie_test_utils::determinism::strategies::{
    arb_amounts, arb_costs, arb_formation, arb_ground_point, arb_world_point, RESOURCES,
};
use zombie_test_utils::fixtures::{ground, sample_session, sloped_ground};

fn hilly_terrain() -> Terrain {
    let rules = PlacementRules::default();
    let mut terrain = Terrain::new(sloped_ground(20.0), rules.probe_height, rules.probe_distance);
    terrain
        .colliders
        .insert(Obb::axis_aligned(ground(12.0, 12.0), Vec3::splat(3.0)), LayerMask::BUILDING, None);
    terrain
        .colliders
        .insert(Obb::cube(ground(-15.0, 20.0), 0.5), LayerMask::OBSTACLE, None);
    terrain
}

proptest! {
    #[test]
    fn prop_default_grid_snap_is_idempotent(point in arb_world_point()) {
        let snapper = GridSnapper::from_config(&GridConfig::default()).unwrap();
        let once = snapper.snap(point);
        prop_assert_eq!(snapper.snap(once), once);
    }

    #[test]
    fn prop_ledger_never_negative(
        amounts in arb_amounts(),
        orders in prop::collection::vec(arb_costs(), 0..20),
    ) {
        let mut ledger = ResourceLedger::with_amounts(amounts);
        for costs in &orders {
            let before = ledger.snapshot();
            let affordable = ledger.has(costs);
            let result = ledger.try_deduct(costs);
            prop_assert_eq!(result.is_ok(), affordable);
            if !affordable {
                prop_assert_eq!(ledger.snapshot(), before);
            }
            for resource in RESOURCES {
                prop_assert!(ledger.amount(resource) >= 0);
            }
        }
    }

    #[test]
    fn prop_validation_is_pure(
        point in arb_ground_point(),
        yaw in prop_oneof![Just(0.0f32), Just(90.0), Just(180.0), Just(270.0)],
    ) {
        let terrain = hilly_terrain();
        let colliders = terrain.colliders.len();
        let rules = PlacementRules::default();
        let snapper = GridSnapper::from_config(&GridConfig::default()).unwrap();
        let candidate = Candidate::new(snapper.snap(point), yaw, Vec3::new(2.0, 2.0, 2.0));

        let first = validate(&candidate, &rules, Vec3::ZERO, &terrain);
        let second = validate(&candidate, &rules, Vec3::ZERO, &terrain);
        prop_assert_eq!(first, second);
        prop_assert_eq!(terrain.colliders.len(), colliders);
    }

    #[test]
    fn prop_formation_slots_are_distinct(
        formation in arb_formation(),
        count in 2usize..40,
        center in arb_ground_point(),
    ) {
        let slots = layout(formation, count, center, 1.5);
        prop_assert_eq!(slots.len(), count);
        for (i, a) in slots.iter().enumerate() {
            for b in &slots[i + 1..] {
                prop_assert!(a.distance(*b) > 0.1);
            }
        }
    }

    #[test]
    fn prop_session_purchases_never_overdraw(orders in prop::collection::vec(any::<bool>(), 0..12)) {
        let mut session = sample_session();
        let mut paid = 0;
        for ghoul in orders {
            let unit = if ghoul { "ghoul" } else { "doctor" };
            if session.purchase_unit(unit, ground(0.0, -5.0), &mut NullFeedback).is_ok() {
                paid += 1;
            }
            for resource in RESOURCES {
                prop_assert!(session.ledger().amount(resource) >= 0);
            }
        }
        prop_assert_eq!(session.scheduler().len(), paid);
    }
}
