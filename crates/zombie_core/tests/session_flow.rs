//! End-to-end session tests driven through input events.
//!
//! The overhead picker maps screen `(x, y)` to world `(x, z)`, so every
//! click below lands on the world coordinate it names.

use glam::Vec2;
use zombie_core::components::{Faction, MotionState, PlacementState};
use zombie_core::error::GameError;
use zombie_core::feedback::SoundEffect;
use zombie_core::input::{InputEvent, InputQueue};
use zombie_core::placement::PlacementRejection;
use zombie_core::save::load_from_path;
use zombie_core::session::Session;
use zombie_core::spatial::{LayerMask, Obb};
use zombie_test_utils::feedback::{Feedback, RecordingFeedback};
use zombie_test_utils::fixtures::{flat_ground, ground, sample_session};
use zombie_test_utils::picker::OverheadPicker;

fn click(input: &mut InputQueue, x: f32, z: f32) {
    let screen = OverheadPicker::screen_of(x, z);
    input.push(InputEvent::PrimaryDown { screen, modifier: false });
    input.push(InputEvent::PrimaryUp { screen });
}

fn hover(input: &mut InputQueue, x: f32, z: f32) {
    input.push(InputEvent::PointerMoved {
        screen: OverheadPicker::screen_of(x, z),
    });
}

fn step(session: &mut Session, input: &mut InputQueue, dt: f32, feedback: &mut RecordingFeedback) {
    let picker = OverheadPicker::with_world(flat_ground(), session.world());
    session.tick(dt, input, &picker, feedback);
}

// ============================================================================
// Placement
// ============================================================================

#[test]
fn test_unaffordable_building_is_refused_up_front() {
    let mut session = sample_session();
    let mut feedback = RecordingFeedback::new();

    let result = session.begin_placement("biohazard_factory", &mut feedback);

    assert!(matches!(
        result,
        Err(GameError::InsufficientResources { ref resource, required: 200, available: 150 }) if resource == "Bone"
    ));
    assert!(!session.is_placing());
    assert_eq!(feedback.sounds(), vec![SoundEffect::ErrorClick]);
    assert_eq!(session.ledger().amount("Bone"), 150);
    assert_eq!(session.ledger().amount("Biohazard"), 150);
}

#[test]
fn test_placement_pays_builds_and_reserves_the_site() {
    let mut session = sample_session();
    let mut input = InputQueue::new();
    let mut feedback = RecordingFeedback::new();

    session.begin_placement("bone_factory", &mut feedback).unwrap();
    hover(&mut input, 30.0, 30.0);
    step(&mut session, &mut input, 0.0, &mut feedback);
    assert_eq!(feedback.last_preview(), Some(PlacementState::Valid));

    click(&mut input, 30.0, 30.0);
    step(&mut session, &mut input, 0.0, &mut feedback);
    assert!(!session.is_placing());
    assert_eq!(feedback.count(SoundEffect::PlaceBuilding), 1);
    assert_eq!(session.ledger().amount("Biohazard"), 100);
    assert_eq!(session.scheduler().len(), 1);
    assert!(session.world().is_empty());

    // The pending site blocks a second building on the same cell.
    session.begin_placement("bone_factory", &mut feedback).unwrap();
    hover(&mut input, 30.0, 30.0);
    click(&mut input, 30.0, 30.0);
    step(&mut session, &mut input, 0.0, &mut feedback);
    let preview = session.preview().unwrap();
    assert_eq!(preview.rejection(), Some(PlacementRejection::OverlapsBuilding));
    assert_eq!(session.ledger().amount("Biohazard"), 100);
    session.cancel_placement(&mut feedback);

    feedback.clear();
    step(&mut session, &mut input, 12.0, &mut feedback);
    assert_eq!(session.world().len(), 1);
    assert!(session.scheduler().is_empty());
    assert_eq!(feedback.count(SoundEffect::BuildingComplete), 1);

    let building = session.world().iter().next().map(|(_, e)| e).unwrap();
    assert_eq!(building.blueprint, "bone_factory");
    assert_eq!(building.faction, Faction::Player);
    assert!(session.terrain().colliders.collider_of(building.id).is_some());
}

#[test]
fn test_failed_confirm_keeps_preview_and_charges_nothing() {
    let mut session = sample_session();
    let mut input = InputQueue::new();
    let mut feedback = RecordingFeedback::new();

    session.begin_placement("zombie_den", &mut feedback).unwrap();
    click(&mut input, 3.0, 0.0);
    step(&mut session, &mut input, 0.0, &mut feedback);

    assert!(session.is_placing());
    assert_eq!(
        session.preview().unwrap().rejection(),
        Some(PlacementRejection::TooCloseToPlayer)
    );
    assert_eq!(session.ledger().amount("Bone"), 150);
    assert!(session.scheduler().is_empty());
    assert_eq!(feedback.count(SoundEffect::ErrorClick), 1);

    // Moving away and clicking again succeeds.
    click(&mut input, 21.0, 0.0);
    step(&mut session, &mut input, 0.0, &mut feedback);
    assert!(!session.is_placing());
    assert_eq!(session.ledger().amount("Bone"), 50);
}

#[test]
fn test_rotation_is_carried_into_the_building() {
    let mut session = sample_session();
    let mut input = InputQueue::new();
    let mut feedback = RecordingFeedback::new();

    session.begin_placement("zombie_den", &mut feedback).unwrap();
    hover(&mut input, -30.0, 15.0);
    input.push(InputEvent::RotatePressed);
    click(&mut input, -30.0, 15.0);
    step(&mut session, &mut input, 10.0, &mut feedback);

    assert_eq!(feedback.count(SoundEffect::RotateBuilding), 1);
    let save = session.save();
    assert_eq!(save.buildings.len(), 1);
    assert!((save.buildings[0].yaw - 90.0).abs() < 1e-4);
}

#[test]
fn test_secondary_click_cancels_placement() {
    let mut session = sample_session();
    let mut input = InputQueue::new();
    let mut feedback = RecordingFeedback::new();

    session.begin_placement("zombie_den", &mut feedback).unwrap();
    input.push(InputEvent::SecondaryDown {
        screen: Vec2::new(30.0, 30.0),
    });
    step(&mut session, &mut input, 0.0, &mut feedback);

    assert!(!session.is_placing());
    assert_eq!(session.ledger().amount("Bone"), 150);
}

// ============================================================================
// Purchases
// ============================================================================

#[test]
fn test_unit_purchase_spawns_after_build_time() {
    let mut session = sample_session();
    let mut input = InputQueue::new();
    let mut feedback = RecordingFeedback::new();

    session.purchase_unit("ghoul", ground(0.0, -5.0), &mut feedback).unwrap();
    assert_eq!(session.ledger().amount("Bone"), 100);

    step(&mut session, &mut input, 4.0, &mut feedback);
    assert!(session.world().is_empty());
    step(&mut session, &mut input, 4.0, &mut feedback);
    assert_eq!(session.world().len(), 1);
    assert_eq!(feedback.count(SoundEffect::BuildingComplete), 1);
    assert_eq!(feedback.last_resources().unwrap(), [
        ("Biohazard".to_string(), 150),
        ("Bone".to_string(), 100),
    ]);
}

#[test]
fn test_unaffordable_purchase_is_rejected() {
    let mut session = sample_session();
    let mut feedback = RecordingFeedback::new();

    for _ in 0..4 {
        let _ = session.purchase_unit("ghoul", ground(0.0, -5.0), &mut feedback);
    }

    assert_eq!(session.ledger().amount("Bone"), 0);
    assert_eq!(session.scheduler().len(), 3);
    assert_eq!(feedback.count(SoundEffect::ErrorClick), 1);
}

#[test]
fn test_den_trains_ghouls_in_front_of_itself() {
    let mut session = sample_session();
    let mut feedback = RecordingFeedback::new();
    let den = session
        .place_building_now("zombie_den", ground(20.0, 20.0), 0.0, Faction::Player)
        .unwrap();

    let ghoul = session.spawn_unit_now("ghoul", ground(0.0, 20.0), Faction::Player).unwrap();

    session.train_unit(den, "ghoul", &mut feedback).unwrap();
    assert!(session.train_unit(den, "doctor", &mut feedback).is_err());
    assert!(matches!(
        session.train_unit(ghoul, "ghoul", &mut feedback),
        Err(GameError::InvalidSelectionTarget)
    ));

    let (_, descriptor) = session.scheduler().active_jobs().next().unwrap();
    assert!(descriptor.position.z > 20.0 + 2.0);
}

// ============================================================================
// Selection
// ============================================================================

#[test]
fn test_drag_selects_units_inside_and_click_clears() {
    let mut session = sample_session();
    let mut input = InputQueue::new();
    let mut feedback = RecordingFeedback::new();
    let ids: Vec<_> = (0..5)
        .map(|i| {
            session
                .spawn_unit_now("ghoul", ground(i as f32 * 4.0, 20.0), Faction::Player)
                .unwrap()
        })
        .collect();

    input.push(InputEvent::PrimaryDown {
        screen: Vec2::new(-2.0, 15.0),
        modifier: false,
    });
    input.push(InputEvent::PointerMoved {
        screen: Vec2::new(10.0, 25.0),
    });
    input.push(InputEvent::PrimaryUp {
        screen: Vec2::new(10.0, 25.0),
    });
    step(&mut session, &mut input, 0.0, &mut feedback);

    assert_eq!(session.selection().units(), &ids[..3]);
    let shown: Vec<_> = feedback
        .calls
        .iter()
        .filter(|c| matches!(c, Feedback::Selection(_, true)))
        .collect();
    assert_eq!(shown.len(), 3);

    feedback.clear();
    click(&mut input, 50.0, 50.0);
    step(&mut session, &mut input, 0.0, &mut feedback);
    assert!(session.selection().is_empty());
    assert_eq!(feedback.sounds(), vec![SoundEffect::ClickOnEmpty]);
    assert!(feedback.last_selection().unwrap().is_empty());
}

#[test]
fn test_building_click_replaces_unit_selection() {
    let mut session = sample_session();
    let mut input = InputQueue::new();
    let mut feedback = RecordingFeedback::new();
    let ghoul = session.spawn_unit_now("ghoul", ground(0.0, 20.0), Faction::Player).unwrap();
    let den = session
        .place_building_now("zombie_den", ground(20.0, 20.0), 0.0, Faction::Player)
        .unwrap();

    click(&mut input, 0.0, 20.0);
    step(&mut session, &mut input, 0.0, &mut feedback);
    assert_eq!(session.selection().units(), &[ghoul]);

    feedback.clear();
    click(&mut input, 20.0, 20.0);
    step(&mut session, &mut input, 0.0, &mut feedback);
    assert!(session.selection().units().is_empty());
    assert_eq!(session.selection().building(), Some(den));
    assert_eq!(
        feedback.sounds(),
        vec![SoundEffect::ClickOnBuilding, SoundEffect::ShowUIBuilding]
    );

    feedback.clear();
    click(&mut input, 0.0, 20.0);
    step(&mut session, &mut input, 0.0, &mut feedback);
    assert_eq!(
        feedback.sounds(),
        vec![SoundEffect::CloseUIBuilding, SoundEffect::ClickOnBuilding]
    );
}

// ============================================================================
// Commands
// ============================================================================

#[test]
fn test_secondary_click_moves_selection_and_hides_marker_on_arrival() {
    let mut session = sample_session();
    let mut input = InputQueue::new();
    let mut feedback = RecordingFeedback::new();
    let ghoul = session.spawn_unit_now("ghoul", ground(0.0, 20.0), Faction::Player).unwrap();

    click(&mut input, 0.0, 20.0);
    input.push(InputEvent::SecondaryDown {
        screen: Vec2::new(10.0, 20.0),
    });
    step(&mut session, &mut input, 0.05, &mut feedback);
    assert!(feedback.calls.contains(&Feedback::Destination(Some(ground(10.0, 20.0)))));
    assert!(feedback.calls.contains(&Feedback::Motion(ghoul, MotionState::Moving)));

    for _ in 0..100 {
        step(&mut session, &mut input, 0.05, &mut feedback);
    }
    let unit = session.world().get(ghoul).unwrap();
    assert!(unit.position().distance(ground(10.0, 20.0)) < 0.5);
    assert!(feedback.calls.contains(&Feedback::Motion(ghoul, MotionState::Idle)));
    assert_eq!(
        feedback
            .calls
            .iter()
            .filter(|c| matches!(c, Feedback::Destination(None)))
            .count(),
        1
    );
}

#[test]
fn test_secondary_click_on_hostile_attacks_until_dead() {
    let mut session = sample_session();
    let mut input = InputQueue::new();
    let mut feedback = RecordingFeedback::new();
    let ghoul = session.spawn_unit_now("ghoul", ground(0.0, 20.0), Faction::Player).unwrap();
    let enemy = session.spawn_unit_now("ghoul", ground(0.0, 26.0), Faction::Hostile).unwrap();

    click(&mut input, 0.0, 20.0);
    input.push(InputEvent::SecondaryDown {
        screen: Vec2::new(0.0, 26.0),
    });
    step(&mut session, &mut input, 0.05, &mut feedback);
    assert!(!feedback.calls.iter().any(|c| matches!(c, Feedback::Destination(_))));

    for _ in 0..300 {
        step(&mut session, &mut input, 0.05, &mut feedback);
        if !session.world().contains(enemy) {
            break;
        }
    }

    assert!(!session.world().contains(enemy));
    assert!(session.world().contains(ghoul));
}

#[test]
fn test_hostile_picks_are_not_selectable() {
    let mut session = sample_session();
    let mut input = InputQueue::new();
    let mut feedback = RecordingFeedback::new();
    session.spawn_unit_now("doctor", ground(0.0, 20.0), Faction::Hostile).unwrap();

    click(&mut input, 0.0, 20.0);
    step(&mut session, &mut input, 0.0, &mut feedback);

    assert!(session.selection().is_empty());
    assert!(feedback.sounds().is_empty());
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_save_then_load_restores_entities_and_resources() {
    let mut session = sample_session();
    let mut feedback = RecordingFeedback::new();
    session
        .place_building_now("bone_factory", ground(30.0, 30.0), 90.0, Faction::Player)
        .unwrap();
    session.spawn_unit_now("ghoul", ground(5.0, 5.0), Faction::Player).unwrap();
    session.spawn_unit_now("doctor", ground(-5.0, 5.0), Faction::Hostile).unwrap();
    session.purchase_unit("ghoul", ground(0.0, -5.0), &mut feedback).unwrap();

    let json = session.save().to_json().unwrap();
    let save = zombie_core::save::SaveGame::from_json(&json).unwrap();

    let mut restored = sample_session();
    restored.load(&save);

    assert_eq!(restored.save(), session.save());
    assert_eq!(restored.ledger().amount("Bone"), 100);
    assert!(restored.scheduler().is_empty());
    assert_eq!(restored.terrain().colliders.len(), 1);
}

#[test]
fn test_load_hides_destination_and_forgets_the_cursor() {
    let mut session = sample_session();
    let mut input = InputQueue::new();
    let mut feedback = RecordingFeedback::new();
    session.spawn_unit_now("ghoul", ground(0.0, 20.0), Faction::Player).unwrap();
    let snapshot = session.save();

    click(&mut input, 0.0, 20.0);
    input.push(InputEvent::SecondaryDown {
        screen: Vec2::new(40.0, 20.0),
    });
    step(&mut session, &mut input, 0.05, &mut feedback);
    assert!(feedback.calls.contains(&Feedback::Destination(Some(ground(40.0, 20.0)))));

    // Leave a cursor behind from an abandoned placement.
    session.begin_placement("bone_factory", &mut feedback).unwrap();
    hover(&mut input, 30.0, 30.0);
    step(&mut session, &mut input, 0.0, &mut feedback);
    assert!(session.preview().unwrap().position().is_some());
    session.cancel_placement(&mut feedback);

    session.load(&snapshot);
    feedback.clear();
    step(&mut session, &mut input, 0.05, &mut feedback);
    step(&mut session, &mut input, 0.05, &mut feedback);
    assert_eq!(feedback.calls, vec![Feedback::Destination(None)]);

    // The old cursor does not leak into a preview started after the load.
    session.begin_placement("bone_factory", &mut feedback).unwrap();
    assert_eq!(session.preview().unwrap().position(), None);
}

#[test]
fn test_missing_save_file_loads_an_empty_game() {
    let dir = tempfile::tempdir().unwrap();
    let save = load_from_path(dir.path().join("slot1.json")).unwrap();
    assert!(save.is_empty());

    let mut session = sample_session();
    session.spawn_unit_now("ghoul", ground(5.0, 5.0), Faction::Player).unwrap();
    session
        .place_building_now("zombie_den", ground(20.0, 20.0), 0.0, Faction::Player)
        .unwrap();
    session.load(&save);

    assert!(session.world().is_empty());
    assert!(session.terrain().colliders.is_empty());
    assert!(session.ledger().snapshot().is_empty());
}

// ============================================================================
// Demolition
// ============================================================================

#[test]
fn test_removing_a_building_refunds_and_frees_its_footprint() {
    let mut session = sample_session();
    let mut input = InputQueue::new();
    let mut feedback = RecordingFeedback::new();

    session.begin_placement("bone_factory", &mut feedback).unwrap();
    hover(&mut input, 30.0, 30.0);
    click(&mut input, 30.0, 30.0);
    step(&mut session, &mut input, 0.0, &mut feedback);
    step(&mut session, &mut input, 12.0, &mut feedback);
    assert_eq!(session.ledger().amount("Biohazard"), 100);
    let factory = session.world().sorted_ids()[0];
    assert!(session.terrain().colliders.collider_of(factory).is_some());

    click(&mut input, 30.0, 30.0);
    step(&mut session, &mut input, 0.0, &mut feedback);
    assert_eq!(session.selection().building(), Some(factory));

    feedback.clear();
    session.remove_building(factory, &mut feedback).unwrap();
    assert_eq!(session.ledger().amount("Biohazard"), 150);
    assert!(session.world().is_empty());
    assert!(session.terrain().colliders.is_empty());
    assert!(session.selection().building().is_none());
    assert_eq!(feedback.sounds(), vec![SoundEffect::CloseUIBuilding]);

    // The freed cell accepts a new building straight away.
    session.begin_placement("bone_factory", &mut feedback).unwrap();
    hover(&mut input, 30.0, 30.0);
    step(&mut session, &mut input, 0.0, &mut feedback);
    assert_eq!(feedback.last_preview(), Some(PlacementState::Valid));
}

#[test]
fn test_removing_a_unit_or_stale_id_is_refused() {
    let mut session = sample_session();
    let mut feedback = RecordingFeedback::new();
    let ghoul = session.spawn_unit_now("ghoul", ground(5.0, 5.0), Faction::Player).unwrap();

    assert!(matches!(
        session.remove_building(ghoul, &mut feedback),
        Err(GameError::EntityNotFound(id)) if id == ghoul
    ));
    assert!(matches!(
        session.remove_building(999, &mut feedback),
        Err(GameError::EntityNotFound(999))
    ));
    assert_eq!(session.world().len(), 1);
    assert_eq!(session.ledger().amount("Bone"), 150);
}

#[test]
fn test_scenery_blocks_placement_through_the_session() {
    let mut session = sample_session();
    let mut input = InputQueue::new();
    let mut feedback = RecordingFeedback::new();
    session
        .terrain_mut()
        .colliders
        .insert(Obb::cube(ground(31.0, 30.0), 0.5), LayerMask::OBSTACLE, None);

    session.begin_placement("bone_factory", &mut feedback).unwrap();
    hover(&mut input, 30.0, 30.0);
    click(&mut input, 30.0, 30.0);
    step(&mut session, &mut input, 0.0, &mut feedback);

    assert!(session.is_placing());
    assert_eq!(
        session.preview().unwrap().rejection(),
        Some(PlacementRejection::OverlapsObstacle)
    );
    assert_eq!(session.ledger().amount("Biohazard"), 150);
}
