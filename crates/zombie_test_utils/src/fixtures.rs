//! Test fixtures and helpers.
//!
//! Pre-built terrain, blueprints and sessions for consistent testing.

use glam::{Vec2, Vec3};
use zombie_core::config::CoreConfig;
use zombie_core::data::{BlueprintRegistry, BuildingData, UnitData};
use zombie_core::math::Fixed;
use zombie_core::session::Session;
use zombie_core::spatial::{HeightField, Terrain};

/// Half size of the fixture maps.
pub const MAP_HALF_SIZE: f32 = 100.0;

/// Blueprints used across tests.
///
/// `biohazard_factory` costs 200 Bone so it is unaffordable from the
/// fixture starting resources.
pub const SAMPLE_DATA: &str = r#"GameData(
    buildings: [
        BuildingData(
            id: "zombie_den",
            name: "Zombie Den",
            costs: [(resource: "Bone", amount: 100)],
            build_time: 10.0,
            health: 500,
            armor: 2,
            half_extents: (2.0, 2.0, 2.0),
            trains: ["ghoul"],
        ),
        BuildingData(
            id: "bone_factory",
            name: "Bone Factory",
            costs: [(resource: "Biohazard", amount: 50)],
            build_time: 12.0,
            health: 400,
            half_extents: (3.0, 2.5, 3.0),
            production: [(resource: "Bone", amount_per_cycle: 5, cycle_seconds: 4.0)],
        ),
        BuildingData(
            id: "biohazard_factory",
            name: "Biohazard Factory",
            costs: [(resource: "Bone", amount: 200)],
            build_time: 15.0,
            health: 400,
            half_extents: (3.0, 2.5, 3.0),
            production: [(resource: "Biohazard", amount_per_cycle: 5, cycle_seconds: 5.0)],
        ),
    ],
    units: [
        UnitData(
            id: "ghoul",
            name: "Ghoul",
            health: 60,
            movement_speed: 3.5,
            build_time: 6.0,
            costs: [(resource: "Bone", amount: 50)],
            combat: Some(CombatStats(attack_damage: 8, attack_range: 1.5, attack_interval: 1.0)),
        ),
        UnitData(
            id: "doctor",
            name: "Doctor",
            health: 40,
            movement_speed: 4.0,
            build_time: 10.0,
            costs: [(resource: "Biohazard", amount: 25)],
        ),
    ],
)"#;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
#[must_use]
pub fn fixed_f(n: f64) -> Fixed {
    Fixed::from_num(n)
}

/// Registry holding [`SAMPLE_DATA`].
///
/// # Panics
///
/// Panics if the sample data fails to parse.
#[must_use]
pub fn sample_registry() -> BlueprintRegistry {
    BlueprintRegistry::from_ron_str(SAMPLE_DATA, "fixtures").expect("sample data parses")
}

/// One sample building blueprint.
///
/// # Panics
///
/// Panics if `id` is not in [`SAMPLE_DATA`].
#[must_use]
pub fn building(id: &str) -> BuildingData {
    sample_registry()
        .building(id)
        .cloned()
        .unwrap_or_else(|| panic!("no sample building '{id}'"))
}

/// One sample unit blueprint.
///
/// # Panics
///
/// Panics if `id` is not in [`SAMPLE_DATA`].
#[must_use]
pub fn unit(id: &str) -> UnitData {
    sample_registry()
        .unit(id)
        .cloned()
        .unwrap_or_else(|| panic!("no sample unit '{id}'"))
}

/// Default config with `{Bone: 150, Biohazard: 150}` to start.
#[must_use]
pub fn sample_config() -> CoreConfig {
    let mut config = CoreConfig::default();
    config.starting_resources.insert("Bone".to_string(), 150);
    config.starting_resources.insert("Biohazard".to_string(), 150);
    config
}

/// Flat ground at height zero.
///
/// # Panics
///
/// Panics if the height field cannot be built.
#[must_use]
pub fn flat_ground() -> HeightField {
    HeightField::flat(MAP_HALF_SIZE, 0.0).expect("flat ground")
}

/// Ground rising along +Z at `degrees`.
///
/// # Panics
///
/// Panics if the height field cannot be built.
#[must_use]
pub fn sloped_ground(degrees: f32) -> HeightField {
    let rise = degrees.to_radians().tan();
    let spacing = 2.0;
    let samples = (2.0 * MAP_HALF_SIZE / spacing) as usize + 1;
    HeightField::from_fn(
        Vec2::splat(-MAP_HALF_SIZE),
        spacing,
        samples,
        samples,
        |_, z| Some(z * rise),
    )
    .expect("sloped ground")
}

/// Flat terrain with default probe settings and no colliders.
#[must_use]
pub fn flat_terrain() -> Terrain {
    let rules = CoreConfig::default().placement;
    Terrain::new(flat_ground(), rules.probe_height, rules.probe_distance)
}

/// Session on flat ground with the sample blueprints and starting resources.
///
/// # Panics
///
/// Panics if the session cannot be created.
#[must_use]
pub fn sample_session() -> Session {
    Session::new(sample_config(), sample_registry(), flat_ground()).expect("sample session")
}

/// Point on the ground plane.
#[must_use]
pub const fn ground(x: f32, z: f32) -> Vec3 {
    Vec3::new(x, 0.0, z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_data_is_valid() {
        assert!(sample_registry().validate().is_empty());
    }

    #[test]
    fn test_sloped_ground_rises_along_z() {
        let ground = sloped_ground(45.0);
        let h = ground.height_at(0.0, 10.0).unwrap();
        assert!((h - 10.0).abs() < 1e-3);
    }
}
