//! Placement and command benchmarks for zombie_core.
//!
//! Run with: `cargo bench -p zombie_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec3;
use zombie_core::commands::{layout, FormationType};
use zombie_core::config::{GridConfig, PlacementRules};
use zombie_core::grid::GridSnapper;
use zombie_core::placement::{validate, Candidate};
use zombie_core::spatial::{HeightField, LayerMask, Obb, Terrain};

/// A 200x200 map with a building every 12 units and a tree between them.
fn crowded_terrain() -> Terrain {
    let ground = HeightField::flat(100.0, 0.0).unwrap();
    let mut terrain = Terrain::new(ground, 5.0, 10.0);
    for x in (-96..=96).step_by(12) {
        for z in (-96..=96).step_by(12) {
            let center = Vec3::new(x as f32, 0.0, z as f32);
            terrain
                .colliders
                .insert(Obb::axis_aligned(center, Vec3::splat(2.0)), LayerMask::BUILDING, None);
            terrain.colliders.insert(
                Obb::cube(center + Vec3::new(6.0, 0.0, 6.0), 0.5),
                LayerMask::OBSTACLE,
                None,
            );
        }
    }
    terrain
}

/// One preview frame: snap the cursor and run every rule.
pub fn placement_benchmark(c: &mut Criterion) {
    let terrain = crowded_terrain();
    let rules = PlacementRules::default();
    let snapper = GridSnapper::from_config(&GridConfig::default()).unwrap();
    let cursors: Vec<Vec3> = (0..64)
        .map(|i| Vec3::new((i * 3) as f32 - 90.0, 0.0, (i * 7 % 180) as f32 - 90.0))
        .collect();

    c.bench_function("validate_preview_frame", |b| {
        b.iter(|| {
            for cursor in &cursors {
                let candidate = Candidate::new(snapper.snap(*cursor), 90.0, Vec3::new(3.0, 2.5, 3.0));
                black_box(validate(&candidate, &rules, Vec3::ZERO, &terrain).is_ok());
            }
        })
    });
}

/// Formation slots for a large selection.
pub fn formation_benchmark(c: &mut Criterion) {
    c.bench_function("layout_triangle_200", |b| {
        b.iter(|| layout(FormationType::Triangle, black_box(200), Vec3::ZERO, 1.5))
    });
}

criterion_group!(benches, placement_benchmark, formation_benchmark);
criterion_main!(benches);
