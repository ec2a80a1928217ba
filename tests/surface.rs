use glam::{Vec2, Vec3};
use std::f32::consts::PI;
use tempfile::tempdir;

use water_surface::prelude::*;

fn single_cell_source() -> TileSource {
    TileSource {
        bounds_center: Vec3::new(0.5, 0.0, 0.5),
        bounds_extents: Vec3::new(0.5, 0.0, 0.5),
        transform: TileTransform::default(),
    }
}

#[test]
fn single_cell_tile_at_time_zero() {
    let config = WaterConfig {
        octaves: vec![Octave::new(Vec2::new(1.0, 0.0), 0.1, 10.0)],
        verts_per_unit: 1,
        ..Default::default()
    };
    let mut meshes = TileMeshes::new();
    let mut animator = WaveAnimator::setup(&[single_cell_source()], &config, &mut meshes).unwrap();

    let mesh = meshes.get(0).unwrap();
    assert_eq!(mesh.indices, vec![0, 3, 2, 0, 1, 3]);
    assert_eq!(mesh.positions[0], Vec3::ZERO);

    animator.tick(0.0, &mut meshes).unwrap();
    let out = meshes.get(0).unwrap().positions[0];

    // Phase is zero: no height and no sideways motion; the cosine term shifts x by a
    let a = 0.1 / (2.0 * PI / 10.0);
    assert_eq!(out.y, 0.0);
    assert_eq!(out.z, 0.0);
    assert!((out.x - a).abs() < 1e-6);
}

#[test]
fn animate_and_export_tiled_surface() {
    let config = WaterConfig {
        octaves: generate_octaves(3, 6.0, 0.5, 30.0, 20.0, 11),
        verts_per_unit: 2,
        batch_size: 16,
        ..Default::default()
    };
    let sources = grid_layout(3, 2, 4.0, Vec3::new(1.0, 1.0, 1.5));
    let mut meshes = TileMeshes::new();
    let mut animator = WaveAnimator::setup(&sources, &config, &mut meshes).unwrap();

    assert_eq!(animator.registry().len(), 6);
    assert_eq!(meshes.meshes.len(), 6);
    let total: usize = meshes.meshes.iter().map(|m| m.positions.len()).sum();
    assert_eq!(total, animator.registry().vertex_count());

    for frame in 0..5 {
        animator.tick(frame as f32 * 0.1, &mut meshes).unwrap();
    }

    let (min, max) = meshes.height_range().unwrap();
    assert!(min < 0.0 && max > 0.0, "range {}..{}", min, max);
    for mesh in &meshes.meshes {
        assert!(mesh.positions.iter().all(|p| p.is_finite()));
        assert!(mesh.normals.iter().all(|n| (n.length() - 1.0).abs() < 1e-4));
    }

    let dir = tempdir().unwrap();
    let path = dir.path().join("surface.glb");
    meshes.save_glb(&path).unwrap();
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
}

#[test]
fn config_file_drives_setup() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("water.ron");
    std::fs::write(
        &path,
        "(octaves: [(direction: (1.0, 1.0), steepness: 0.3, wavelength: 5.0)], verts_per_unit: 1, schedule: sequential)",
    )
    .unwrap();

    let config = WaterConfig::load(&path).unwrap();
    assert_eq!(config.schedule, Schedule::Sequential);
    assert_eq!(config.octaves[0].direction, Vec2::new(1.0, 1.0));

    let mut meshes = TileMeshes::new();
    let mut animator = WaveAnimator::setup(&grid_layout(1, 1, 2.0, Vec3::ONE), &config, &mut meshes).unwrap();
    animator.tick(0.5, &mut meshes).unwrap();
    assert_ne!(animator.output(), animator.registry().anchors());
}

#[test]
fn missing_config_file_is_io_error() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        WaterConfig::load(dir.path().join("absent.ron")),
        Err(WaterError::Io(_))
    ));
}
