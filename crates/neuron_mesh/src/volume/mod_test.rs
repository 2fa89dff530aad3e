use std::f32::consts::PI;

use glam::Vec3;

use super::*;

const THREE_NODES: &str = "\
1 1 0 0 0 2.0 -1
2 3 5 0 0 1.0 1
3 3 5 5 0 0.5 2
";

fn tree(text: &str) -> MorphologyTree {
  MorphologyTree::parse(text).unwrap()
}

#[test]
fn test_single_sphere_is_watertight() {
  let result = reconstruct(&tree("1 1 0 0 0 2 -1\n"), Some(0.2), &VolumeConfig::default()).unwrap();

  assert!(result.watertight);
  assert!(result.smoothed);
  assert_eq!(result.holes_filled, 0);
  assert_eq!(result.voxel_size, 0.2);

  let expected = 4.0 / 3.0 * PI * 8.0;
  let volume = result.mesh.signed_volume();
  assert!((volume - expected).abs() / expected < 0.15, "volume {volume}");
}

#[test]
fn test_three_node_chain() {
  let result = reconstruct(&tree(THREE_NODES), Some(0.25), &VolumeConfig::default()).unwrap();
  let mesh = &result.mesh;

  assert!(!mesh.is_empty());
  assert_eq!(mesh.find_invalid_index(), None);
  assert!(mesh.signed_volume() > 0.0);

  let bounds = mesh.bounds();
  assert!((bounds.min[0] + 2.0).abs() < 0.3);
  assert!((bounds.max[0] - 6.0).abs() < 0.3);
  assert!((bounds.max[1] - 5.5).abs() < 0.3);
}

#[test]
fn test_voxel_size_is_derived_from_min_radius() {
  let result = reconstruct(&tree(THREE_NODES), None, &VolumeConfig::default()).unwrap();
  assert!((result.voxel_size - 0.75).abs() < 1e-6);
}

#[test]
fn test_derived_voxel_size_is_clamped() {
  let config = VolumeConfig::default();
  assert_eq!(config.derive_voxel_size(0.01), 0.1);
  assert_eq!(config.derive_voxel_size(100.0), 5.0);
}

#[test]
fn test_zero_radius_tree_without_voxel_size() {
  let zero = tree("1 1 0 0 0 0 -1\n2 3 5 0 0 0 1\n");
  let err = reconstruct(&zero, None, &VolumeConfig::default()).unwrap_err();
  assert_eq!(err, ReconstructionError::DegenerateInput);
}

#[test]
fn test_zero_radius_tree_with_voxel_size() {
  let zero = tree("1 1 0 0 0 0 -1\n2 3 5 0 0 0 1\n");
  let err = reconstruct(&zero, Some(0.5), &VolumeConfig::default()).unwrap_err();
  assert_eq!(err, ReconstructionError::NoGeometry);
}

#[test]
fn test_invalid_voxel_size() {
  let t = tree(THREE_NODES);
  for size in [0.0, -1.0, f32::INFINITY] {
    let err = reconstruct(&t, Some(size), &VolumeConfig::default()).unwrap_err();
    assert!(matches!(err, ReconstructionError::InvalidVoxelSize(_)));
  }
}

#[test]
fn test_grid_limit() {
  let config = VolumeConfig {
    max_grid_samples: 1000,
    ..VolumeConfig::default()
  };
  let err = reconstruct(&tree(THREE_NODES), Some(0.1), &config).unwrap_err();
  assert!(matches!(err, ReconstructionError::GridTooLarge { limit: 1000, .. }));
}

#[test]
fn test_smoothing_shrinks_surface() {
  let sphere = tree("1 1 0 0 0 2 -1\n");
  let raw = VolumeConfig {
    smoothing_iterations: 0,
    ..VolumeConfig::default()
  };

  let unsmoothed = reconstruct(&sphere, Some(0.25), &raw).unwrap();
  let smoothed = reconstruct(&sphere, Some(0.25), &VolumeConfig::default()).unwrap();

  assert_eq!(unsmoothed.mesh.indices, smoothed.mesh.indices);
  assert!(smoothed.mesh.signed_volume() < unsmoothed.mesh.signed_volume());
}

/// Soma of radius 3 with four five-node branches tapering to 0.5.
fn four_branch_tree() -> MorphologyTree {
  let mut text = String::from("1 1 0 0 0 3.0 -1\n");
  let directions = [
    Vec3::X,
    Vec3::NEG_X,
    Vec3::new(0.0, 1.0, 0.3).normalize(),
    Vec3::new(0.2, -0.4, 1.0).normalize(),
  ];
  let mut id = 1;
  for direction in directions {
    let mut parent = 1;
    for step in 1..=5 {
      id += 1;
      let position = direction * (2.5 + 2.0 * step as f32);
      let radius = 3.0 - 0.5 * step as f32;
      text.push_str(&format!(
        "{id} 3 {} {} {} {radius} {parent}\n",
        position.x, position.y, position.z
      ));
      parent = id;
    }
  }
  tree(&text)
}

#[test]
fn test_branching_tree_is_watertight() {
  let branching = four_branch_tree();
  assert_eq!(branching.len(), 21);

  let result = reconstruct(&branching, None, &VolumeConfig::default()).unwrap();

  assert!((result.voxel_size - 0.75).abs() < 1e-6);
  assert!(result.watertight, "split {} filled {}", result.vertices_split, result.holes_filled);
  assert!(topology::is_watertight(&result.mesh));
  assert_eq!(result.mesh.find_invalid_index(), None);
  assert!(result.mesh.signed_volume() > 0.0);
}

#[test]
fn test_inverted_voxel_bounds_do_not_panic() {
  let config = VolumeConfig {
    min_voxel_size: 5.0,
    max_voxel_size: 0.1,
    max_grid_samples: 1 << 24,
    ..VolumeConfig::default()
  };
  let result = reconstruct(&tree(THREE_NODES), None, &config).unwrap();
  assert_eq!(result.voxel_size, 0.1);
}

#[test]
fn test_non_finite_record_never_reaches_reconstruction() {
  let err = MorphologyTree::parse("1 1 nan 0 0 1 -1\n2 1 1 0 0 1 1\n").unwrap_err();
  assert!(matches!(err, crate::error::ParseError::MalformedRecord { line: 1, .. }));
}
