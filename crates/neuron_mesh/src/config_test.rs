use super::*;

#[test]
fn test_default_values() {
  let config = PipelineConfig::default();

  assert_eq!(config.segment.sides, 16);
  assert_eq!(config.volume.voxel_size_factor, 1.5);
  assert_eq!(config.volume.min_voxel_size, 0.1);
  assert_eq!(config.volume.max_voxel_size, 5.0);
  assert_eq!(config.volume.smoothing_iterations, 10);
  assert_eq!(config.volume.smoothing_relaxation, 0.1);
  assert_eq!(config.lod.targets, vec![4096, 2048, 1024, 512]);
  assert!(config.validate().is_ok());
}

#[test]
fn test_single_target_variant() {
  assert_eq!(LodConfig::single_target().targets, vec![1000]);
}

#[test]
fn test_derive_voxel_size_clamps() {
  let volume = VolumeConfig::default();

  assert!((volume.derive_voxel_size(0.5) - 0.75).abs() < 1e-6);
  // 0.01 * 1.5 clamps up to the minimum
  assert_eq!(volume.derive_voxel_size(0.01), 0.1);
  // 10 * 1.5 clamps down to the maximum
  assert_eq!(volume.derive_voxel_size(10.0), 5.0);
}

#[test]
fn test_derive_voxel_size_with_inverted_bounds() {
  let volume = VolumeConfig {
    min_voxel_size: 5.0,
    max_voxel_size: 0.1,
    ..VolumeConfig::default()
  };
  assert_eq!(volume.derive_voxel_size(0.5), 0.1);
  assert_eq!(volume.derive_voxel_size(100.0), 0.1);
}

#[test]
fn test_partial_toml_keeps_defaults() {
  let config = PipelineConfig::from_toml_str(
    r#"
      [segment]
      sides = 8

      [lod]
      targets = [1000]
    "#,
  )
  .unwrap();

  assert_eq!(config.segment.sides, 8);
  assert_eq!(config.segment.sphere_subdivisions, 3);
  assert_eq!(config.volume, VolumeConfig::default());
  assert_eq!(config.lod.targets, vec![1000]);
}

#[test]
fn test_empty_toml_is_default() {
  let config = PipelineConfig::from_toml_str("").unwrap();
  assert_eq!(config, PipelineConfig::default());
}

#[test]
fn test_rejects_too_few_sides() {
  let result = PipelineConfig::from_toml_str("[segment]\nsides = 2\n");
  assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_rejects_zero_lod_target() {
  let config = PipelineConfig::new().with_lod_targets(vec![4096, 0]);
  assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn test_rejects_inverted_voxel_bounds() {
  let mut config = PipelineConfig::new();
  config.volume.min_voxel_size = 2.0;
  config.volume.max_voxel_size = 1.0;
  assert!(config.validate().is_err());
}

#[test]
fn test_rejects_malformed_toml() {
  let result = PipelineConfig::from_toml_str("[lod]\ntargets = \"many\"\n");
  assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_load_missing_file() {
  let result = PipelineConfig::load(Path::new("/nonexistent/neuron_mesh.toml"));
  assert!(matches!(result, Err(ConfigError::Read { .. })));
}

#[test]
fn test_builders() {
  let config = PipelineConfig::new()
    .with_sides(12)
    .with_sphere_subdivisions(1)
    .with_smoothing(0, 0.0)
    .with_max_grid_samples(1000)
    .with_lod_targets(vec![64]);

  assert_eq!(config.segment.sides, 12);
  assert_eq!(config.segment.sphere_subdivisions, 1);
  assert_eq!(config.volume.smoothing_iterations, 0);
  assert_eq!(config.volume.max_grid_samples, 1000);
  assert_eq!(config.lod.targets, vec![64]);
}
