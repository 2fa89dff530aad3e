//! Tunables for every pipeline stage.
//!
//! All values have named defaults. A config
//! can be built in code with the `with_*` builders or loaded from TOML, where
//! any omitted field falls back to its default:
//!
//! ```toml
//! [segment]
//! sides = 16
//!
//! [volume]
//! smoothing_iterations = 10
//!
//! [lod]
//! targets = [4096, 2048, 1024, 512]
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Default LOD face targets for levels 1..=4.
pub const DEFAULT_LOD_TARGETS: [usize; 4] = [4096, 2048, 1024, 512];

/// Face target of the single-level LOD variant.
pub const SINGLE_LOD_TARGET: usize = 1000;

/// Geometry settings for spheres and segment frustums.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
  /// Angular sections around each frustum end circle.
  pub sides: usize,

  /// Icosphere subdivision level of per-node spheres.
  pub sphere_subdivisions: u32,

  /// Icosphere subdivision level substituted for a zero-length segment.
  pub degenerate_subdivisions: u32,

  /// Center distance below which a segment has no usable axis.
  pub degeneracy_tolerance: f32,
}

impl Default for SegmentConfig {
  fn default() -> Self {
    Self {
      sides: 16,
      sphere_subdivisions: 3,
      degenerate_subdivisions: 2,
      degeneracy_tolerance: 1e-6,
    }
  }
}

/// Settings of the volumetric reconstruction strategy.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
  /// Derived voxel size = smallest positive radius * factor.
  pub voxel_size_factor: f32,

  /// Lower clamp for the derived voxel size.
  pub min_voxel_size: f32,

  /// Upper clamp for the derived voxel size.
  pub max_voxel_size: f32,

  /// Radii at or below this are treated as zero.
  pub min_primitive_radius: f32,

  /// Air samples added around the primitive bounds on every side.
  pub padding_voxels: usize,

  /// Laplacian smoothing passes over the extracted surface.
  pub smoothing_iterations: usize,

  /// Fraction of the neighbour-average offset applied per pass.
  pub smoothing_relaxation: f32,

  /// Upper bound on grid samples (nx * ny * nz).
  pub max_grid_samples: usize,
}

impl Default for VolumeConfig {
  fn default() -> Self {
    Self {
      voxel_size_factor: 1.5,
      min_voxel_size: 0.1,
      max_voxel_size: 5.0,
      min_primitive_radius: 1e-6,
      padding_voxels: 2,
      smoothing_iterations: 10,
      smoothing_relaxation: 0.1,
      max_grid_samples: 1 << 27,
    }
  }
}

impl VolumeConfig {
  /// Voxel size derived from the smallest positive node radius.
  ///
  /// Inverted bounds do not panic: the upper bound wins.
  pub fn derive_voxel_size(&self, min_radius: f32) -> f32 {
    (min_radius * self.voxel_size_factor)
      .max(self.min_voxel_size)
      .min(self.max_voxel_size)
  }
}

/// Face-count targets for LOD levels 1..=N, in level order.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LodConfig {
  pub targets: Vec<usize>,
}

impl Default for LodConfig {
  fn default() -> Self {
    Self {
      targets: DEFAULT_LOD_TARGETS.to_vec(),
    }
  }
}

impl LodConfig {
  pub fn new(targets: Vec<usize>) -> Self {
    Self { targets }
  }

  /// One simplified level at 1000 faces.
  pub fn single_target() -> Self {
    Self::new(vec![SINGLE_LOD_TARGET])
  }
}

/// Configuration threaded through every pipeline component.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
  pub segment: SegmentConfig,
  pub volume: VolumeConfig,
  pub lod: LodConfig,
}

impl PipelineConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_sides(mut self, sides: usize) -> Self {
    self.segment.sides = sides;
    self
  }

  pub fn with_sphere_subdivisions(mut self, subdivisions: u32) -> Self {
    self.segment.sphere_subdivisions = subdivisions;
    self
  }

  pub fn with_smoothing(mut self, iterations: usize, relaxation: f32) -> Self {
    self.volume.smoothing_iterations = iterations;
    self.volume.smoothing_relaxation = relaxation;
    self
  }

  pub fn with_max_grid_samples(mut self, limit: usize) -> Self {
    self.volume.max_grid_samples = limit;
    self
  }

  pub fn with_lod_targets(mut self, targets: Vec<usize>) -> Self {
    self.lod.targets = targets;
    self
  }

  /// Load configuration from a TOML file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_toml_str(&content)
  }

  /// Parse and validate configuration from TOML text.
  pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
    let config: PipelineConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  /// Reject values no stage can work with.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.segment.sides < 3 {
      return Err(ConfigError::Invalid(format!(
        "segment.sides must be at least 3, got {}",
        self.segment.sides
      )));
    }
    if !(self.segment.degeneracy_tolerance >= 0.0) {
      return Err(ConfigError::Invalid(
        "segment.degeneracy_tolerance must be non-negative".into(),
      ));
    }

    let volume = &self.volume;
    if !(volume.min_voxel_size > 0.0) || volume.min_voxel_size > volume.max_voxel_size {
      return Err(ConfigError::Invalid(format!(
        "voxel size bounds must satisfy 0 < min <= max, got [{}, {}]",
        volume.min_voxel_size, volume.max_voxel_size
      )));
    }
    if !(volume.voxel_size_factor > 0.0) {
      return Err(ConfigError::Invalid(
        "volume.voxel_size_factor must be positive".into(),
      ));
    }
    if !(0.0..=1.0).contains(&volume.smoothing_relaxation) {
      return Err(ConfigError::Invalid(format!(
        "volume.smoothing_relaxation must lie in [0, 1], got {}",
        volume.smoothing_relaxation
      )));
    }
    if volume.max_grid_samples == 0 {
      return Err(ConfigError::Invalid(
        "volume.max_grid_samples must be positive".into(),
      ));
    }

    if let Some(position) = self.lod.targets.iter().position(|&target| target == 0) {
      return Err(ConfigError::Invalid(format!(
        "lod.targets[{position}] must be positive"
      )));
    }

    Ok(())
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
