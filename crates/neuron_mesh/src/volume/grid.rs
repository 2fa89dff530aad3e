//! Quantized signed distance grid.
//!
//! Samples are stored as `i8` in voxel units (see [`sdf_conversion`]) and
//! laid out x-major: `index = (x * ny + y) * nz + z`. One x-slab is a
//! contiguous `ny * nz` run, which is the unit of parallel rasterization.

use glam::Vec3;
use rayon::prelude::*;

use super::primitive::Primitive;
use crate::error::ReconstructionError;
use crate::mesh::MinMaxAABB;

/// SDF sample type (quantized).
pub type SdfSample = i8;

/// SDF quantization utilities.
///
/// Distances are divided by the voxel size before quantizing, so precision is
/// the same at every grid resolution.
pub mod sdf_conversion {
  /// SDF range in voxels (values outside this clamp to ±127).
  pub const RANGE: f32 = 4.0;

  /// Scale factor: 127 / RANGE.
  pub const SCALE: f32 = 127.0 / RANGE;

  /// Inverse scale for converting back to float.
  pub const INV_SCALE: f32 = RANGE / 127.0;

  /// Convert an SDF value in voxels to quantized storage.
  #[inline(always)]
  pub fn to_storage(sdf: f32) -> i8 {
    (sdf * SCALE).clamp(-127.0, 127.0).round() as i8
  }

  /// Convert quantized storage back to an SDF value in voxels.
  #[inline(always)]
  pub fn to_float(value: i8) -> f32 {
    value as f32 * INV_SCALE
  }
}

/// Air value for samples no primitive reaches.
const FAR: SdfSample = 127;

/// Regular sample grid over an axis-aligned region.
#[derive(Clone, Debug)]
pub struct SdfGrid {
  /// World position of sample (0, 0, 0).
  pub origin: Vec3,
  pub voxel_size: f32,
  /// Sample counts per axis.
  pub dims: [usize; 3],
  pub samples: Vec<SdfSample>,
}

impl SdfGrid {
  /// Grid covering `bounds` plus `padding` voxels of air on every side.
  ///
  /// All samples start as air. Fails when the sample count exceeds `limit`.
  pub fn covering(
    bounds: &MinMaxAABB,
    voxel_size: f32,
    padding: usize,
    limit: usize,
  ) -> Result<Self, ReconstructionError> {
    let padded = bounds.expanded(padding as f32 * voxel_size);
    let origin = Vec3::from_array(padded.min);
    let dims = padded
      .size()
      .map(|extent| (extent / voxel_size).ceil().max(0.0) as usize + 1);

    let total = dims[0]
      .checked_mul(dims[1])
      .and_then(|n| n.checked_mul(dims[2]));
    match total {
      Some(total) if total <= limit => Ok(Self {
        origin,
        voxel_size,
        dims,
        samples: vec![FAR; total],
      }),
      _ => Err(ReconstructionError::GridTooLarge { dims, limit }),
    }
  }

  /// Flat index of sample (x, y, z).
  #[inline(always)]
  pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
    (x * self.dims[1] + y) * self.dims[2] + z
  }

  #[inline]
  pub fn get(&self, x: usize, y: usize, z: usize) -> SdfSample {
    self.samples[self.index(x, y, z)]
  }

  /// World position of sample (x, y, z).
  #[inline]
  pub fn world_position(&self, x: usize, y: usize, z: usize) -> Vec3 {
    self.origin + Vec3::new(x as f32, y as f32, z as f32) * self.voxel_size
  }

  /// Union `primitives` into the grid (per-sample minimum).
  ///
  /// Each primitive only touches samples within [`sdf_conversion::RANGE`]
  /// voxels of its bounds; everything farther stays clamped air.
  pub fn rasterize(&mut self, primitives: &[Primitive]) {
    let [nx, ny, nz] = self.dims;
    if nx == 0 || ny == 0 || nz == 0 {
      return;
    }

    let margin = sdf_conversion::RANGE * self.voxel_size;
    let ranges: Vec<[std::ops::RangeInclusive<usize>; 3]> = primitives
      .iter()
      .map(|primitive| {
        let bounds = primitive.bounds().expanded(margin);
        std::array::from_fn(|axis| {
          let lo = ((bounds.min[axis] - self.origin[axis]) / self.voxel_size).floor();
          let hi = ((bounds.max[axis] - self.origin[axis]) / self.voxel_size).ceil();
          let max = self.dims[axis] - 1;
          (lo.max(0.0) as usize).min(max)..=(hi.max(0.0) as usize).min(max)
        })
      })
      .collect();

    let origin = self.origin;
    let voxel_size = self.voxel_size;
    let inv_voxel = voxel_size.recip();

    self
      .samples
      .par_chunks_mut(ny * nz)
      .enumerate()
      .for_each(|(x, slab)| {
        let wx = origin.x + x as f32 * voxel_size;
        for (primitive, [rx, ry, rz]) in primitives.iter().zip(&ranges) {
          if !rx.contains(&x) {
            continue;
          }
          for y in ry.clone() {
            let wy = origin.y + y as f32 * voxel_size;
            let row = &mut slab[y * nz..(y + 1) * nz];
            for z in rz.clone() {
              let point = Vec3::new(wx, wy, origin.z + z as f32 * voxel_size);
              let value = sdf_conversion::to_storage(primitive.distance(point) * inv_voxel);
              if value < row[z] {
                row[z] = value;
              }
            }
          }
        }
      });
  }

  /// Number of samples inside the solid.
  pub fn solid_count(&self) -> usize {
    self.samples.iter().filter(|&&s| s < 0).count()
  }
}

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;
