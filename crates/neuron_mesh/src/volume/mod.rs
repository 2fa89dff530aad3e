//! Volumetric strategy: primitives -> SDF grid -> isosurface -> smoothing.
//!
//! ```text
//!  MorphologyTree
//!        │  build_primitives      spheres at nodes, tubes along edges
//!        ▼
//!  PrimitiveSoup
//!        │  SdfGrid::rasterize    i8 signed distance, per-sample minimum
//!        ▼
//!  SdfGrid
//!        │  surface_nets::extract one vertex per sign-changing cell
//!        ▼
//!  Mesh  ── topology::split_nonmanifold ── smooth::laplacian ── topology::fill_holes
//!        │
//!        ▼
//!  Reconstruction
//! ```
//!
//! The union of overlapping primitives happens in the grid, so the output is
//! a single surface no matter how the input solids intersect.

pub mod grid;
pub mod primitive;
pub mod smooth;
pub mod surface_nets;

use web_time::Instant;

use crate::config::VolumeConfig;
use crate::error::ReconstructionError;
use crate::mesh::{topology, Mesh};
use crate::morphology::MorphologyTree;

pub use grid::SdfGrid;
pub use primitive::{build_primitives, Primitive, PrimitiveSoup};

/// Output of [`reconstruct`].
#[derive(Clone, Debug)]
pub struct Reconstruction {
  pub mesh: Mesh,
  /// Voxel size actually used (explicit or derived).
  pub voxel_size: f32,
  /// Sample counts of the rasterized grid.
  pub grid_dims: [usize; 3],
  /// False when smoothing failed and the raw surface was kept.
  pub smoothed: bool,
  /// Vertices duplicated to pull apart sheets touching at an edge or point.
  pub vertices_split: usize,
  /// Boundary loops closed by the repair pass.
  pub holes_filled: usize,
  /// False when the surface still has boundary or non-manifold edges.
  pub watertight: bool,
}

/// Resolve the voxel size before any geometry is built.
fn resolve_voxel_size(
  tree: &MorphologyTree,
  voxel_size: Option<f32>,
  config: &VolumeConfig,
) -> Result<f32, ReconstructionError> {
  match voxel_size {
    Some(size) if size.is_finite() && size > 0.0 => Ok(size),
    Some(size) => Err(ReconstructionError::InvalidVoxelSize(size)),
    None => tree
      .min_radius_above(config.min_primitive_radius)
      .map(|min_radius| config.derive_voxel_size(min_radius))
      .ok_or(ReconstructionError::DegenerateInput),
  }
}

/// Rebuild the tree as one closed surface through a voxel grid.
///
/// With `voxel_size == None` the size is derived from the smallest positive
/// node radius, see [`VolumeConfig::derive_voxel_size`].
pub fn reconstruct(
  tree: &MorphologyTree,
  voxel_size: Option<f32>,
  config: &VolumeConfig,
) -> Result<Reconstruction, ReconstructionError> {
  let _span = tracing::info_span!("reconstruct", nodes = tree.len()).entered();
  let start = Instant::now();

  let voxel_size = resolve_voxel_size(tree, voxel_size, config)?;

  let soup = build_primitives(tree, config);
  if soup.primitives.is_empty() {
    return Err(ReconstructionError::NoGeometry);
  }
  tracing::debug!(
    primitives = soup.primitives.len(),
    skipped_spheres = soup.skipped_spheres,
    skipped_tubes = soup.skipped_tubes,
    "built primitive soup"
  );

  let mut grid = SdfGrid::covering(
    &soup.bounds(),
    voxel_size,
    config.padding_voxels,
    config.max_grid_samples,
  )?;
  grid.rasterize(&soup.primitives);
  tracing::info!(voxel_size, dims = ?grid.dims, "rasterized primitives");

  let mut raw = surface_nets::extract(&grid);
  if raw.is_empty() {
    return Err(ReconstructionError::EmptySurface);
  }
  // Ambiguous cells on thin branches join two sheets along one edge.
  let vertices_split = topology::split_nonmanifold(&mut raw);
  if vertices_split > 0 {
    tracing::debug!(vertices_split, "separated non-manifold sheets");
  }

  let (mut mesh, smoothed) = match smooth::laplacian(
    &raw,
    config.smoothing_iterations,
    config.smoothing_relaxation,
  ) {
    Ok(mesh) => (mesh, true),
    Err(err) => {
      tracing::warn!(%err, "smoothing failed, keeping unsmoothed surface");
      (raw, false)
    }
  };

  let mut holes_filled = 0;
  let mut watertight = topology::is_watertight(&mesh);
  if !watertight {
    holes_filled = topology::fill_holes(&mut mesh);
    watertight = topology::is_watertight(&mesh);
    if !watertight {
      tracing::warn!(holes_filled, "volumetric surface is not closed after repair");
    }
  }

  tracing::info!(
    vertices = mesh.vertex_count(),
    triangles = mesh.triangle_count(),
    watertight,
    elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
    "reconstructed surface"
  );

  Ok(Reconstruction {
    mesh,
    voxel_size,
    grid_dims: grid.dims,
    smoothed,
    vertices_split,
    holes_filled,
    watertight,
  })
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
