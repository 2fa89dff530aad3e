//! Level-of-detail generation.
//!
//! Each target is simplified independently from LOD 0, so the targets fan
//! out across the rayon pool with no shared state. The batch is
//! all-or-nothing: one failed target fails the whole call.

pub mod decimate;
pub mod quadric;

use rayon::prelude::*;
use web_time::Instant;

use crate::error::DecimationError;
use crate::mesh::Mesh;

pub use decimate::decimate;

/// One simplified mesh per entry of `target_faces`, in the same order.
///
/// Targets are advisory; the actual face count of each level is logged.
pub fn generate_lods(mesh0: &Mesh, target_faces: &[usize]) -> Result<Vec<Mesh>, DecimationError> {
  let _span = tracing::info_span!(
    "generate_lods",
    faces = mesh0.triangle_count(),
    levels = target_faces.len()
  )
  .entered();
  let start = Instant::now();

  decimate::validate(mesh0)?;
  if target_faces.contains(&0) {
    return Err(DecimationError::ZeroTarget);
  }

  let lods = target_faces
    .par_iter()
    .map(|&target| decimate(mesh0, target))
    .collect::<Result<Vec<_>, _>>()?;

  for (level, (target, mesh)) in target_faces.iter().zip(&lods).enumerate() {
    tracing::info!(
      level = level + 1,
      target,
      faces = mesh.triangle_count(),
      vertices = mesh.vertex_count(),
      "generated lod"
    );
  }
  tracing::debug!(
    elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
    "lod batch complete"
  );

  Ok(lods)
}
