//! Laplacian relaxation of surface vertices.

use glam::Vec3;
use thiserror::Error;

use crate::mesh::topology::vertex_neighbors;
use crate::mesh::Mesh;

/// Smoothing failure. The caller keeps the unsmoothed surface.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SmoothingError {
  #[error("face {face} references a missing vertex")]
  InvalidIndex { face: usize },

  #[error("vertex {vertex} became non-finite after {iteration} iterations")]
  NonFinite { vertex: usize, iteration: usize },
}

/// Move each vertex `relaxation` of the way towards the mean of its
/// neighbours, `iterations` times. Topology is untouched.
///
/// Returns a new mesh; `mesh` is left as it was on failure.
pub fn laplacian(mesh: &Mesh, iterations: usize, relaxation: f32) -> Result<Mesh, SmoothingError> {
  if let Some((face, _)) = mesh.find_invalid_index() {
    return Err(SmoothingError::InvalidIndex { face });
  }

  let neighbors = vertex_neighbors(mesh);
  let mut current: Vec<Vec3> = mesh.vertices.iter().map(|&v| Vec3::from_array(v)).collect();
  let mut next = current.clone();

  for iteration in 1..=iterations {
    for (i, list) in neighbors.iter().enumerate() {
      if list.is_empty() {
        next[i] = current[i];
        continue;
      }
      let mean = list.iter().map(|&n| current[n as usize]).sum::<Vec3>() / list.len() as f32;
      next[i] = current[i] + (mean - current[i]) * relaxation;
    }
    std::mem::swap(&mut current, &mut next);

    if let Some(vertex) = current.iter().position(|p| !p.is_finite()) {
      return Err(SmoothingError::NonFinite { vertex, iteration });
    }
  }

  Ok(Mesh {
    vertices: current.iter().map(|v| v.to_array()).collect(),
    indices: mesh.indices.clone(),
  })
}

#[cfg(test)]
#[path = "smooth_test.rs"]
mod smooth_test;
