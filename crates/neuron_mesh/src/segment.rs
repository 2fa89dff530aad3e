//! Tapered tube (frustum) between two nodes.
//!
//! # Vertex layout
//!
//! ```text
//! index 0              start center (cap apex)
//! index 1..=S          start ring, radius r(a)
//! index S+1            end center (cap apex)
//! index S+2..=2S+1     end ring, radius r(b)
//! ```
//!
//! # Faces per section i (4 per section, 4S total)
//!
//! ```text
//!   end ring     e_i ────── e_i+1
//!                 │ ╲   B    │
//!                 │   ╲      │       A, B: lateral quad split
//!                 │  A  ╲    │       start cap fan: (apex_a, s_i+1, s_i)
//!   start ring   s_i ────── s_i+1    end cap fan:   (apex_b, e_i, e_i+1)
//! ```
//!
//! Ring points advance counter-clockwise around the axis, so every face winds
//! outward: lateral normals point away from the axis, the start cap faces
//! `-axis`, the end cap faces `+axis`.

use std::f32::consts::TAU;

use glam::Vec3;

use crate::config::SegmentConfig;
use crate::mesh::Mesh;
use crate::morphology::Node;
use crate::primitives::icosphere;

/// Vertex count of a non-degenerate frustum.
pub const fn frustum_vertex_count(sides: usize) -> usize {
  2 * sides + 2
}

/// Triangle count of a non-degenerate frustum.
pub const fn frustum_triangle_count(sides: usize) -> usize {
  4 * sides
}

/// Two unit vectors orthogonal to `axis` and to each other.
///
/// `perp1 x perp2 == axis`, so angles measured from `perp1` towards `perp2`
/// turn counter-clockwise around the axis.
pub fn perpendicular_basis(axis: Vec3) -> (Vec3, Vec3) {
  let reference = if axis.x.abs() > 0.99 || axis.y.abs() > 0.99 {
    Vec3::Z
  } else {
    Vec3::X
  };
  let perp1 = axis.cross(reference).normalize();
  let perp2 = axis.cross(perp1);
  (perp1, perp2)
}

/// Closed tube from `a` to `b` with `sides` sections.
///
/// `sides` overrides `config.sides`; only the tolerance and fallback
/// subdivision level are read from `config`.
///
/// Coincident centers have no axis; a small icosphere of the mean radius is
/// returned in that case instead of a degenerate tube.
pub fn build_frustum(a: &Node, b: &Node, sides: usize, config: &SegmentConfig) -> Mesh {
  let axis = b.position - a.position;
  let length = axis.length();

  if length < config.degeneracy_tolerance || sides < 3 {
    tracing::warn!(
      from = a.id,
      to = b.id,
      length,
      sides,
      "degenerate segment, substituting sphere"
    );
    return icosphere(
      a.position,
      (a.radius + b.radius) * 0.5,
      config.degenerate_subdivisions,
    );
  }

  let axis = axis / length;
  let (perp1, perp2) = perpendicular_basis(axis);
  let ring: Vec<Vec3> = (0..sides)
    .map(|i| {
      let angle = TAU * i as f32 / sides as f32;
      angle.cos() * perp1 + angle.sin() * perp2
    })
    .collect();

  let mut mesh = Mesh::with_capacity(frustum_vertex_count(sides), frustum_triangle_count(sides));

  let start_apex = mesh.push_vertex(a.position);
  for &direction in &ring {
    mesh.push_vertex(a.position + direction * a.radius);
  }
  let end_apex = mesh.push_vertex(b.position);
  for &direction in &ring {
    mesh.push_vertex(b.position + direction * b.radius);
  }

  let start_ring = start_apex + 1;
  let end_ring = end_apex + 1;
  let sides = sides as u32;
  for i in 0..sides {
    let next = (i + 1) % sides;
    let s0 = start_ring + i;
    let s1 = start_ring + next;
    let e0 = end_ring + i;
    let e1 = end_ring + next;

    mesh.push_triangle(s0, s1, e0);
    mesh.push_triangle(s1, e1, e0);
    mesh.push_triangle(start_apex, s1, s0);
    mesh.push_triangle(end_apex, e0, e1);
  }

  mesh
}

#[cfg(test)]
#[path = "segment_test.rs"]
mod segment_test;
