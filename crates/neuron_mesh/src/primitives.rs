//! Closed primitive meshes.
//!
//! Icospheres are built by recursive midpoint subdivision of a regular
//! icosahedron. Level `n` has `20 * 4^n` triangles and `10 * 4^n + 2`
//! vertices: level 2 = 320 faces, level 3 = 1280 faces, level 5 = 20480
//! faces.

use std::collections::HashMap;

use glam::Vec3;

use crate::mesh::Mesh;

/// Icosahedron vertices (unnormalized, golden ratio layout).
const ICOSAHEDRON_VERTICES: [[f32; 3]; 12] = {
  const T: f32 = 1.618_034;
  [
    [-1.0, T, 0.0],
    [1.0, T, 0.0],
    [-1.0, -T, 0.0],
    [1.0, -T, 0.0],
    [0.0, -1.0, T],
    [0.0, 1.0, T],
    [0.0, -1.0, -T],
    [0.0, 1.0, -T],
    [T, 0.0, -1.0],
    [T, 0.0, 1.0],
    [-T, 0.0, -1.0],
    [-T, 0.0, 1.0],
  ]
};

/// Icosahedron faces, counter-clockwise seen from outside.
const ICOSAHEDRON_FACES: [[u32; 3]; 20] = [
  [0, 11, 5],
  [0, 5, 1],
  [0, 1, 7],
  [0, 7, 10],
  [0, 10, 11],
  [1, 5, 9],
  [5, 11, 4],
  [11, 10, 2],
  [10, 7, 6],
  [7, 1, 8],
  [3, 9, 4],
  [3, 4, 2],
  [3, 2, 6],
  [3, 6, 8],
  [3, 8, 9],
  [4, 9, 5],
  [2, 4, 11],
  [6, 2, 10],
  [8, 6, 7],
  [9, 8, 1],
];

/// Vertex count of an icosphere at the given subdivision level.
pub const fn icosphere_vertex_count(subdivisions: u32) -> usize {
  10 * 4usize.pow(subdivisions) + 2
}

/// Triangle count of an icosphere at the given subdivision level.
pub const fn icosphere_triangle_count(subdivisions: u32) -> usize {
  20 * 4usize.pow(subdivisions)
}

/// Closed sphere approximation centered at `center`.
///
/// Output is deterministic: vertex order depends only on `subdivisions`.
pub fn icosphere(center: Vec3, radius: f32, subdivisions: u32) -> Mesh {
  let mut directions: Vec<Vec3> = ICOSAHEDRON_VERTICES
    .iter()
    .map(|&v| Vec3::from_array(v).normalize())
    .collect();
  let mut faces = ICOSAHEDRON_FACES.to_vec();

  for _ in 0..subdivisions {
    let mut midpoints: HashMap<(u32, u32), u32> = HashMap::with_capacity(faces.len() * 3 / 2);
    let mut midpoint = |a: u32, b: u32, directions: &mut Vec<Vec3>| -> u32 {
      let key = (a.min(b), a.max(b));
      *midpoints.entry(key).or_insert_with(|| {
        let mid = (directions[a as usize] + directions[b as usize]).normalize();
        directions.push(mid);
        (directions.len() - 1) as u32
      })
    };

    let mut subdivided = Vec::with_capacity(faces.len() * 4);
    for &[a, b, c] in &faces {
      let ab = midpoint(a, b, &mut directions);
      let bc = midpoint(b, c, &mut directions);
      let ca = midpoint(c, a, &mut directions);
      subdivided.extend_from_slice(&[[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]);
    }
    faces = subdivided;
  }

  let mut mesh = Mesh::with_capacity(directions.len(), faces.len());
  for direction in directions {
    mesh.push_vertex(center + direction * radius);
  }
  for [a, b, c] in faces {
    mesh.push_triangle(a, b, c);
  }
  mesh
}

#[cfg(test)]
#[path = "primitives_test.rs"]
mod primitives_test;
