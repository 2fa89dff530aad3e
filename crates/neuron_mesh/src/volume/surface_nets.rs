//! Naive Surface Nets over an [`SdfGrid`] of arbitrary size.
//!
//! One vertex per cell whose corners change sign, placed at the centroid of
//! the edge crossings. For every sign-changing edge leaving corner 0 of a
//! cell, the four cells sharing that edge are joined into a quad, split along
//! its shorter diagonal.
//!
//! ```text
//! Cell corner indices (binary: ZYX):
//!   0 = (0,0,0)    4 = (0,0,1)
//!   1 = (1,0,0)    5 = (1,0,1)
//!   2 = (0,1,0)    6 = (0,1,1)
//!   3 = (1,1,0)    7 = (1,1,1)
//! ```
//!
//! Negative samples are solid; faces wind counter-clockwise seen from the
//! air side.

use glam::Vec3A;

use super::grid::{sdf_conversion, SdfGrid};
use crate::mesh::Mesh;

/// Corner positions within the unit cell, indexed by corner bits.
const CORNER_POSITIONS: [Vec3A; 8] = [
  Vec3A::new(0.0, 0.0, 0.0),
  Vec3A::new(1.0, 0.0, 0.0),
  Vec3A::new(0.0, 1.0, 0.0),
  Vec3A::new(1.0, 1.0, 0.0),
  Vec3A::new(0.0, 0.0, 1.0),
  Vec3A::new(1.0, 0.0, 1.0),
  Vec3A::new(0.0, 1.0, 1.0),
  Vec3A::new(1.0, 1.0, 1.0),
];

/// The 12 cell edges as corner pairs. Edges 0, 1, 2 leave corner 0 along X, Y, Z.
const CUBE_EDGES: [[usize; 2]; 12] = [
  [0, 1],
  [0, 2],
  [0, 4],
  [1, 3],
  [1, 5],
  [2, 3],
  [2, 6],
  [3, 7],
  [4, 5],
  [4, 6],
  [5, 7],
  [6, 7],
];

/// Sample offsets `(dx, dy, dz)` of the 8 corners.
const CORNER_OFFSETS: [[usize; 3]; 8] = [
  [0, 0, 0],
  [1, 0, 0],
  [0, 1, 0],
  [1, 1, 0],
  [0, 0, 1],
  [1, 0, 1],
  [0, 1, 1],
  [1, 1, 1],
];

const NO_VERTEX: u32 = u32::MAX;

/// Vertex indices of the current and previous x-slab of cells.
///
/// Quads only ever reach back one cell along x, so two slabs suffice.
struct IndexBuffer {
  slabs: [Vec<u32>; 2],
  stride: usize,
}

impl IndexBuffer {
  fn new(cells_y: usize, cells_z: usize) -> Self {
    let len = cells_y * cells_z;
    Self {
      slabs: [vec![NO_VERTEX; len], vec![NO_VERTEX; len]],
      stride: cells_z,
    }
  }

  /// Forget slab `x` before refilling it.
  fn begin_slab(&mut self, x: usize) {
    self.slabs[x & 1].fill(NO_VERTEX);
  }

  #[inline]
  fn get(&self, [x, y, z]: [usize; 3]) -> u32 {
    self.slabs[x & 1][y * self.stride + z]
  }

  #[inline]
  fn set(&mut self, [x, y, z]: [usize; 3], value: u32) {
    self.slabs[x & 1][y * self.stride + z] = value;
  }
}

/// Bit `i` set when corner `i` is solid.
#[inline]
fn corner_mask(samples: &[i8; 8]) -> u8 {
  samples
    .iter()
    .enumerate()
    .fold(0u8, |mask, (i, &s)| mask | (((s < 0) as u8) << i))
}

/// Centroid of edge zero-crossings, in cell-local coordinates.
#[inline]
fn centroid(samples: &[f32; 8]) -> Vec3A {
  let mut sum = Vec3A::ZERO;
  let mut count = 0u32;

  for &[c0, c1] in &CUBE_EDGES {
    let s0 = samples[c0];
    let s1 = samples[c1];
    if (s0 < 0.0) != (s1 < 0.0) {
      let t = s0 / (s0 - s1);
      let p0 = CORNER_POSITIONS[c0];
      sum += p0 + t * (CORNER_POSITIONS[c1] - p0);
      count += 1;
    }
  }

  if count == 0 {
    return Vec3A::splat(0.5);
  }
  sum / count as f32
}

/// Extract the zero isosurface of `grid` in world coordinates.
pub fn extract(grid: &SdfGrid) -> Mesh {
  let [nx, ny, nz] = grid.dims;
  let mut mesh = Mesh::new();
  if nx < 2 || ny < 2 || nz < 2 {
    return mesh;
  }

  let cells = [nx - 1, ny - 1, nz - 1];
  let mut index_buffer = IndexBuffer::new(cells[1], cells[2]);
  let origin = Vec3A::from(grid.origin);

  for x in 0..cells[0] {
    index_buffer.begin_slab(x);
    for y in 0..cells[1] {
      for z in 0..cells[2] {
        let raw: [i8; 8] = std::array::from_fn(|i| {
          let [dx, dy, dz] = CORNER_OFFSETS[i];
          grid.get(x + dx, y + dy, z + dz)
        });
        let mask = corner_mask(&raw);
        if mask == 0 || mask == 255 {
          continue;
        }

        let samples = raw.map(sdf_conversion::to_float);
        let local = Vec3A::new(x as f32, y as f32, z as f32) + centroid(&samples);
        let vertex = mesh.push_vertex((origin + local * grid.voxel_size).into());
        index_buffer.set([x, y, z], vertex);

        emit_quads([x, y, z], mask, &index_buffer, &mut mesh);
      }
    }
  }

  mesh
}

/// Join the cells around each crossing edge at corner 0 into a quad.
fn emit_quads(pos: [usize; 3], mask: u8, index_buffer: &IndexBuffer, mesh: &mut Mesh) {
  let corner0_solid = mask & 1 != 0;
  // Flip if corner 0 is air.
  let flip = !corner0_solid;

  for axis in 0..3 {
    // Corner reached from corner 0 along `axis` is 1, 2 or 4.
    let far_solid = mask & (1 << (1 << axis)) != 0;
    if corner0_solid == far_solid {
      continue;
    }

    let u = (axis + 1) % 3;
    let v = (axis + 2) % 3;
    if pos[u] == 0 || pos[v] == 0 {
      continue;
    }

    let mut pos_b = pos;
    pos_b[u] -= 1;
    pos_b[v] -= 1;
    let mut pos_c = pos;
    pos_c[u] -= 1;
    let mut pos_d = pos;
    pos_d[v] -= 1;

    let v_a = index_buffer.get(pos);
    let v_b = index_buffer.get(pos_b);
    let v_c = index_buffer.get(pos_c);
    let v_d = index_buffer.get(pos_d);
    if [v_a, v_b, v_c, v_d].contains(&NO_VERTEX) {
      continue;
    }

    let diag_ab = mesh.position(v_a).distance_squared(mesh.position(v_b));
    let diag_cd = mesh.position(v_c).distance_squared(mesh.position(v_d));

    let triangles = match (diag_ab < diag_cd, flip) {
      (true, true) => [[v_a, v_d, v_b], [v_a, v_b, v_c]],
      (true, false) => [[v_a, v_b, v_d], [v_a, v_c, v_b]],
      (false, true) => [[v_c, v_d, v_b], [v_c, v_a, v_d]],
      (false, false) => [[v_c, v_b, v_d], [v_c, v_d, v_a]],
    };
    for [a, b, c] in triangles {
      mesh.push_triangle(a, b, c);
    }
  }
}

#[cfg(test)]
#[path = "surface_nets_test.rs"]
mod surface_nets_test;
