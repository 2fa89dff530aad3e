//! Triangle mesh value type shared by every stage.
//!
//! A [`Mesh`] is an indexed triangle list: a vertex position buffer and a flat
//! index buffer (3 indices per triangle, counter-clockwise when seen from
//! outside). Meshes are plain values. Concatenation appends buffers and offsets
//! indices without welding, so the result of an analytic assembly is a polygon
//! soup rather than a boolean union.

pub mod topology;

use glam::Vec3;

/// Axis-aligned bounding box.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinMaxAABB {
  pub min: [f32; 3],
  pub max: [f32; 3],
}

impl MinMaxAABB {
  /// Create AABB with inverted extents (ready for encapsulation).
  pub fn empty() -> Self {
    Self {
      min: [f32::INFINITY; 3],
      max: [f32::NEG_INFINITY; 3],
    }
  }

  /// Create AABB from min/max corners.
  pub fn new(min: [f32; 3], max: [f32; 3]) -> Self {
    Self { min, max }
  }

  /// Expand AABB to include a point.
  #[inline]
  pub fn encapsulate(&mut self, point: [f32; 3]) {
    for i in 0..3 {
      self.min[i] = self.min[i].min(point[i]);
      self.max[i] = self.max[i].max(point[i]);
    }
  }

  /// Expand AABB to include another box.
  pub fn union(&mut self, other: &MinMaxAABB) {
    if other.is_valid() {
      self.encapsulate(other.min);
      self.encapsulate(other.max);
    }
  }

  /// Grow every side by `margin`.
  pub fn expanded(&self, margin: f32) -> Self {
    Self {
      min: self.min.map(|v| v - margin),
      max: self.max.map(|v| v + margin),
    }
  }

  /// Check if AABB is valid (min <= max on all axes).
  pub fn is_valid(&self) -> bool {
    self.min[0] <= self.max[0] && self.min[1] <= self.max[1] && self.min[2] <= self.max[2]
  }

  pub fn size(&self) -> [f32; 3] {
    [
      self.max[0] - self.min[0],
      self.max[1] - self.min[1],
      self.max[2] - self.min[2],
    ]
  }
}

impl Default for MinMaxAABB {
  fn default() -> Self {
    Self::empty()
  }
}

/// Indexed triangle mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
  /// Vertex positions.
  pub vertices: Vec<[f32; 3]>,

  /// Triangle indices (3 indices per triangle).
  pub indices: Vec<u32>,
}

impl Mesh {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_capacity(vertices: usize, triangles: usize) -> Self {
    Self {
      vertices: Vec::with_capacity(vertices),
      indices: Vec::with_capacity(triangles * 3),
    }
  }

  /// Returns true if the mesh has no triangles.
  pub fn is_empty(&self) -> bool {
    self.indices.is_empty()
  }

  pub fn vertex_count(&self) -> usize {
    self.vertices.len()
  }

  /// Number of triangles in the mesh.
  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }

  /// Append a vertex, returning its index.
  #[inline]
  pub fn push_vertex(&mut self, position: Vec3) -> u32 {
    self.vertices.push(position.to_array());
    (self.vertices.len() - 1) as u32
  }

  #[inline]
  pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
    self.indices.extend_from_slice(&[a, b, c]);
  }

  #[inline]
  pub fn position(&self, index: u32) -> Vec3 {
    Vec3::from_array(self.vertices[index as usize])
  }

  /// Triangles as index triples.
  pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
    self.indices.chunks_exact(3).map(|tri| [tri[0], tri[1], tri[2]])
  }

  /// Unnormalized face normal (length = 2 * area).
  pub fn face_normal(&self, triangle: [u32; 3]) -> Vec3 {
    let [a, b, c] = triangle.map(|index| self.position(index));
    (b - a).cross(c - a)
  }

  /// Append `other`'s buffers, offsetting its indices. No vertex welding.
  pub fn append(&mut self, other: &Mesh) {
    let offset = self.vertices.len() as u32;
    self.vertices.extend_from_slice(&other.vertices);
    self
      .indices
      .extend(other.indices.iter().map(|&index| index + offset));
  }

  /// New mesh holding `self` followed by `other`.
  pub fn concat(&self, other: &Mesh) -> Mesh {
    let mut result = Mesh::with_capacity(
      self.vertex_count() + other.vertex_count(),
      self.triangle_count() + other.triangle_count(),
    );
    result.append(self);
    result.append(other);
    result
  }

  /// Bounding box of all vertices.
  pub fn bounds(&self) -> MinMaxAABB {
    let mut bounds = MinMaxAABB::empty();
    for &vertex in &self.vertices {
      bounds.encapsulate(vertex);
    }
    bounds
  }

  /// First triangle index that does not name a vertex, as (face, index).
  pub fn find_invalid_index(&self) -> Option<(usize, u32)> {
    let count = self.vertices.len();
    self
      .indices
      .iter()
      .position(|&index| index as usize >= count)
      .map(|position| (position / 3, self.indices[position]))
  }

  /// Signed volume enclosed by the triangles (positive for outward winding).
  pub fn signed_volume(&self) -> f32 {
    self
      .triangles()
      .map(|tri| {
        let [a, b, c] = tri.map(|index| self.position(index));
        a.dot(b.cross(c))
      })
      .sum::<f32>()
      / 6.0
  }
}
