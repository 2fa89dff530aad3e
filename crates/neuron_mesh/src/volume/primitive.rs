//! Solid primitives rasterized by the volumetric strategy.
//!
//! Each node contributes a sphere, each parent -> child edge a capped cylinder
//! with the mean of the two radii. Primitives are evaluated as exact signed
//! distance functions (negative inside), so overlaps union cleanly in the
//! voxel grid.

use glam::Vec3;

use crate::config::VolumeConfig;
use crate::mesh::MinMaxAABB;
use crate::morphology::MorphologyTree;

/// One solid in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Primitive {
  Sphere { center: Vec3, radius: f32 },
  /// Cylinder from `start` to `end` with flat caps.
  Tube { start: Vec3, end: Vec3, radius: f32 },
}

impl Primitive {
  /// Signed distance from `point` to the primitive surface.
  #[inline]
  pub fn distance(&self, point: Vec3) -> f32 {
    match *self {
      Primitive::Sphere { center, radius } => (point - center).length() - radius,
      Primitive::Tube { start, end, radius } => capped_cylinder(point, start, end, radius),
    }
  }

  /// Tight axis-aligned bounds.
  pub fn bounds(&self) -> MinMaxAABB {
    match *self {
      Primitive::Sphere { center, radius } => MinMaxAABB::new(
        (center - Vec3::splat(radius)).to_array(),
        (center + Vec3::splat(radius)).to_array(),
      ),
      Primitive::Tube { start, end, radius } => {
        // Disc extent along each axis: r * sqrt(1 - axis_i^2).
        let axis = (end - start).normalize_or_zero();
        let extent = radius * (Vec3::ONE - axis * axis).max(Vec3::ZERO).powf(0.5);
        MinMaxAABB::new(
          (start.min(end) - extent).to_array(),
          (start.max(end) + extent).to_array(),
        )
      }
    }
  }
}

/// Exact distance to a flat-capped cylinder between `a` and `b`.
fn capped_cylinder(p: Vec3, a: Vec3, b: Vec3, r: f32) -> f32 {
  let ba = b - a;
  let pa = p - a;
  let baba = ba.dot(ba);
  let paba = pa.dot(ba);

  let x = (pa * baba - ba * paba).length() - r * baba;
  let y = (paba - baba * 0.5).abs() - baba * 0.5;
  let x2 = x * x;
  let y2 = y * y * baba;

  let d = if x.max(y) < 0.0 {
    -x2.min(y2)
  } else {
    (if x > 0.0 { x2 } else { 0.0 }) + (if y > 0.0 { y2 } else { 0.0 })
  };

  d.signum() * d.abs().sqrt() / baba
}

/// Primitive soup with counts of what was left out.
#[derive(Clone, Debug, Default)]
pub struct PrimitiveSoup {
  pub primitives: Vec<Primitive>,
  /// Nodes whose radius is too small for a sphere.
  pub skipped_spheres: usize,
  /// Edges whose mean radius is too small, or whose ends coincide.
  pub skipped_tubes: usize,
}

impl PrimitiveSoup {
  /// Union of all primitive bounds.
  pub fn bounds(&self) -> MinMaxAABB {
    let mut bounds = MinMaxAABB::empty();
    for primitive in &self.primitives {
      bounds.union(&primitive.bounds());
    }
    bounds
  }
}

/// Build spheres and tubes for the whole tree in canonical traversal order.
pub fn build_primitives(tree: &MorphologyTree, config: &VolumeConfig) -> PrimitiveSoup {
  let min_radius = config.min_primitive_radius;
  let mut soup = PrimitiveSoup::default();

  for visit in tree.preorder() {
    let node = visit.node;

    if let Some(parent) = visit.parent {
      let radius = (parent.radius + node.radius) * 0.5;
      let length = (node.position - parent.position).length();
      if radius <= min_radius {
        tracing::warn!(
          from = parent.id,
          to = node.id,
          radius,
          "skipping zero-radius segment"
        );
        soup.skipped_tubes += 1;
      } else if length <= min_radius {
        // The node sphere covers a zero-length segment.
        tracing::debug!(from = parent.id, to = node.id, "skipping coincident segment");
        soup.skipped_tubes += 1;
      } else {
        soup.primitives.push(Primitive::Tube {
          start: parent.position,
          end: node.position,
          radius,
        });
      }
    }

    if node.radius > min_radius {
      soup.primitives.push(Primitive::Sphere {
        center: node.position,
        radius: node.radius,
      });
    } else {
      soup.skipped_spheres += 1;
    }
  }

  soup
}

#[cfg(test)]
#[path = "primitive_test.rs"]
mod primitive_test;
