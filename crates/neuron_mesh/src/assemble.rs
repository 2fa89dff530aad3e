//! Analytic strategy: spheres at nodes, frustums along edges.
//!
//! Walks the tree in canonical pre-order and appends, per visited node, an
//! icosphere (plus the frustum to its parent for non-root nodes) to one
//! running mesh. The result is a non-welded polygon soup: overlaps between
//! primitives are kept as-is.

use crate::config::SegmentConfig;
use crate::mesh::Mesh;
use crate::morphology::{MorphologyTree, Node};
use crate::primitives::{icosphere, icosphere_triangle_count, icosphere_vertex_count};
use crate::segment::{build_frustum, frustum_triangle_count, frustum_vertex_count};

/// Counts of primitives emitted by [`assemble`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssemblyStats {
  pub spheres: usize,
  pub frustums: usize,
  /// Frustums replaced by a sphere because their end centers coincide.
  pub degenerate_segments: usize,
}

/// Assemble the whole tree into one mesh.
pub fn assemble(tree: &MorphologyTree, config: &SegmentConfig) -> Mesh {
  assemble_with_stats(tree, config).0
}

/// [`assemble`], also reporting how many primitives were emitted.
pub fn assemble_with_stats(tree: &MorphologyTree, config: &SegmentConfig) -> (Mesh, AssemblyStats) {
  let _span = tracing::info_span!("assemble", nodes = tree.len()).entered();

  let sphere_vertices = icosphere_vertex_count(config.sphere_subdivisions);
  let sphere_triangles = icosphere_triangle_count(config.sphere_subdivisions);
  let edges = tree.len().saturating_sub(1);
  let mut mesh = Mesh::with_capacity(
    tree.len() * sphere_vertices + edges * frustum_vertex_count(config.sides),
    tree.len() * sphere_triangles + edges * frustum_triangle_count(config.sides),
  );
  let mut stats = AssemblyStats::default();

  for visit in tree.preorder() {
    if let Some(parent) = visit.parent {
      if is_degenerate(parent, visit.node, config) {
        stats.degenerate_segments += 1;
      }
      mesh.append(&build_frustum(parent, visit.node, config.sides, config));
      stats.frustums += 1;
    }
    mesh.append(&node_sphere(visit.node, config));
    stats.spheres += 1;
  }

  tracing::info!(
    spheres = stats.spheres,
    frustums = stats.frustums,
    degenerate = stats.degenerate_segments,
    vertices = mesh.vertex_count(),
    triangles = mesh.triangle_count(),
    "assembled analytic mesh"
  );

  (mesh, stats)
}

/// Sphere primitive for one node.
pub fn node_sphere(node: &Node, config: &SegmentConfig) -> Mesh {
  icosphere(node.position, node.radius, config.sphere_subdivisions)
}

fn is_degenerate(a: &Node, b: &Node, config: &SegmentConfig) -> bool {
  (b.position - a.position).length() < config.degeneracy_tolerance
}

#[cfg(test)]
#[path = "assemble_test.rs"]
mod assemble_test;
