//! Edge topology queries and repair.
//!
//! A mesh is watertight when every directed edge `a -> b` occurs exactly once
//! and is matched by exactly one opposite edge `b -> a`. That implies no
//! boundary, no non-manifold edges and consistent winding.

use std::collections::{BTreeMap, HashMap};

use glam::Vec3;
use smallvec::SmallVec;

use super::Mesh;

/// Per-vertex neighbour lists; a surface vertex typically has about six.
pub type Neighbors = Vec<SmallVec<[u32; 8]>>;

/// Counts of directed edges.
fn directed_edges(mesh: &Mesh) -> HashMap<(u32, u32), u32> {
  let mut edges = HashMap::with_capacity(mesh.indices.len());
  for [a, b, c] in mesh.triangles() {
    for edge in [(a, b), (b, c), (c, a)] {
      *edges.entry(edge).or_insert(0) += 1;
    }
  }
  edges
}

/// Directed edges with no opposite partner, sorted.
pub fn boundary_edges(mesh: &Mesh) -> Vec<(u32, u32)> {
  let edges = directed_edges(mesh);
  let mut boundary: Vec<(u32, u32)> = edges
    .keys()
    .filter(|&&(a, b)| !edges.contains_key(&(b, a)))
    .copied()
    .collect();
  boundary.sort_unstable();
  boundary
}

/// True if the mesh encloses a volume with consistent winding.
pub fn is_watertight(mesh: &Mesh) -> bool {
  if mesh.is_empty() {
    return false;
  }
  let edges = directed_edges(mesh);
  edges
    .iter()
    .all(|(&(a, b), &count)| count == 1 && edges.get(&(b, a)) == Some(&1))
}

/// Vertex adjacency derived from triangle edges, sorted and deduplicated.
pub fn vertex_neighbors(mesh: &Mesh) -> Neighbors {
  let mut neighbors: Neighbors = vec![SmallVec::new(); mesh.vertices.len()];
  for [a, b, c] in mesh.triangles() {
    for (from, to) in [(a, b), (b, c), (c, a)] {
      neighbors[from as usize].push(to);
      neighbors[to as usize].push(from);
    }
  }
  for list in &mut neighbors {
    list.sort_unstable();
    list.dedup();
  }
  neighbors
}

fn remove_face_edges(edges: &mut HashMap<(u32, u32), u32>, [a, b, c]: [u32; 3]) {
  for edge in [(a, b), (b, c), (c, a)] {
    if let Some(count) = edges.get_mut(&edge) {
      *count -= 1;
      if *count == 0 {
        edges.remove(&edge);
      }
    }
  }
}

fn add_face_edges(edges: &mut HashMap<(u32, u32), u32>, [a, b, c]: [u32; 3]) {
  for edge in [(a, b), (b, c), (c, a)] {
    *edges.entry(edge).or_insert(0) += 1;
  }
}

fn face(mesh: &Mesh, f: u32) -> [u32; 3] {
  let i = f as usize * 3;
  [mesh.indices[i], mesh.indices[i + 1], mesh.indices[i + 2]]
}

fn is_manifold_edge(edges: &HashMap<(u32, u32), u32>, v: u32, w: u32) -> bool {
  edges.get(&(v, w)) == Some(&1) && edges.get(&(w, v)) == Some(&1)
}

fn find_root(parent: &mut [usize], mut i: usize) -> usize {
  while parent[i] != i {
    parent[i] = parent[parent[i]];
    i = parent[i];
  }
  i
}

/// Give every vertex a single edge-connected fan of faces.
///
/// Faces around `v` count as neighbours across `v - w` only when that edge
/// is manifold: one `v -> w` and one `w -> v`. Each fan component after the
/// first gets its own copy of `v` at the same position. Sheets that touch
/// along an edge (four faces on one edge) or at a single vertex come apart,
/// leaving one consistent pair of faces per edge.
///
/// Returns the number of vertices added.
pub fn split_nonmanifold(mesh: &mut Mesh) -> usize {
  let mut edges = directed_edges(mesh);
  let mut incident: Vec<SmallVec<[u32; 8]>> = vec![SmallVec::new(); mesh.vertices.len()];
  for (f, triangle) in mesh.triangles().enumerate() {
    for vertex in triangle {
      incident[vertex as usize].push(f as u32);
    }
  }

  let mut added = 0;
  for v in 0..incident.len() {
    let faces = &mut incident[v];
    faces.sort_unstable();
    faces.dedup();
    if faces.len() < 2 {
      continue;
    }
    let v = v as u32;

    // Faces of the fan grouped by the other vertex they share with `v`.
    let mut by_neighbor: BTreeMap<u32, SmallVec<[usize; 4]>> = BTreeMap::new();
    for (local, &f) in faces.iter().enumerate() {
      for w in face(mesh, f) {
        if w != v {
          by_neighbor.entry(w).or_default().push(local);
        }
      }
    }

    let mut parent: Vec<usize> = (0..faces.len()).collect();
    for (&w, locals) in &by_neighbor {
      if !is_manifold_edge(&edges, v, w) {
        continue;
      }
      for pair in locals.windows(2) {
        let (a, b) = (find_root(&mut parent, pair[0]), find_root(&mut parent, pair[1]));
        if a != b {
          parent[a.max(b)] = a.min(b);
        }
      }
    }

    // Face ids are sorted, so the component holding the lowest face keeps `v`.
    let mut components: BTreeMap<usize, SmallVec<[u32; 8]>> = BTreeMap::new();
    for (local, &f) in faces.iter().enumerate() {
      let root = find_root(&mut parent, local);
      components.entry(root).or_default().push(f);
    }
    if components.len() < 2 {
      continue;
    }

    let position = mesh.position(v);
    for component in components.into_values().skip(1) {
      let copy = mesh.push_vertex(position);
      added += 1;
      for f in component {
        let before = face(mesh, f);
        remove_face_edges(&mut edges, before);
        let after = before.map(|index| if index == v { copy } else { index });
        let start = f as usize * 3;
        mesh.indices[start..start + 3].copy_from_slice(&after);
        add_face_edges(&mut edges, after);
      }
    }
  }

  added
}

/// Closed chains of boundary edges, each as an ordered vertex list.
///
/// Chains that cannot be closed (dangling boundary at non-manifold vertices)
/// are dropped.
pub fn boundary_loops(mesh: &Mesh) -> Vec<Vec<u32>> {
  let mut next: BTreeMap<u32, SmallVec<[u32; 2]>> = BTreeMap::new();
  for (a, b) in boundary_edges(mesh) {
    next.entry(a).or_default().push(b);
  }

  let mut loops = Vec::new();
  while let Some(start) = next.first_key_value().map(|(&key, _)| key) {
    let mut chain = vec![start];
    let mut current = start;
    let closed = loop {
      let Some(outgoing) = next.get_mut(&current) else {
        break false;
      };
      let Some(to) = outgoing.pop() else {
        break false;
      };
      if outgoing.is_empty() {
        next.remove(&current);
      }
      if to == start {
        break true;
      }
      chain.push(to);
      current = to;
    };

    if closed && chain.len() >= 3 {
      loops.push(chain);
    }
  }
  loops
}

/// Close every boundary loop. Returns the number of loops filled.
///
/// Triangular holes get a single triangle; larger ones a fan around a new
/// centroid vertex. New triangles run opposite to the boundary edges so the
/// winding stays consistent.
pub fn fill_holes(mesh: &mut Mesh) -> usize {
  let loops = boundary_loops(mesh);

  for chain in &loops {
    if let [a, b, c] = chain.as_slice() {
      mesh.push_triangle(*a, *c, *b);
      continue;
    }

    let centroid = chain
      .iter()
      .map(|&index| mesh.position(index))
      .sum::<Vec3>()
      / chain.len() as f32;
    let center = mesh.push_vertex(centroid);

    for (i, &a) in chain.iter().enumerate() {
      let b = chain[(i + 1) % chain.len()];
      mesh.push_triangle(b, a, center);
    }
  }

  loops.len()
}

#[cfg(test)]
#[path = "topology_test.rs"]
mod topology_test;
