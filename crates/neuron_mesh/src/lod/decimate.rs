//! Edge-collapse simplification driven by quadric error.
//!
//! Every vertex carries the quadric of its incident face planes. Edges are
//! collapsed cheapest first from a priority queue; an entry is stale once
//! either endpoint has changed since it was pushed, detected by per-vertex
//! version stamps. A collapse is rejected when it would make the surface
//! non-manifold (link condition), leave a vertex with fewer than three
//! neighbours, or flip an incident face.
//!
//! Output order is a function of the input alone: ties in cost break on
//! vertex indices and the surviving vertices and faces keep their relative
//! order.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use glam::DVec3;
use smallvec::SmallVec;

use super::quadric::Quadric;
use crate::error::DecimationError;
use crate::mesh::Mesh;

/// Extra weight of the planes that pin boundary edges in place.
const BOUNDARY_WEIGHT: f64 = 100.0;

/// Minimum cosine between a face normal before and after a collapse.
const MIN_NORMAL_COSINE: f64 = 0.2;

type FaceList = SmallVec<[u32; 8]>;
type VertexList = SmallVec<[u32; 16]>;

/// Reject input no decimation target can be produced from.
pub fn validate(mesh: &Mesh) -> Result<(), DecimationError> {
  if mesh.is_empty() {
    return Err(DecimationError::EmptyMesh);
  }
  if let Some((face, index)) = mesh.find_invalid_index() {
    return Err(DecimationError::InvalidIndex {
      face,
      index,
      vertex_count: mesh.vertex_count(),
    });
  }
  Ok(())
}

/// Simplify `mesh` towards `target_faces` triangles.
///
/// The target is advisory: simplification stops early when no valid
/// collapse remains. A mesh already at or below the target is returned with
/// only unreferenced vertices removed.
pub fn decimate(mesh: &Mesh, target_faces: usize) -> Result<Mesh, DecimationError> {
  validate(mesh)?;
  if target_faces == 0 {
    return Err(DecimationError::ZeroTarget);
  }
  if mesh.vertices.iter().flatten().any(|v| !v.is_finite()) {
    return Err(DecimationError::Failed {
      target: target_faces,
      reason: "non-finite vertex position".into(),
    });
  }

  let mut decimator = Decimator::new(mesh);
  if decimator.live_faces > target_faces {
    decimator.run(target_faces);
  }

  let result = decimator.into_mesh();
  if result.is_empty() {
    return Err(DecimationError::Failed {
      target: target_faces,
      reason: "simplification removed every face".into(),
    });
  }
  Ok(result)
}

/// Queued collapse of edge `(a, b)` into `position`.
#[derive(Clone, Copy, Debug)]
struct Candidate {
  cost: f64,
  a: u32,
  b: u32,
  position: DVec3,
  stamps: (u32, u32),
}

impl Ord for Candidate {
  fn cmp(&self, other: &Self) -> Ordering {
    self
      .cost
      .total_cmp(&other.cost)
      .then(self.a.cmp(&other.a))
      .then(self.b.cmp(&other.b))
  }
}

impl PartialOrd for Candidate {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl PartialEq for Candidate {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for Candidate {}

struct Decimator {
  positions: Vec<DVec3>,
  quadrics: Vec<Quadric>,
  stamps: Vec<u32>,
  faces: Vec<[u32; 3]>,
  face_alive: Vec<bool>,
  vertex_faces: Vec<FaceList>,
  heap: BinaryHeap<Reverse<Candidate>>,
  live_faces: usize,
}

impl Decimator {
  fn new(mesh: &Mesh) -> Self {
    let positions: Vec<DVec3> = mesh
      .vertices
      .iter()
      .map(|&v| DVec3::from_array(v.map(f64::from)))
      .collect();
    let faces: Vec<[u32; 3]> = mesh.triangles().collect();

    let mut vertex_faces = vec![FaceList::new(); positions.len()];
    let mut quadrics = vec![Quadric::ZERO; positions.len()];
    for (f, face) in faces.iter().enumerate() {
      for &v in face {
        vertex_faces[v as usize].push(f as u32);
      }

      let [p0, p1, p2] = face.map(|v| positions[v as usize]);
      let normal = (p1 - p0).cross(p2 - p0);
      let area = normal.length();
      if area > 0.0 {
        let plane = Quadric::from_point_normal(p0, normal / area, 1.0);
        for &v in face {
          quadrics[v as usize] += plane;
        }
      }
    }

    let mut decimator = Self {
      stamps: vec![0; positions.len()],
      face_alive: vec![true; faces.len()],
      live_faces: faces.len(),
      heap: BinaryHeap::with_capacity(faces.len() * 3 / 2),
      positions,
      quadrics,
      faces,
      vertex_faces,
    };
    decimator.constrain_boundaries();

    let mut edges: Vec<(u32, u32)> = decimator
      .faces
      .iter()
      .flat_map(|&[a, b, c]| [(a, b), (b, c), (c, a)])
      .filter(|&(a, b)| a != b)
      .map(|(a, b)| (a.min(b), a.max(b)))
      .collect();
    edges.sort_unstable();
    edges.dedup();
    for (a, b) in edges {
      decimator.push_candidate(a, b);
    }

    decimator
  }

  /// Add planes perpendicular to every boundary edge so open borders keep
  /// their shape.
  fn constrain_boundaries(&mut self) {
    let mut edge_uses: Vec<((u32, u32), usize)> = Vec::with_capacity(self.faces.len() * 3);
    for (f, &[a, b, c]) in self.faces.iter().enumerate() {
      for (from, to) in [(a, b), (b, c), (c, a)] {
        edge_uses.push(((from.min(to), from.max(to)), f));
      }
    }
    edge_uses.sort_unstable();

    let mut i = 0;
    while i < edge_uses.len() {
      let mut j = i + 1;
      while j < edge_uses.len() && edge_uses[j].0 == edge_uses[i].0 {
        j += 1;
      }
      if j - i == 1 {
        let ((a, b), f) = edge_uses[i];
        let [p0, p1, p2] = self.faces[f].map(|v| self.positions[v as usize]);
        let face_normal = (p1 - p0).cross(p2 - p0);
        let edge = self.positions[b as usize] - self.positions[a as usize];
        let normal = edge.cross(face_normal).normalize_or_zero();
        if normal != DVec3::ZERO {
          let plane = Quadric::from_point_normal(
            self.positions[a as usize],
            normal,
            BOUNDARY_WEIGHT * edge.length_squared(),
          );
          self.quadrics[a as usize] += plane;
          self.quadrics[b as usize] += plane;
        }
      }
      i = j;
    }
  }

  fn push_candidate(&mut self, a: u32, b: u32) {
    let q = self.quadrics[a as usize] + self.quadrics[b as usize];
    let pa = self.positions[a as usize];
    let pb = self.positions[b as usize];

    let (cost, position) = q
      .minimizer()
      .into_iter()
      .chain([(pa + pb) * 0.5, pa, pb])
      .map(|p| (q.evaluate(p).max(0.0), p))
      .min_by(|x, y| x.0.total_cmp(&y.0))
      .unwrap_or((0.0, pa));

    self.heap.push(Reverse(Candidate {
      cost,
      a,
      b,
      position,
      stamps: (self.stamps[a as usize], self.stamps[b as usize]),
    }));
  }

  fn run(&mut self, target_faces: usize) {
    while self.live_faces > target_faces {
      let Some(Reverse(candidate)) = self.heap.pop() else {
        break;
      };
      let current = (
        self.stamps[candidate.a as usize],
        self.stamps[candidate.b as usize],
      );
      if candidate.stamps != current {
        continue;
      }
      self.try_collapse(&candidate);
    }
  }

  /// Sorted, deduplicated vertices sharing a live face with `v`.
  fn neighbors(&self, v: u32) -> VertexList {
    let mut list: VertexList = self.vertex_faces[v as usize]
      .iter()
      .flat_map(|&f| self.faces[f as usize])
      .filter(|&n| n != v)
      .collect();
    list.sort_unstable();
    list.dedup();
    list
  }

  fn try_collapse(&mut self, candidate: &Candidate) -> bool {
    let (u, v) = (candidate.a, candidate.b);

    let shared: FaceList = self.vertex_faces[u as usize]
      .iter()
      .copied()
      .filter(|&f| self.faces[f as usize].contains(&v))
      .collect();
    if shared.is_empty() {
      return false;
    }

    // Link condition: the only common neighbours are the apexes of the
    // faces on the edge.
    let nu = self.neighbors(u);
    let nv = self.neighbors(v);
    let common: VertexList = nu.iter().copied().filter(|n| nv.contains(n)).collect();
    let mut apexes: VertexList = shared
      .iter()
      .flat_map(|&f| self.faces[f as usize])
      .filter(|&n| n != u && n != v)
      .collect();
    apexes.sort_unstable();
    apexes.dedup();
    if common != apexes {
      return false;
    }
    if nu.len() + nv.len() - common.len() < 5 {
      return false;
    }

    let target = candidate.position;
    for (vertex, other) in [(u, v), (v, u)] {
      for &f in &self.vertex_faces[vertex as usize] {
        let face = self.faces[f as usize];
        if face.contains(&other) {
          continue;
        }
        if self.flips(face, vertex, target) {
          return false;
        }
      }
    }

    self.apply(u, v, target, &shared);
    true
  }

  /// Would moving `vertex` of `face` to `target` flip or flatten it?
  fn flips(&self, face: [u32; 3], vertex: u32, target: DVec3) -> bool {
    let before = face.map(|i| self.positions[i as usize]);
    let after = face.map(|i| {
      if i == vertex {
        target
      } else {
        self.positions[i as usize]
      }
    });
    let n0 = (before[1] - before[0]).cross(before[2] - before[0]);
    let n1 = (after[1] - after[0]).cross(after[2] - after[0]);

    let l0 = n0.length();
    if l0 == 0.0 {
      // Already degenerate; nothing to flip.
      return false;
    }
    let l1 = n1.length();
    l1 <= f64::EPSILON * l0 || n0.dot(n1) < MIN_NORMAL_COSINE * l0 * l1
  }

  /// Merge `v` into `u` at `target`.
  fn apply(&mut self, u: u32, v: u32, target: DVec3, shared: &[u32]) {
    for &f in shared {
      self.face_alive[f as usize] = false;
      self.live_faces -= 1;
      for corner in self.faces[f as usize] {
        self.vertex_faces[corner as usize].retain(|&mut g| g != f);
      }
    }

    let moved = std::mem::take(&mut self.vertex_faces[v as usize]);
    for f in moved {
      for corner in &mut self.faces[f as usize] {
        if *corner == v {
          *corner = u;
        }
      }
      self.vertex_faces[u as usize].push(f);
    }

    self.positions[u as usize] = target;
    let absorbed = self.quadrics[v as usize];
    self.quadrics[u as usize] += absorbed;
    self.stamps[u as usize] += 1;
    self.stamps[v as usize] += 1;

    for n in self.neighbors(u) {
      self.push_candidate(u.min(n), u.max(n));
    }
  }

  /// Live faces over the vertices they reference, in input order.
  fn into_mesh(self) -> Mesh {
    let live: Vec<[u32; 3]> = self
      .faces
      .iter()
      .zip(&self.face_alive)
      .filter(|&(_, &alive)| alive)
      .map(|(&face, _)| face)
      .collect();

    let mut used = vec![false; self.positions.len()];
    for &v in live.iter().flatten() {
      used[v as usize] = true;
    }

    let mut remap = vec![u32::MAX; self.positions.len()];
    let mut mesh = Mesh::with_capacity(0, live.len());
    for (v, position) in self.positions.iter().enumerate() {
      if used[v] {
        remap[v] = mesh.push_vertex(position.as_vec3());
      }
    }
    for face in live {
      let [a, b, c] = face.map(|v| remap[v as usize]);
      mesh.push_triangle(a, b, c);
    }
    mesh
  }
}

#[cfg(test)]
#[path = "decimate_test.rs"]
mod decimate_test;
