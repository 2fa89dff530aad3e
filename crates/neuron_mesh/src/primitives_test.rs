use super::*;
use crate::mesh::topology::is_watertight;

#[test]
fn test_counts_per_level() {
  for level in 0..4 {
    let sphere = icosphere(Vec3::ZERO, 1.0, level);
    assert_eq!(sphere.vertex_count(), icosphere_vertex_count(level));
    assert_eq!(sphere.triangle_count(), icosphere_triangle_count(level));
  }
  assert_eq!(icosphere_triangle_count(3), 1280);
  assert_eq!(icosphere_vertex_count(3), 642);
}

#[test]
fn test_vertices_on_sphere() {
  let center = Vec3::new(3.0, -2.0, 7.5);
  let sphere = icosphere(center, 2.5, 2);

  for &vertex in &sphere.vertices {
    let distance = (Vec3::from_array(vertex) - center).length();
    assert!((distance - 2.5).abs() < 1e-4, "distance {distance}");
  }
}

#[test]
fn test_winding_is_outward() {
  let center = Vec3::new(1.0, 1.0, 1.0);
  let sphere = icosphere(center, 1.0, 2);

  for tri in sphere.triangles() {
    let normal = sphere.face_normal(tri);
    let centroid = tri.iter().map(|&i| sphere.position(i)).sum::<Vec3>() / 3.0;
    assert!(normal.dot(centroid - center) > 0.0);
  }
  assert!(sphere.signed_volume() > 0.0);
}

#[test]
fn test_closed_at_every_level() {
  for level in 0..4 {
    assert!(is_watertight(&icosphere(Vec3::ZERO, 1.0, level)));
  }
}

#[test]
fn test_deterministic() {
  let a = icosphere(Vec3::ONE, 0.5, 3);
  let b = icosphere(Vec3::ONE, 0.5, 3);
  assert_eq!(a, b);
}
