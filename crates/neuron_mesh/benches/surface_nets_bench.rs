//! Volumetric extraction benchmarks: rasterization and Surface Nets over
//! grids of increasing resolution.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use neuron_mesh::volume::{grid::SdfGrid, surface_nets, Primitive};

fn sphere() -> Primitive {
  Primitive::Sphere {
    center: Vec3::ZERO,
    radius: 10.0,
  }
}

/// Overlapping spheres and tubes, similar to a small dendrite fork.
fn fork() -> Vec<Primitive> {
  vec![
    Primitive::Sphere {
      center: Vec3::ZERO,
      radius: 6.0,
    },
    Primitive::Tube {
      start: Vec3::ZERO,
      end: Vec3::new(20.0, 0.0, 0.0),
      radius: 2.0,
    },
    Primitive::Tube {
      start: Vec3::new(20.0, 0.0, 0.0),
      end: Vec3::new(30.0, 10.0, 0.0),
      radius: 1.0,
    },
    Primitive::Tube {
      start: Vec3::new(20.0, 0.0, 0.0),
      end: Vec3::new(30.0, -10.0, 2.0),
      radius: 1.0,
    },
  ]
}

fn rasterized(primitives: &[Primitive], voxel_size: f32) -> SdfGrid {
  let mut bounds = primitives[0].bounds();
  for primitive in primitives {
    bounds.union(&primitive.bounds());
  }
  let mut grid = SdfGrid::covering(&bounds, voxel_size, 2, usize::MAX).unwrap();
  grid.rasterize(primitives);
  grid
}

/// Rasterization cost by voxel size.
fn bench_rasterize(c: &mut Criterion) {
  let mut group = c.benchmark_group("rasterize");
  let primitives = fork();

  for voxel_size in [1.0f32, 0.5, 0.25] {
    group.bench_with_input(
      BenchmarkId::new("fork", format!("voxel={voxel_size}")),
      &voxel_size,
      |b, &voxel_size| b.iter(|| rasterized(black_box(&primitives), voxel_size)),
    );
  }

  group.finish();
}

/// Surface extraction cost by voxel size.
fn bench_extract(c: &mut Criterion) {
  let mut group = c.benchmark_group("surface_nets");

  for voxel_size in [1.0f32, 0.5, 0.25] {
    let grid = rasterized(&[sphere()], voxel_size);
    group.bench_with_input(
      BenchmarkId::new("sphere", format!("dims={:?}", grid.dims)),
      &grid,
      |b, grid| b.iter(|| surface_nets::extract(black_box(grid))),
    );
  }

  let grid = rasterized(&fork(), 0.25);
  group.bench_function("fork (voxel=0.25)", |b| {
    b.iter(|| surface_nets::extract(black_box(&grid)))
  });

  group.finish();
}

criterion_group!(benches, bench_rasterize, bench_extract);
criterion_main!(benches);
