//! End-to-end benchmarks.
//!
//! Compares the two LOD 0 strategies on a synthetic branching morphology and
//! measures LOD fan-out on their outputs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use neuron_mesh::{
  build_lod0, convert, generate_lods, MorphologyTree, PipelineConfig, Strategy,
};

/// Binary tree of `depth` levels with tapering radii.
fn synthetic_trace(depth: u32) -> String {
  let mut text = String::from("# synthetic binary arbor\n1 1 0 0 0 4.0 -1\n");
  let mut next_id = 2;
  let mut frontier = vec![(1, [0.0f32, 0.0, 0.0], 4.0f32)];

  for level in 0..depth {
    let mut children = Vec::with_capacity(frontier.len() * 2);
    let length = 20.0 / (level + 1) as f32;
    for (parent, [x, y, z], radius) in frontier {
      for side in [-1.0f32, 1.0] {
        let position = [x + length, y + side * length * 0.5, z + side * level as f32];
        let r = (radius * 0.7).max(0.3);
        text.push_str(&format!(
          "{next_id} 3 {} {} {} {r} {parent}\n",
          position[0], position[1], position[2]
        ));
        children.push((next_id, position, r));
        next_id += 1;
      }
    }
    frontier = children;
  }

  text
}

fn bench_parse(c: &mut Criterion) {
  let text = synthetic_trace(10);
  c.bench_function("parse (2047 nodes)", |b| {
    b.iter(|| MorphologyTree::parse(black_box(&text)))
  });
}

fn bench_strategies(c: &mut Criterion) {
  let mut group = c.benchmark_group("lod0");
  group.sample_size(10);
  let config = PipelineConfig::default();

  for depth in [3u32, 5] {
    let tree = MorphologyTree::parse(&synthetic_trace(depth)).unwrap();
    group.bench_with_input(BenchmarkId::new("analytic", depth), &tree, |b, tree| {
      b.iter(|| build_lod0(black_box(tree), Strategy::Analytic, &config))
    });
    group.bench_with_input(BenchmarkId::new("volumetric", depth), &tree, |b, tree| {
      b.iter(|| {
        build_lod0(
          black_box(tree),
          Strategy::Volumetric {
            voxel_size: Some(0.5),
          },
          &config,
        )
      })
    });
  }

  group.finish();
}

fn bench_lods(c: &mut Criterion) {
  let mut group = c.benchmark_group("generate_lods");
  group.sample_size(10);
  let config = PipelineConfig::default();
  let tree = MorphologyTree::parse(&synthetic_trace(4)).unwrap();

  let analytic = build_lod0(&tree, Strategy::Analytic, &config).unwrap();
  group.bench_function(format!("analytic ({} faces)", analytic.triangle_count()), |b| {
    b.iter(|| generate_lods(black_box(&analytic), &config.lod.targets))
  });

  let volumetric = build_lod0(
    &tree,
    Strategy::Volumetric {
      voxel_size: Some(0.5),
    },
    &config,
  )
  .unwrap();
  group.bench_function(format!("volumetric ({} faces)", volumetric.triangle_count()), |b| {
    b.iter(|| generate_lods(black_box(&volumetric), &config.lod.targets))
  });

  group.finish();
}

fn bench_convert(c: &mut Criterion) {
  let mut group = c.benchmark_group("convert");
  group.sample_size(10);
  let text = synthetic_trace(4);
  let config = PipelineConfig::default();

  group.bench_function("analytic end-to-end", |b| {
    b.iter(|| convert(black_box(&text), &config, Strategy::Analytic))
  });

  group.finish();
}

criterion_group!(benches, bench_parse, bench_strategies, bench_lods, bench_convert);
criterion_main!(benches);
