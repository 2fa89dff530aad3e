//! End-to-end conversion: trace text -> LOD 0 -> LOD sequence -> tiles.
//!
//! ```text
//!  trace text ──parse──▶ MorphologyTree ──Strategy──▶ LOD 0 ──generate_lods──▶ LOD 1..N
//!                                                        │                         │
//!                                                        └────────── publish ◀─────┘
//! ```

use std::path::Path;

use web_time::Instant;

use crate::assemble::assemble;
use crate::config::{LodConfig, PipelineConfig};
use crate::error::{DecimationError, PipelineError, ReconstructionError};
use crate::export::{self, glb, TileKey, TileStore};
use crate::lod::generate_lods;
use crate::mesh::Mesh;
use crate::morphology::MorphologyTree;
use crate::volume::reconstruct;

/// How LOD 0 is built from the tree.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Strategy {
  /// Spheres and frustums concatenated into one soup.
  #[default]
  Analytic,
  /// Voxelized union, extracted as one closed surface.
  Volumetric {
    /// `None` derives the size from the smallest node radius.
    voxel_size: Option<f32>,
  },
}

/// Build the unsimplified mesh with the chosen strategy.
pub fn build_lod0(
  tree: &MorphologyTree,
  strategy: Strategy,
  config: &PipelineConfig,
) -> Result<Mesh, ReconstructionError> {
  match strategy {
    Strategy::Analytic => Ok(assemble(tree, &config.segment)),
    Strategy::Volumetric { voxel_size } => {
      reconstruct(tree, voxel_size, &config.volume).map(|result| result.mesh)
    }
  }
}

/// One entry of a [`LodSequence`].
#[derive(Clone, Debug, PartialEq)]
pub struct LodLevel {
  /// 0 is the unsimplified source.
  pub level: usize,
  /// Face target this level was decimated towards; `None` for level 0.
  pub target_faces: Option<usize>,
  pub mesh: Mesh,
}

/// LOD 0 followed by one simplified level per configured target.
#[derive(Clone, Debug, PartialEq)]
pub struct LodSequence {
  pub levels: Vec<LodLevel>,
}

impl LodSequence {
  /// Decimate `mesh0` to every target in `config`; all levels or none.
  pub fn generate(mesh0: Mesh, config: &LodConfig) -> Result<Self, DecimationError> {
    let simplified = generate_lods(&mesh0, &config.targets)?;

    let mut levels = Vec::with_capacity(simplified.len() + 1);
    levels.push(LodLevel {
      level: 0,
      target_faces: None,
      mesh: mesh0,
    });
    levels.extend(
      config
        .targets
        .iter()
        .zip(simplified)
        .enumerate()
        .map(|(i, (&target, mesh))| LodLevel {
          level: i + 1,
          target_faces: Some(target),
          mesh,
        }),
    );
    Ok(Self { levels })
  }

  pub fn len(&self) -> usize {
    self.levels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.levels.is_empty()
  }

  /// The unsimplified source, if present.
  pub fn lod0(&self) -> Option<&Mesh> {
    self.levels.first().map(|level| &level.mesh)
  }

  /// Encode and store every level under `lod_{N}/{base_name}.glb`.
  pub fn publish(&self, store: &dyn TileStore, base_name: &str) -> Result<Vec<TileKey>, PipelineError> {
    let meshes: Vec<&Mesh> = self.levels.iter().map(|level| &level.mesh).collect();
    export::publish(store, base_name, &meshes)
  }
}

/// Parse a trace and produce its full LOD sequence.
pub fn convert(
  text: &str,
  config: &PipelineConfig,
  strategy: Strategy,
) -> Result<LodSequence, PipelineError> {
  let _span = tracing::info_span!("convert", ?strategy).entered();

  let start = Instant::now();
  let tree = MorphologyTree::parse(text)?;
  tracing::info!(
    nodes = tree.len(),
    root = tree.root().id,
    elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
    "parsed morphology"
  );

  let start = Instant::now();
  let mesh0 = build_lod0(&tree, strategy, config)?;
  tracing::info!(
    vertices = mesh0.vertex_count(),
    triangles = mesh0.triangle_count(),
    elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
    "built lod 0"
  );

  Ok(LodSequence::generate(mesh0, &config.lod)?)
}

/// Convert the trace at `path` and publish it under the file's base name.
pub fn convert_file(
  path: &Path,
  config: &PipelineConfig,
  strategy: Strategy,
  store: &dyn TileStore,
) -> Result<Vec<TileKey>, PipelineError> {
  let text = std::fs::read_to_string(path).map_err(|source| PipelineError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  let sequence = convert(&text, config, strategy)?;
  sequence.publish(store, &export::base_name(path))
}

/// Take an existing GLB as LOD 0 and derive the rest of the sequence.
pub fn lods_from_glb(bytes: &[u8], config: &PipelineConfig) -> Result<LodSequence, PipelineError> {
  let _span = tracing::info_span!("lods_from_glb", bytes = bytes.len()).entered();

  let mesh0 = glb::decode(bytes)?;
  tracing::info!(
    vertices = mesh0.vertex_count(),
    triangles = mesh0.triangle_count(),
    "loaded lod 0"
  );
  Ok(LodSequence::generate(mesh0, &config.lod)?)
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;
