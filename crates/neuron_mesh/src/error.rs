//! Error taxonomy for the conversion pipeline.
//!
//! Structural errors (parse, topology) are never recovered. Geometric edge
//! cases local to one segment are recovered in place and only logged, so they
//! have no variant here.

use std::path::PathBuf;

use thiserror::Error;

/// Violations of the single-rooted tree invariants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
  #[error("trace contains no node records")]
  Empty,

  #[error("duplicate node id {0}")]
  DuplicateId(i64),

  #[error("no root node: every parent id resolves to an existing node")]
  NoRoot,

  #[error("expected exactly one root node, found several: {0:?}")]
  MultipleRoots(Vec<i64>),

  /// Nodes that cannot be reached from the root. With unique ids and a single
  /// root this only happens when the parent relation contains a cycle.
  #[error("nodes unreachable from the root (parent cycle): {0:?}")]
  Unreachable(Vec<i64>),
}

/// Failure to turn trace text into a [`crate::MorphologyTree`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
  #[error("malformed record on line {line}: {reason}: '{content}'")]
  MalformedRecord {
    line: usize,
    content: String,
    reason: String,
  },

  #[error("invalid topology: {0}")]
  InvalidTopology(#[from] TopologyError),
}

/// Failure of the volumetric reconstruction strategy.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReconstructionError {
  #[error("no primitives could be built from the morphology")]
  NoGeometry,

  #[error("morphology contains no node with a positive radius")]
  DegenerateInput,

  #[error("voxel size must be finite and positive, got {0}")]
  InvalidVoxelSize(f32),

  #[error("voxel grid {dims:?} exceeds the sample limit of {limit}")]
  GridTooLarge { dims: [usize; 3], limit: usize },

  #[error("isosurface extraction produced an empty surface")]
  EmptySurface,
}

/// Failure of a single decimation target. Fatal for the whole LOD batch.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecimationError {
  #[error("source mesh has no faces")]
  EmptyMesh,

  #[error("target face count must be positive")]
  ZeroTarget,

  #[error("face {face} references vertex {index} but mesh has {vertex_count} vertices")]
  InvalidIndex {
    face: usize,
    index: u32,
    vertex_count: usize,
  },

  #[error("decimation to {target} faces failed: {reason}")]
  Failed { target: usize, reason: String },
}

/// Failure to encode or decode the binary interchange container.
#[derive(Debug, Error)]
pub enum ExportError {
  #[error("cannot export a mesh without triangles")]
  EmptyMesh,

  #[error("malformed GLB container: {0}")]
  Malformed(String),

  #[error("glTF JSON chunk: {0}")]
  Json(#[from] serde_json::Error),
}

/// Failure reported by a storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("failed to store '{key}': {source}")]
  Io {
    key: String,
    #[source]
    source: std::io::Error,
  },
}

/// Failure to load or validate a [`crate::PipelineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse config TOML: {0}")]
  Parse(#[from] toml::de::Error),

  #[error("invalid config: {0}")]
  Invalid(String),
}

/// Any failure of an end-to-end conversion run.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Parse(#[from] ParseError),

  #[error(transparent)]
  Reconstruction(#[from] ReconstructionError),

  #[error(transparent)]
  Decimation(#[from] DecimationError),

  #[error(transparent)]
  Export(#[from] ExportError),

  #[error(transparent)]
  Store(#[from] StoreError),

  #[error(transparent)]
  Config(#[from] ConfigError),
}
