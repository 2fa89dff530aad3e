//! neuron_mesh - Neuron morphology to watertight mesh and LOD tiles
//!
//! Reads an SWC-style morphology trace (a tree of radius-tagged points),
//! turns it into a triangle mesh with one of two strategies, simplifies it
//! into a sequence of levels of detail, and serializes every level as a GLB
//! tile under a `lod_{N}/{base}.glb` key.
//!
//! # Strategies
//!
//! - **Analytic** ([`assemble()`]): an icosphere per node plus a capped
//!   frustum per edge, concatenated without welding. Fast and exact at the
//!   nodes, but the result is an overlapping soup.
//! - **Volumetric** ([`volume::reconstruct`]): the same solids rasterized
//!   into a signed distance grid, extracted with Surface Nets, smoothed and
//!   repaired. Always one surface, at the cost of fine detail.
//!
//! # Example
//!
//! ```ignore
//! use neuron_mesh::{convert, MemoryStore, PipelineConfig, Strategy};
//!
//! let text = std::fs::read_to_string("cell.swc")?;
//! let lods = convert(&text, &PipelineConfig::default(), Strategy::Analytic)?;
//!
//! let store = MemoryStore::new();
//! lods.publish(&store, "cell")?;
//! ```

pub mod assemble;
pub mod config;
pub mod error;
pub mod export;
pub mod lod;
pub mod mesh;
pub mod morphology;
pub mod pipeline;
pub mod primitives;
pub mod segment;
pub mod volume;

pub use assemble::{assemble, assemble_with_stats, AssemblyStats};
pub use config::{LodConfig, PipelineConfig, SegmentConfig, VolumeConfig};
pub use error::{
  ConfigError, DecimationError, ExportError, ParseError, PipelineError, ReconstructionError,
  StoreError, TopologyError,
};
pub use export::{base_name, export, DirectoryStore, MemoryStore, TileKey, TileStore};
pub use lod::generate_lods;
pub use mesh::{Mesh, MinMaxAABB};
pub use morphology::{MorphologyTree, Node};
pub use pipeline::{build_lod0, convert, convert_file, lods_from_glb, LodLevel, LodSequence, Strategy};
pub use primitives::icosphere;
pub use segment::build_frustum;
pub use volume::{reconstruct, Reconstruction};
