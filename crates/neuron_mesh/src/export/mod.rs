//! Tile export: GLB bytes under `lod_{N}/{base}.glb` keys.
//!
//! Persistence goes through the [`TileStore`] seam. [`publish`] serializes
//! every level before the first write, so an encoding failure never leaves a
//! partial LOD set behind.

pub mod glb;

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::{ExportError, PipelineError, StoreError};
use crate::mesh::Mesh;

/// Storage key of one tile.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileKey {
  pub lod: usize,
  pub base_name: String,
}

impl TileKey {
  pub fn new(lod: usize, base_name: impl Into<String>) -> Self {
    Self {
      lod,
      base_name: base_name.into(),
    }
  }
}

impl fmt::Display for TileKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "lod_{}/{}.glb", self.lod, self.base_name)
  }
}

/// Input file name without directories or extension.
///
/// `"traces/cell_01.swc"` gives `"cell_01"`. Falls back to the whole path
/// text when there is no file stem.
pub fn base_name(path: &Path) -> String {
  path
    .file_stem()
    .map(|stem| stem.to_string_lossy().into_owned())
    .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Serialize one LOD mesh. `lod_index` and `base_name` only label the log
/// record; see [`TileKey`] for the storage key.
pub fn export(mesh: &Mesh, lod_index: usize, base_name: &str) -> Result<Vec<u8>, ExportError> {
  let bytes = glb::encode(mesh)?;
  tracing::debug!(
    key = %TileKey::new(lod_index, base_name),
    bytes = bytes.len(),
    "encoded tile"
  );
  Ok(bytes)
}

/// Destination for finished tiles.
pub trait TileStore: Send + Sync {
  fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;
}

/// Writes tiles as files below a root directory.
#[derive(Clone, Debug)]
pub struct DirectoryStore {
  root: PathBuf,
}

impl DirectoryStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }
}

impl TileStore for DirectoryStore {
  fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
    let path = self.root.join(key);
    let io_err = |source| StoreError::Io {
      key: key.to_string(),
      source,
    };
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(&path, bytes).map_err(io_err)
  }
}

/// In-memory store, keyed in sorted order.
#[derive(Debug, Default)]
pub struct MemoryStore {
  tiles: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, key: &str) -> Option<Vec<u8>> {
    self
      .tiles
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .get(key)
      .cloned()
  }

  pub fn keys(&self) -> Vec<String> {
    self
      .tiles
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .keys()
      .cloned()
      .collect()
  }

  pub fn len(&self) -> usize {
    self.tiles.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl TileStore for MemoryStore {
  fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
    self
      .tiles
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(key.to_string(), bytes.to_vec());
    Ok(())
  }
}

/// Encode `levels[i]` as LOD `i` and hand every tile to `store`.
///
/// Returns the keys written, in level order.
pub fn publish(
  store: &dyn TileStore,
  base_name: &str,
  levels: &[&Mesh],
) -> Result<Vec<TileKey>, PipelineError> {
  let _span = tracing::info_span!("publish", base_name, levels = levels.len()).entered();

  let tiles = levels
    .iter()
    .enumerate()
    .map(|(lod, mesh)| Ok((TileKey::new(lod, base_name), export(mesh, lod, base_name)?)))
    .collect::<Result<Vec<_>, ExportError>>()?;

  let mut keys = Vec::with_capacity(tiles.len());
  for (key, bytes) in tiles {
    store.put(&key.to_string(), &bytes)?;
    tracing::info!(key = %key, bytes = bytes.len(), "published tile");
    keys.push(key);
  }
  Ok(keys)
}
