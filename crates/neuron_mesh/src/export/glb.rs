//! Binary glTF 2.0 container holding one triangle mesh.
//!
//! ```text
//! ┌──────────────────────────┐
//! │ header   magic "glTF"    │  12 bytes: magic, version 2, total length
//! ├──────────────────────────┤
//! │ chunk 0  JSON            │  scene description, space padded to 4
//! ├──────────────────────────┤
//! │ chunk 1  BIN             │  positions (f32 x3), then indices (u32),
//! └──────────────────────────┘  zero padded to 4
//! ```
//!
//! The JSON document is modelled with serde structs that cover exactly the
//! subset written here, plus what is needed to read back index buffers of any
//! unsigned width.

use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::mesh::Mesh;

const MAGIC: u32 = 0x4654_6C67;
const VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;
const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

const COMPONENT_U8: u32 = 5121;
const COMPONENT_U16: u32 = 5123;
const COMPONENT_U32: u32 = 5125;
const COMPONENT_F32: u32 = 5126;
const TARGET_ARRAY_BUFFER: u32 = 34962;
const TARGET_ELEMENT_ARRAY_BUFFER: u32 = 34963;
const MODE_TRIANGLES: u32 = 4;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
  asset: Asset,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  scene: Option<usize>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  scenes: Vec<Scene>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  nodes: Vec<SceneNode>,
  #[serde(default)]
  meshes: Vec<MeshDesc>,
  #[serde(default)]
  buffers: Vec<Buffer>,
  #[serde(default)]
  buffer_views: Vec<BufferView>,
  #[serde(default)]
  accessors: Vec<Accessor>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Asset {
  version: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  generator: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Scene {
  nodes: Vec<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SceneNode {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  mesh: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MeshDesc {
  primitives: Vec<Primitive>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Primitive {
  attributes: Attributes,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  indices: Option<usize>,
  #[serde(default = "default_mode")]
  mode: u32,
}

fn default_mode() -> u32 {
  MODE_TRIANGLES
}

#[derive(Debug, Serialize, Deserialize)]
struct Attributes {
  #[serde(rename = "POSITION")]
  position: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Buffer {
  byte_length: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferView {
  buffer: usize,
  #[serde(default)]
  byte_offset: usize,
  byte_length: usize,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  byte_stride: Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  target: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Accessor {
  buffer_view: usize,
  #[serde(default)]
  byte_offset: usize,
  component_type: u32,
  count: usize,
  #[serde(rename = "type")]
  kind: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  min: Option<Vec<f32>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  max: Option<Vec<f32>>,
}

/// Round `len` up to a multiple of 4.
#[inline]
fn padded(len: usize) -> usize {
  (len + 3) & !3
}

/// Serialize `mesh` as a self-contained GLB file.
pub fn encode(mesh: &Mesh) -> Result<Vec<u8>, ExportError> {
  if mesh.is_empty() {
    return Err(ExportError::EmptyMesh);
  }
  if let Some((face, index)) = mesh.find_invalid_index() {
    return Err(ExportError::Malformed(format!(
      "face {face} references vertex {index} of {}",
      mesh.vertex_count()
    )));
  }

  let positions_len = mesh.vertices.len() * 12;
  let indices_len = mesh.indices.len() * 4;
  let mut bin = Vec::with_capacity(padded(positions_len + indices_len));
  for value in mesh.vertices.iter().flatten() {
    bin.extend_from_slice(&value.to_le_bytes());
  }
  for index in &mesh.indices {
    bin.extend_from_slice(&index.to_le_bytes());
  }
  let bin_len = bin.len();
  bin.resize(padded(bin_len), 0);

  let bounds = mesh.bounds();
  let document = Document {
    asset: Asset {
      version: "2.0".into(),
      generator: Some(concat!("neuron_mesh ", env!("CARGO_PKG_VERSION")).into()),
    },
    scene: Some(0),
    scenes: vec![Scene { nodes: vec![0] }],
    nodes: vec![SceneNode { mesh: Some(0) }],
    meshes: vec![MeshDesc {
      primitives: vec![Primitive {
        attributes: Attributes { position: 0 },
        indices: Some(1),
        mode: MODE_TRIANGLES,
      }],
    }],
    buffers: vec![Buffer {
      byte_length: bin_len,
    }],
    buffer_views: vec![
      BufferView {
        buffer: 0,
        byte_offset: 0,
        byte_length: positions_len,
        byte_stride: None,
        target: Some(TARGET_ARRAY_BUFFER),
      },
      BufferView {
        buffer: 0,
        byte_offset: positions_len,
        byte_length: indices_len,
        byte_stride: None,
        target: Some(TARGET_ELEMENT_ARRAY_BUFFER),
      },
    ],
    accessors: vec![
      Accessor {
        buffer_view: 0,
        byte_offset: 0,
        component_type: COMPONENT_F32,
        count: mesh.vertices.len(),
        kind: "VEC3".into(),
        min: Some(bounds.min.to_vec()),
        max: Some(bounds.max.to_vec()),
      },
      Accessor {
        buffer_view: 1,
        byte_offset: 0,
        component_type: COMPONENT_U32,
        count: mesh.indices.len(),
        kind: "SCALAR".into(),
        min: None,
        max: None,
      },
    ],
  };

  let mut json = serde_json::to_vec(&document)?;
  let json_len = padded(json.len());
  json.resize(json_len, b' ');

  let total = HEADER_LEN + CHUNK_HEADER_LEN + json_len + CHUNK_HEADER_LEN + bin.len();
  let mut out = Vec::with_capacity(total);
  for word in [MAGIC, VERSION, total as u32] {
    out.extend_from_slice(&word.to_le_bytes());
  }
  out.extend_from_slice(&(json_len as u32).to_le_bytes());
  out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
  out.extend_from_slice(&json);
  out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
  out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
  out.extend_from_slice(&bin);

  Ok(out)
}

/// Little-endian cursor over the container bytes.
struct Reader<'a> {
  bytes: &'a [u8],
  offset: usize,
}

impl<'a> Reader<'a> {
  fn u32(&mut self) -> Result<u32, ExportError> {
    let word = read_u32(self.bytes, self.offset)?;
    self.offset += 4;
    Ok(word)
  }

  fn take(&mut self, len: usize) -> Result<&'a [u8], ExportError> {
    let slice = self
      .offset
      .checked_add(len)
      .and_then(|end| self.bytes.get(self.offset..end))
      .ok_or_else(|| ExportError::Malformed(format!("chunk of {len} bytes runs past the end")))?;
    self.offset += len;
    Ok(slice)
  }
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, ExportError> {
  bytes
    .get(offset..offset + 4)
    .and_then(|b| b.try_into().ok())
    .map(u32::from_le_bytes)
    .ok_or_else(|| ExportError::Malformed(format!("truncated at byte {offset}")))
}

/// Parse the first triangle primitive of a GLB file.
pub fn decode(bytes: &[u8]) -> Result<Mesh, ExportError> {
  let mut reader = Reader { bytes, offset: 0 };
  if reader.u32()? != MAGIC {
    return Err(ExportError::Malformed("missing glTF magic".into()));
  }
  let version = reader.u32()?;
  if version != VERSION {
    return Err(ExportError::Malformed(format!("unsupported version {version}")));
  }
  let total = reader.u32()? as usize;
  if total > bytes.len() {
    return Err(ExportError::Malformed(format!(
      "header declares {total} bytes, got {}",
      bytes.len()
    )));
  }
  reader.bytes = &bytes[..total];

  let mut json = None;
  let mut bin: &[u8] = &[];
  while reader.offset < total {
    let len = reader.u32()? as usize;
    let kind = reader.u32()?;
    let data = reader.take(len)?;
    match kind {
      CHUNK_JSON => json = Some(data),
      CHUNK_BIN => bin = data,
      // Unknown chunks must be ignored.
      _ => {}
    }
  }

  let json = json.ok_or_else(|| ExportError::Malformed("no JSON chunk".into()))?;
  let document: Document = serde_json::from_slice(json)?;

  let primitive = document
    .meshes
    .first()
    .and_then(|mesh| mesh.primitives.first())
    .ok_or_else(|| ExportError::Malformed("no mesh primitive".into()))?;
  if primitive.mode != MODE_TRIANGLES {
    return Err(ExportError::Malformed(format!(
      "primitive mode {} is not triangles",
      primitive.mode
    )));
  }

  let positions = read_accessor(&document, bin, primitive.attributes.position)?;
  if positions.accessor.component_type != COMPONENT_F32 || positions.accessor.kind != "VEC3" {
    return Err(ExportError::Malformed("POSITION must be float VEC3".into()));
  }
  let mut mesh = Mesh::with_capacity(positions.accessor.count, 0);
  for i in 0..positions.accessor.count {
    let element = positions.element(i, 12)?;
    let mut xyz = [0.0f32; 3];
    for (axis, value) in xyz.iter_mut().enumerate() {
      *value = f32::from_bits(read_u32(element, axis * 4)?);
    }
    mesh.vertices.push(xyz);
  }

  match primitive.indices {
    Some(accessor) => {
      let indices = read_accessor(&document, bin, accessor)?;
      let width = match indices.accessor.component_type {
        COMPONENT_U8 => 1,
        COMPONENT_U16 => 2,
        COMPONENT_U32 => 4,
        other => {
          return Err(ExportError::Malformed(format!(
            "unsupported index component type {other}"
          )))
        }
      };
      mesh.indices.reserve(indices.accessor.count);
      for i in 0..indices.accessor.count {
        let element = indices.element(i, width)?;
        let index = match width {
          1 => u32::from(element[0]),
          2 => u32::from(u16::from_le_bytes([element[0], element[1]])),
          _ => read_u32(element, 0)?,
        };
        mesh.indices.push(index);
      }
    }
    None => mesh.indices.extend(0..mesh.vertices.len() as u32),
  }

  if mesh.indices.len() % 3 != 0 {
    return Err(ExportError::Malformed(format!(
      "{} indices do not form whole triangles",
      mesh.indices.len()
    )));
  }
  if let Some((face, index)) = mesh.find_invalid_index() {
    return Err(ExportError::Malformed(format!(
      "face {face} references vertex {index} of {}",
      mesh.vertex_count()
    )));
  }

  Ok(mesh)
}

/// Accessor resolved against its buffer view.
struct AccessorData<'a> {
  accessor: &'a Accessor,
  bytes: &'a [u8],
  stride: Option<usize>,
}

impl AccessorData<'_> {
  /// Bytes of element `i`, which is `size` bytes wide.
  fn element(&self, i: usize, size: usize) -> Result<&[u8], ExportError> {
    let start = i * self.stride.unwrap_or(size);
    self
      .bytes
      .get(start..start + size)
      .ok_or_else(|| ExportError::Malformed(format!("accessor element {i} is out of bounds")))
  }
}

fn read_accessor<'a>(
  document: &'a Document,
  bin: &'a [u8],
  index: usize,
) -> Result<AccessorData<'a>, ExportError> {
  let accessor = document
    .accessors
    .get(index)
    .ok_or_else(|| ExportError::Malformed(format!("missing accessor {index}")))?;
  let view = document
    .buffer_views
    .get(accessor.buffer_view)
    .ok_or_else(|| ExportError::Malformed(format!("missing buffer view {}", accessor.buffer_view)))?;
  if view.buffer != 0 {
    return Err(ExportError::Malformed("only the embedded buffer is supported".into()));
  }

  let start = view.byte_offset + accessor.byte_offset;
  let end = view.byte_offset + view.byte_length;
  let bytes = bin
    .get(start..end)
    .ok_or_else(|| ExportError::Malformed(format!("buffer view {} is out of bounds", accessor.buffer_view)))?;

  Ok(AccessorData {
    accessor,
    bytes,
    stride: view.byte_stride,
  })
}

#[cfg(test)]
#[path = "glb_test.rs"]
mod glb_test;
