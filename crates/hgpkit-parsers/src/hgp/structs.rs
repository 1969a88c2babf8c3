//! Fixed-layout HGP records
//!
//! Each record is read field by field from the resolver's cursor; fields the
//! decoder has no use for are skipped, so a read always consumes exactly
//! [`Record::SIZE`] bytes (plus any trailing variable-length array).
//!
//! ```text
//! file start ─┬─ FileHeader (0x30)
//!             └─ body ──┬─ TextureHeader ── block headers ── texture block
//!                       ├─ MaterialHeader ── offsets ──> MaterialRecord
//!                       ├─ VertexHeader ── block descriptors ── vertex data
//!                       └─ ModelHeader ──┬─ MeshTreeNode[num_meshes]
//!                                        ├─ Matrix[num_meshes] (local)
//!                                        ├─ Matrix[..] (static)
//!                                        └─ LayerHeader[num_layers]
//!                                              └─ slots ──> MeshHeader ──> Mesh ──> Chunk
//! ```

use hgpkit_core::Matrix;

use crate::resolver::OffsetResolver;
use crate::traits::ParseResult;

/// A record with a fixed on-disk layout
pub trait Record: Sized {
    /// Size of the fixed part in bytes
    const SIZE: u64;

    /// Read the record at the resolver's cursor
    fn read<R: OffsetResolver + ?Sized>(r: &mut R) -> ParseResult<Self>;

    /// Read the record at a body-relative offset
    fn read_at<R: OffsetResolver + ?Sized>(r: &mut R, offset: u32) -> ParseResult<Self> {
        r.seek_body(offset)?;
        Self::read(r)
    }
}

/// Read `count` consecutive records starting at a body-relative offset
pub fn read_array<T: Record, R: OffsetResolver + ?Sized>(
    r: &mut R,
    offset: u32,
    count: usize,
) -> ParseResult<Vec<T>> {
    r.seek_body(offset)?;
    r.ensure((T::SIZE as usize).saturating_mul(count))?;
    (0..count).map(|_| T::read(r)).collect()
}

/// Read `count` consecutive matrices starting at a body-relative offset
pub fn read_matrices<R: OffsetResolver + ?Sized>(
    r: &mut R,
    offset: u32,
    count: usize,
) -> ParseResult<Vec<Matrix>> {
    r.seek_body(offset)?;
    r.ensure(64usize.saturating_mul(count))?;
    (0..count).map(|_| r.read_matrix()).collect()
}

/// File preamble; the only record addressed from the file start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub strings_offset: u32,
    pub texture_header_offset: u32,
    pub material_header_offset: u32,
    pub vertex_header_offset: u32,
    pub model_header_offset: u32,
    pub file_length: u32,
}

impl FileHeader {
    /// Read the header from the start of the file
    pub fn read_from_start<R: OffsetResolver + ?Sized>(r: &mut R) -> ParseResult<Self> {
        r.seek_file(0)?;
        Self::read(r)
    }
}

impl Record for FileHeader {
    const SIZE: u64 = 0x30;

    fn read<R: OffsetResolver + ?Sized>(r: &mut R) -> ParseResult<Self> {
        r.ensure(Self::SIZE as usize)?;
        r.skip(4)?;
        let strings_offset = r.read_u32()?;
        let texture_header_offset = r.read_u32()?;
        let material_header_offset = r.read_u32()?;
        r.skip(4)?;
        let vertex_header_offset = r.read_u32()?;
        let model_header_offset = r.read_u32()?;
        r.skip(8 + 4 + 4)?;
        let file_length = r.read_u32()?;

        Ok(Self {
            strings_offset,
            texture_header_offset,
            material_header_offset,
            vertex_header_offset,
            model_header_offset,
            file_length,
        })
    }
}

/// Model-wide table of contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelHeader {
    pub mesh_tree_offset: u32,
    pub transformations_offset: u32,
    pub static_transformations_offset: u32,
    pub layer_header_offset: u32,
    pub strings_offset: u32,
    pub num_meshes: u8,
    pub num_layers: u8,
}

impl Record for ModelHeader {
    const SIZE: u64 = 0xB4;

    fn read<R: OffsetResolver + ?Sized>(r: &mut R) -> ParseResult<Self> {
        r.skip(0x14)?;
        let mesh_tree_offset = r.read_u32()?;
        let transformations_offset = r.read_u32()?;
        let static_transformations_offset = r.read_u32()?;
        r.skip(4)?;
        let layer_header_offset = r.read_u32()?;
        r.skip(8)?;
        let strings_offset = r.read_u32()?;
        r.skip(0x7C - 0x34)?;
        let num_meshes = r.read_u8()?;
        r.skip(1)?;
        let num_layers = r.read_u8()?;
        r.skip(1 + 13 * 4)?;

        Ok(Self {
            mesh_tree_offset,
            transformations_offset,
            static_transformations_offset,
            layer_header_offset,
            strings_offset,
            num_meshes,
            num_layers,
        })
    }
}

/// Location of one raw vertex block, relative to the vertex table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBlockDescriptor {
    pub size: u32,
    pub id: u32,
    pub offset: u32,
}

impl Record for VertexBlockDescriptor {
    const SIZE: u64 = 12;

    fn read<R: OffsetResolver + ?Sized>(r: &mut R) -> ParseResult<Self> {
        Ok(Self {
            size: r.read_u32()?,
            id: r.read_u32()?,
            offset: r.read_u32()?,
        })
    }
}

/// Vertex table: a count followed by block descriptors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexHeader {
    pub blocks: Vec<VertexBlockDescriptor>,
}

impl Record for VertexHeader {
    const SIZE: u64 = 0x10;

    fn read<R: OffsetResolver + ?Sized>(r: &mut R) -> ParseResult<Self> {
        let count = r.read_u32()? as usize;
        r.skip(12)?;
        r.ensure((VertexBlockDescriptor::SIZE as usize).saturating_mul(count))?;
        let blocks = (0..count)
            .map(|_| VertexBlockDescriptor::read(r))
            .collect::<ParseResult<_>>()?;
        Ok(Self { blocks })
    }
}

/// Texture table: block placement plus one offset per texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureHeader {
    pub texture_block_offset: u32,
    pub texture_block_size: u32,
    /// Per-texture offsets into the texture block
    pub entries: Vec<u32>,
}

impl TextureHeader {
    const ENTRY_SIZE: usize = 20;
}

impl Record for TextureHeader {
    const SIZE: u64 = 0x1C;

    fn read<R: OffsetResolver + ?Sized>(r: &mut R) -> ParseResult<Self> {
        let texture_block_offset = r.read_u32()?;
        let texture_block_size = r.read_u32()?;
        let count = r.read_u32()? as usize;
        r.skip(16)?;
        r.ensure(Self::ENTRY_SIZE.saturating_mul(count))?;

        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            entries.push(r.read_u32()?);
            r.skip(16)?;
        }

        Ok(Self {
            texture_block_offset,
            texture_block_size,
            entries,
        })
    }
}

/// Material table: a count followed by per-material offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialHeader {
    pub material_offsets: Vec<u32>,
}

impl Record for MaterialHeader {
    const SIZE: u64 = 4;

    fn read<R: OffsetResolver + ?Sized>(r: &mut R) -> ParseResult<Self> {
        let count = r.read_u32()? as usize;
        Ok(Self {
            material_offsets: r.read_u32_array(count)?,
        })
    }
}

/// One material as stored on disk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialRecord {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: u32,
    /// Raw texture reference; see `normalize_texture_index`
    pub texture_idx: i16,
}

impl Record for MaterialRecord {
    const SIZE: u64 = 0xB4;

    fn read<R: OffsetResolver + ?Sized>(r: &mut R) -> ParseResult<Self> {
        r.skip(0x54)?;
        let red = r.read_f32()?;
        let green = r.read_f32()?;
        let blue = r.read_f32()?;
        r.skip(20)?;
        let alpha = r.read_u32()?;
        let texture_idx = r.read_i16()?;
        r.skip(2 + 14 * 4)?;

        Ok(Self {
            red,
            green,
            blue,
            alpha,
            texture_idx,
        })
    }
}

/// Node of the mesh hierarchy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshTreeNode {
    pub bind_transform: Matrix,
    /// Parent mesh index, `-1` for roots
    pub parent_idx: i8,
}

impl Record for MeshTreeNode {
    const SIZE: u64 = 0x60;

    fn read<R: OffsetResolver + ?Sized>(r: &mut R) -> ParseResult<Self> {
        let bind_transform = r.read_matrix()?;
        r.skip(16)?;
        let parent_idx = r.read_i8()?;
        r.skip(3 + 12)?;

        Ok(Self {
            bind_transform,
            parent_idx,
        })
    }
}

/// Named group of four mesh-list slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerHeader {
    pub name_offset: u32,
    /// Even slots hold per-mesh offset arrays, odd slots a single mesh header
    pub slots: [u32; 4],
}

impl Record for LayerHeader {
    const SIZE: u64 = 0x14;

    fn read<R: OffsetResolver + ?Sized>(r: &mut R) -> ParseResult<Self> {
        let name_offset = r.read_u32()?;
        let mut slots = [0u32; 4];
        for slot in slots.iter_mut() {
            *slot = r.read_u32()?;
        }
        Ok(Self { name_offset, slots })
    }
}

/// Entry point of a mesh chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshHeader {
    pub mesh_offset: u32,
}

impl Record for MeshHeader {
    const SIZE: u64 = 0x14;

    fn read<R: OffsetResolver + ?Sized>(r: &mut R) -> ParseResult<Self> {
        r.skip(12)?;
        let mesh_offset = r.read_u32()?;
        r.skip(4)?;
        Ok(Self { mesh_offset })
    }
}

/// Link of a mesh chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshRecord {
    pub next_offset: u32,
    pub material_idx: u32,
    pub vertex_type: u32,
    /// 1-based vertex block index
    pub vertex_block_idx: u32,
    pub chunk_offset: u32,
}

impl Record for MeshRecord {
    const SIZE: u64 = 0x44;

    fn read<R: OffsetResolver + ?Sized>(r: &mut R) -> ParseResult<Self> {
        let next_offset = r.read_u32()?;
        r.skip(4)?;
        let material_idx = r.read_u32()?;
        let vertex_type = r.read_u32()?;
        r.skip(12)?;
        let vertex_block_idx = r.read_u32()?;
        r.skip(16)?;
        let chunk_offset = r.read_u32()?;
        r.skip(16)?;

        Ok(Self {
            next_offset,
            material_idx,
            vertex_type,
            vertex_block_idx,
            chunk_offset,
        })
    }
}

/// Link of a chunk chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRecord {
    pub next_offset: u32,
    pub primitive_type: u32,
    pub num_elements: u16,
    pub elements_offset: u32,
}

impl Record for ChunkRecord {
    const SIZE: u64 = 0x50;

    fn read<R: OffsetResolver + ?Sized>(r: &mut R) -> ParseResult<Self> {
        let next_offset = r.read_u32()?;
        let primitive_type = r.read_u32()?;
        let num_elements = r.read_u16()?;
        r.skip(2)?;
        let elements_offset = r.read_u32()?;
        r.skip(16 * 4)?;

        Ok(Self {
            next_offset,
            primitive_type,
            num_elements,
            elements_offset,
        })
    }
}
