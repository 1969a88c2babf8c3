//! Model types shared between the decoders and their consumers
//!
//! Everything in this module is owned data. Once a decoder hands over a
//! [`Model`], nothing in it points back into the source file.

use serde::{Deserialize, Serialize};

/// 4x4 transform matrix used for chunk placement
pub type Matrix = glam::Mat4;

/// A raw, contiguous vertex buffer
///
/// The buffer is opaque to this crate; `stride` tells the consumer how many
/// bytes one vertex occupies. A stride of `0` means the vertex layout is not
/// known (the buffer was never referenced, or its vertex type was not recognised).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexBuffer {
    /// Block identifier as stored in the source file
    pub id: u32,
    /// Per-vertex size in bytes
    pub stride: u32,
    /// Raw vertex bytes
    pub data: Vec<u8>,
}

impl VertexBuffer {
    /// Create a buffer with an unresolved stride
    pub fn new(id: u32, data: Vec<u8>) -> Self {
        Self { id, stride: 0, data }
    }

    /// Size of the buffer in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Check whether a stride has been assigned
    pub fn has_stride(&self) -> bool {
        self.stride != 0
    }

    /// Number of whole vertices in the buffer, if the stride is known
    pub fn vertex_count(&self) -> Option<usize> {
        if self.stride == 0 {
            None
        } else {
            Some(self.data.len() / self.stride as usize)
        }
    }
}

/// Surface material: a flat colour plus an optional texture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: u32,
    /// Index into [`Model::textures`], `None` when untextured
    pub texture_idx: Option<u16>,
}

impl Material {
    /// RGB colour as an array
    pub fn color(&self) -> [f32; 3] {
        [self.red, self.green, self.blue]
    }

    /// Check if this material samples a texture
    pub fn is_textured(&self) -> bool {
        self.texture_idx.is_some()
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            red: 1.0,
            green: 1.0,
            blue: 1.0,
            alpha: 0xFF,
            texture_idx: None,
        }
    }
}

/// One drawable primitive batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawChunk {
    /// Index into [`Model::vertex_buffers`]
    pub vertex_buffer_idx: usize,
    /// Index into [`Model::materials`]
    pub material_idx: u32,
    /// Primitive topology code, passed through from the source file
    pub primitive_type: u32,
    /// Index buffer
    pub elements: Vec<u16>,
    /// World transform with the mesh hierarchy already applied
    pub transform: Matrix,
}

impl DrawChunk {
    /// Number of indices in this chunk
    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }
}

/// Decoded, renderable model
///
/// `T` is the texture type produced by whichever texture decoder the
/// caller plugged in.
#[derive(Debug, Clone)]
pub struct Model<T> {
    /// Vertex buffers, indexed by [`DrawChunk::vertex_buffer_idx`]
    pub vertex_buffers: Vec<VertexBuffer>,
    /// Flattened draw chunks in traversal order
    pub chunks: Vec<DrawChunk>,
    /// Materials, indexed by [`DrawChunk::material_idx`]
    pub materials: Vec<Material>,
    /// Textures, indexed by [`Material::texture_idx`]
    pub textures: Vec<T>,
}

impl<T> Model<T> {
    /// Create an empty model
    pub fn new() -> Self {
        Self {
            vertex_buffers: Vec::new(),
            chunks: Vec::new(),
            materials: Vec::new(),
            textures: Vec::new(),
        }
    }

    /// Check if the model has nothing to draw
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total index count across all chunks
    pub fn element_count(&self) -> usize {
        self.chunks.iter().map(DrawChunk::num_elements).sum()
    }

    /// Vertex buffer a chunk draws from
    pub fn vertex_buffer_for(&self, chunk: &DrawChunk) -> Option<&VertexBuffer> {
        self.vertex_buffers.get(chunk.vertex_buffer_idx)
    }

    /// Material a chunk is shaded with
    pub fn material_for(&self, chunk: &DrawChunk) -> Option<&Material> {
        self.materials.get(chunk.material_idx as usize)
    }

    /// Texture a material samples, if any
    pub fn texture_for(&self, material: &Material) -> Option<&T> {
        material
            .texture_idx
            .and_then(|idx| self.textures.get(idx as usize))
    }

    /// Convert the texture payloads, keeping everything else
    pub fn map_textures<U, F>(self, f: F) -> Model<U>
    where
        F: FnMut(T) -> U,
    {
        Model {
            vertex_buffers: self.vertex_buffers,
            chunks: self.chunks,
            materials: self.materials,
            textures: self.textures.into_iter().map(f).collect(),
        }
    }
}

impl<T> Default for Model<T> {
    fn default() -> Self {
        Self::new()
    }
}
