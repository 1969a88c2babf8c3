//! Mesh and chunk chain traversal
//!
//! A layer slot points at a [`MeshHeader`]; from there meshes form a singly
//! linked list through `next_offset`, and each mesh owns a second list of
//! chunks. Offset `0` terminates either list. Every chunk becomes one
//! [`DrawChunk`] carrying the transform the traversal was started with.

use std::collections::HashSet;

use hgpkit_core::{DrawChunk, Matrix};

use super::diagnostics::Diagnostic;
use super::structs::{ChunkRecord, MeshHeader, MeshRecord, Record};
use crate::resolver::{OffsetResolver, BODY_OFFSET};
use crate::traits::{ParseError, ParseResult};

/// Vertex type code for the 36-byte layout
pub const VERTEX_TYPE_SHORT: u32 = 89;
/// Vertex type code for the 56-byte layout
pub const VERTEX_TYPE_LONG: u32 = 93;

/// Per-vertex stride for a vertex type code
pub fn stride_for_vertex_type(vertex_type: u32) -> Option<u32> {
    match vertex_type {
        VERTEX_TYPE_SHORT => Some(36),
        VERTEX_TYPE_LONG => Some(56),
        _ => None,
    }
}

/// What one traversal produced
///
/// Outputs are self-contained so traversals can run independently and be
/// merged afterwards in a fixed order.
#[derive(Debug, Default)]
pub struct WalkOutput {
    /// Draw chunks in chain order
    pub chunks: Vec<DrawChunk>,
    /// `(vertex buffer index, stride)` assignments in chain order
    pub strides: Vec<(usize, u32)>,
    pub diagnostics: Vec<Diagnostic>,
}

impl WalkOutput {
    /// Append another output after this one
    pub fn append(&mut self, mut other: WalkOutput) {
        self.chunks.append(&mut other.chunks);
        self.strides.append(&mut other.strides);
        self.diagnostics.append(&mut other.diagnostics);
    }
}

/// Rejects revisited offsets and over-long chains
struct ChainGuard {
    what: &'static str,
    visited: HashSet<u32>,
    limit: u32,
}

impl ChainGuard {
    fn new(what: &'static str, limit: u32) -> Self {
        Self {
            what,
            visited: HashSet::new(),
            limit,
        }
    }

    fn visit(&mut self, offset: u32) -> ParseResult<()> {
        if self.visited.len() as u32 >= self.limit {
            return Err(ParseError::CorruptedData {
                offset: BODY_OFFSET + u64::from(offset),
                message: format!("{} chain longer than {} links", self.what, self.limit),
            });
        }
        if !self.visited.insert(offset) {
            return Err(ParseError::CorruptedData {
                offset: BODY_OFFSET + u64::from(offset),
                message: format!("{} chain loops back to 0x{:X}", self.what, offset),
            });
        }
        Ok(())
    }
}

/// Walks mesh chains for one decode
#[derive(Debug, Clone)]
pub struct MeshGraphWalker {
    num_vertex_blocks: usize,
    num_materials: usize,
    strict: bool,
    max_chain_length: u32,
}

impl MeshGraphWalker {
    pub fn new(num_vertex_blocks: usize, num_materials: usize) -> Self {
        Self {
            num_vertex_blocks,
            num_materials,
            strict: false,
            max_chain_length: u32::MAX,
        }
    }

    /// Fail on unknown vertex types instead of recording a diagnostic
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Bound the number of links in any one chain
    pub fn max_chain_length(mut self, limit: u32) -> Self {
        self.max_chain_length = limit;
        self
    }

    /// Walk the mesh chain behind `mesh_header_offset`
    pub fn walk<R: OffsetResolver + ?Sized>(
        &self,
        r: &mut R,
        mesh_header_offset: u32,
        transform: Matrix,
    ) -> ParseResult<WalkOutput> {
        let mut out = WalkOutput::default();

        if mesh_header_offset == 0 {
            return Ok(out);
        }

        let header = MeshHeader::read_at(r, mesh_header_offset)?;
        let mut guard = ChainGuard::new("mesh", self.max_chain_length);
        let mut mesh_offset = header.mesh_offset;

        while mesh_offset != 0 {
            guard.visit(mesh_offset)?;
            let mesh = MeshRecord::read_at(r, mesh_offset)?;
            self.visit_mesh(r, mesh_offset, &mesh, transform, &mut out)?;
            mesh_offset = mesh.next_offset;
        }

        Ok(out)
    }

    fn visit_mesh<R: OffsetResolver + ?Sized>(
        &self,
        r: &mut R,
        mesh_offset: u32,
        mesh: &MeshRecord,
        transform: Matrix,
        out: &mut WalkOutput,
    ) -> ParseResult<()> {
        let stride = match stride_for_vertex_type(mesh.vertex_type) {
            Some(stride) => stride,
            None if self.strict => {
                return Err(ParseError::UnknownVertexType {
                    vertex_type: mesh.vertex_type,
                    offset: mesh_offset,
                });
            }
            None => {
                Diagnostic::UnknownVertexType {
                    vertex_type: mesh.vertex_type,
                    mesh_offset,
                }
                .record(&mut out.diagnostics);
                0
            }
        };

        let vertex_buffer_idx = self.vertex_buffer_index(mesh.vertex_block_idx)?;
        out.strides.push((vertex_buffer_idx, stride));

        if mesh.material_idx as usize >= self.num_materials {
            Diagnostic::MaterialOutOfRange {
                material_idx: mesh.material_idx,
                material_count: self.num_materials,
                mesh_offset,
            }
            .record(&mut out.diagnostics);
        }

        let mut guard = ChainGuard::new("chunk", self.max_chain_length);
        let mut chunk_offset = mesh.chunk_offset;

        while chunk_offset != 0 {
            guard.visit(chunk_offset)?;
            let chunk = ChunkRecord::read_at(r, chunk_offset)?;

            r.seek_body(chunk.elements_offset)?;
            let elements = r.read_u16_array(usize::from(chunk.num_elements))?;

            out.chunks.push(DrawChunk {
                vertex_buffer_idx,
                material_idx: mesh.material_idx,
                primitive_type: chunk.primitive_type,
                elements,
                transform,
            });

            chunk_offset = chunk.next_offset;
        }

        Ok(())
    }

    /// Convert a 1-based block reference to a buffer index
    fn vertex_buffer_index(&self, vertex_block_idx: u32) -> ParseResult<usize> {
        let idx = (vertex_block_idx as usize).wrapping_sub(1);
        if vertex_block_idx == 0 || idx >= self.num_vertex_blocks {
            return Err(ParseError::InvalidIndex {
                kind: "vertex block",
                index: i64::from(vertex_block_idx) - 1,
                limit: self.num_vertex_blocks,
            });
        }
        Ok(idx)
    }
}
