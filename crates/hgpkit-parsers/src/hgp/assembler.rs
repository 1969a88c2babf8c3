//! Decode orchestration
//!
//! Drives a single decode pass: headers, texture and material tables, the
//! mesh hierarchy, then every selected layer's slots. Vertex data is copied
//! last, once every stride assignment is known.

use hgpkit_core::{Matrix, Model, VertexBuffer};
use rayon::prelude::*;

use super::diagnostics::Diagnostic;
use super::materials::extract_materials;
use super::structs::{
    read_array, read_matrices, FileHeader, LayerHeader, MeshTreeNode, ModelHeader, Record,
    VertexHeader,
};
use super::textures::extract_textures;
use super::transforms::{compose_world_transforms, static_slot_transform};
use super::walker::{MeshGraphWalker, WalkOutput};
use super::{HgpAsset, LayerInfo};
use crate::resolver::{BulkResolver, OffsetResolver, BODY_OFFSET};
use crate::traits::{
    ParseError, ParseOptions, ParsePhase, ParseProgress, ParseResult, ProgressCallback,
    TextureDecoder,
};

/// Builds an [`HgpAsset`] from one HGP file
pub struct ModelAssembler<'a, D> {
    decoder: &'a D,
    options: &'a ParseOptions,
    progress: Option<&'a ProgressCallback>,
}

impl<'a, D: TextureDecoder> ModelAssembler<'a, D> {
    pub fn new(decoder: &'a D, options: &'a ParseOptions) -> Self {
        Self {
            decoder,
            options,
            progress: None,
        }
    }

    /// Report progress through `callback`
    pub fn with_progress(mut self, callback: Option<&'a ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    fn report(&self, phase: ParsePhase, item: &str) {
        if let Some(callback) = self.progress {
            callback(ParseProgress::phase(phase, item));
        }
    }

    /// Run the full decode pass
    pub fn assemble<R: OffsetResolver + ?Sized>(&self, r: &mut R) -> ParseResult<HgpAsset<D::Texture>> {
        self.report(ParsePhase::ReadingHeader, "file header");
        let file_header = FileHeader::read_from_start(r)?;
        let model_header = ModelHeader::read_at(r, file_header.model_header_offset)?;
        tracing::debug!(
            num_meshes = model_header.num_meshes,
            num_layers = model_header.num_layers,
            file_length = file_header.file_length,
            "Read headers"
        );

        let mut diagnostics = Vec::new();

        self.report(ParsePhase::ParsingRecords, "textures");
        let textures = extract_textures(
            r,
            file_header.texture_header_offset,
            self.decoder,
            self.options.parallel_walk,
        )?;

        self.report(ParsePhase::ParsingRecords, "materials");
        let materials = extract_materials(
            r,
            file_header.material_header_offset,
            textures.len(),
            &mut diagnostics,
        )?;

        self.report(ParsePhase::ParsingRecords, "mesh tree");
        let num_meshes = usize::from(model_header.num_meshes);
        let nodes: Vec<MeshTreeNode> = read_array(r, model_header.mesh_tree_offset, num_meshes)?;
        let local = read_matrices(r, model_header.transformations_offset, num_meshes)?;
        let parents: Vec<i8> = nodes.iter().map(|node| node.parent_idx).collect();
        let world = compose_world_transforms(&local, &parents)?;

        let vertex_header = VertexHeader::read_at(r, file_header.vertex_header_offset)?;
        tracing::debug!(
            textures = textures.len(),
            materials = materials.len(),
            vertex_blocks = vertex_header.blocks.len(),
            "Read tables"
        );

        let layer_headers: Vec<LayerHeader> = read_array(
            r,
            model_header.layer_header_offset,
            usize::from(model_header.num_layers),
        )?;

        for &layer in self.options.layers.requested() {
            if layer >= model_header.num_layers {
                Diagnostic::LayerOutOfRange {
                    layer,
                    num_layers: model_header.num_layers,
                }
                .record(&mut diagnostics);
            }
        }

        self.report(ParsePhase::LinkingReferences, "layers");
        let walker = MeshGraphWalker::new(vertex_header.blocks.len(), materials.len())
            .strict(self.options.strict_validation)
            .max_chain_length(self.options.max_chain_length);

        let mut walked = WalkOutput::default();
        let mut layers = Vec::with_capacity(layer_headers.len());

        for (index, layer) in layer_headers.iter().enumerate() {
            let index = index as u8;
            let selected = self.options.layers.contains(index);
            layers.push(LayerInfo {
                index,
                name: read_layer_name(r, layer.name_offset),
                selected,
            });

            if !selected {
                continue;
            }

            tracing::debug!(layer = index, slots = ?layer.slots, "Walking layer");
            for (slot, &slot_offset) in layer.slots.iter().enumerate() {
                if slot_offset == 0 {
                    continue;
                }
                let output = if slot % 2 == 0 {
                    self.walk_mesh_slot(r, &walker, slot_offset, &world)?
                } else {
                    self.walk_static_slot(r, &walker, slot_offset, &model_header, &world)?
                };
                walked.append(output);
            }
        }

        let vertex_buffers = read_vertex_buffers(
            r,
            file_header.vertex_header_offset,
            &vertex_header,
            &walked.strides,
        )?;

        diagnostics.append(&mut walked.diagnostics);
        self.report(ParsePhase::Complete, "model");

        Ok(HgpAsset {
            model: Model {
                vertex_buffers,
                chunks: walked.chunks,
                materials,
                textures,
            },
            layers,
            diagnostics,
            file_length: file_header.file_length,
        })
    }

    /// Walk an even slot: one mesh header offset per mesh tree node
    fn walk_mesh_slot<R: OffsetResolver + ?Sized>(
        &self,
        r: &mut R,
        walker: &MeshGraphWalker,
        slot_offset: u32,
        world: &[Matrix],
    ) -> ParseResult<WalkOutput> {
        r.seek_body(slot_offset)?;
        let header_offsets = r.read_u32_array(world.len())?;

        if self.options.parallel_walk {
            if let Some(bytes) = r.shared_bytes() {
                let outputs = header_offsets
                    .par_iter()
                    .zip(world.par_iter())
                    .map(|(&offset, &transform)| {
                        walker.walk(&mut BulkResolver::new(bytes), offset, transform)
                    })
                    .collect::<ParseResult<Vec<_>>>()?;
                return Ok(merge(outputs));
            }
        }

        let mut out = WalkOutput::default();
        for (&offset, &transform) in header_offsets.iter().zip(world) {
            out.append(walker.walk(r, offset, transform)?);
        }
        Ok(out)
    }

    /// Walk an odd slot: a single mesh header under the static transform
    fn walk_static_slot<R: OffsetResolver + ?Sized>(
        &self,
        r: &mut R,
        walker: &MeshGraphWalker,
        slot_offset: u32,
        model_header: &ModelHeader,
        world: &[Matrix],
    ) -> ParseResult<WalkOutput> {
        let root_world = world.first().copied().ok_or(ParseError::InvalidIndex {
            kind: "mesh",
            index: 0,
            limit: 0,
        })?;
        let static_transform = read_matrices(r, model_header.static_transformations_offset, 1)?[0];
        walker.walk(r, slot_offset, static_slot_transform(static_transform, root_world))
    }
}

fn merge(outputs: Vec<WalkOutput>) -> WalkOutput {
    outputs.into_iter().fold(WalkOutput::default(), |mut acc, out| {
        acc.append(out);
        acc
    })
}

/// Read a layer's name, if it has a readable one
fn read_layer_name<R: OffsetResolver + ?Sized>(r: &mut R, name_offset: u32) -> Option<String> {
    if name_offset == 0 {
        return None;
    }
    match r.seek_body(name_offset).and_then(|_| r.read_cstring()) {
        Ok(name) => Some(name),
        Err(error) => {
            tracing::debug!(name_offset, %error, "Unreadable layer name");
            None
        }
    }
}

/// Copy every vertex block and apply the strides collected by the walk
///
/// A block referenced by several meshes takes the stride of the last one.
fn read_vertex_buffers<R: OffsetResolver + ?Sized>(
    r: &mut R,
    vertex_header_offset: u32,
    header: &VertexHeader,
    strides: &[(usize, u32)],
) -> ParseResult<Vec<VertexBuffer>> {
    let base = BODY_OFFSET + u64::from(vertex_header_offset);
    let mut buffers = header
        .blocks
        .iter()
        .map(|block| -> ParseResult<VertexBuffer> {
            r.seek_file(base + u64::from(block.offset))?;
            Ok(VertexBuffer::new(block.id, r.read_bytes(block.size as usize)?))
        })
        .collect::<ParseResult<Vec<_>>>()?;

    for &(idx, stride) in strides {
        if let Some(buffer) = buffers.get_mut(idx) {
            buffer.stride = stride;
        }
    }

    Ok(buffers)
}
