//! HGP model container decoder
//!
//! An HGP file is a fixed preamble followed by a body of tables that refer
//! to each other through body-relative offsets:
//!
//! ```text
//! FileHeader ─┬─> TextureHeader ──> texture block ──> DDS payloads
//!             ├─> MaterialHeader ──> MaterialRecord[]
//!             ├─> VertexHeader ──> raw vertex blocks
//!             └─> ModelHeader ─┬─> MeshTreeNode[] + local transforms
//!                              ├─> static transforms
//!                              └─> LayerHeader[] ──> slots ──> Mesh chain ──> Chunk chain
//! ```
//!
//! Decoding yields an [`HgpAsset`]: the engine-neutral [`Model`] plus the
//! layer list and any recoverable issues found along the way.

mod assembler;
mod diagnostics;
mod materials;
mod structs;
mod textures;
mod transforms;
mod walker;

#[cfg(test)]
mod test_util;

pub use assembler::ModelAssembler;
pub use diagnostics::Diagnostic;
pub use materials::{extract_materials, normalize_texture_index};
pub use structs::{
    ChunkRecord, FileHeader, LayerHeader, MaterialHeader, MaterialRecord, MeshHeader, MeshRecord,
    MeshTreeNode, ModelHeader, Record, TextureHeader, VertexBlockDescriptor, VertexHeader,
};
pub use textures::{extract_textures, texture_regions, TextureRegion};
pub use transforms::{compose_world_transforms, static_slot_transform};
pub use walker::{stride_for_vertex_type, MeshGraphWalker, WalkOutput};

use std::io::{Read, Seek};
use std::path::Path;
use std::time::Instant;

use hgpkit_core::Model;
use memmap2::Mmap;
use serde::Serialize;

use crate::dds::DdsParser;
use crate::resolver::{BulkResolver, OffsetResolver, StreamResolver};
use crate::traits::{
    HumanReadable, ParseOptions, ParseResult, Parser, ProgressCallback, ResolverStrategy,
    TextureDecoder,
};
use crate::{log_parse_complete, log_parse_error, logging};

/// One layer of the file and whether it was decoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerInfo {
    pub index: u8,
    /// Layer name, when the file carries a readable one
    pub name: Option<String>,
    /// Whether the layer's meshes are part of the model
    pub selected: bool,
}

/// Result of decoding one HGP file
#[derive(Debug, Clone)]
pub struct HgpAsset<T> {
    pub model: Model<T>,
    pub layers: Vec<LayerInfo>,
    /// Recoverable issues, in the order they were found
    pub diagnostics: Vec<Diagnostic>,
    /// File length as declared in the header (not validated)
    pub file_length: u32,
}

impl<T> HgpAsset<T> {
    /// Check if the decode hit any recoverable issue
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// HGP parser, generic over the texture decoder
///
/// Embedded textures are decoded as DDS unless another [`TextureDecoder`]
/// is supplied.
pub struct HgpParser<D = DdsParser> {
    decoder: D,
}

impl HgpParser<DdsParser> {
    pub fn new() -> Self {
        Self {
            decoder: DdsParser::new(),
        }
    }
}

impl Default for HgpParser<DdsParser> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: TextureDecoder> HgpParser<D> {
    /// Create a parser that hands embedded textures to `decoder`
    pub fn with_decoder(decoder: D) -> Self {
        Self { decoder }
    }

    /// Decode through an already constructed resolver
    pub fn decode<R: OffsetResolver + ?Sized>(
        &self,
        resolver: &mut R,
        options: &ParseOptions,
        progress: Option<&ProgressCallback>,
    ) -> ParseResult<HgpAsset<D::Texture>> {
        logging::instrument_parse(self.name(), || {
            let start = Instant::now();
            let result = ModelAssembler::new(&self.decoder, options)
                .with_progress(progress)
                .assemble(resolver);

            match &result {
                Ok(asset) => {
                    log_parse_complete!(self.name(), start.elapsed(), asset.model.chunks.len());
                }
                Err(error) => {
                    log_parse_error!(self.name(), error);
                }
            }
            result
        })
    }
}

impl<D: TextureDecoder> Parser for HgpParser<D> {
    type Output = HgpAsset<D::Texture>;

    fn extensions(&self) -> &[&str] {
        &["hgp"]
    }

    fn name(&self) -> &str {
        "HGP Model Parser"
    }

    fn parse_with_options<R: Read + Seek>(
        &self,
        reader: R,
        options: &ParseOptions,
        progress: Option<ProgressCallback>,
    ) -> ParseResult<Self::Output> {
        match options.strategy {
            ResolverStrategy::Bulk => {
                let mut resolver = BulkResolver::from_reader(reader)?;
                self.decode(&mut resolver, options, progress.as_ref())
            }
            ResolverStrategy::Streaming => {
                let mut resolver = StreamResolver::new(reader)?;
                self.decode(&mut resolver, options, progress.as_ref())
            }
        }
    }

    fn parse_memory_mapped(
        &self,
        path: &Path,
        options: &ParseOptions,
        progress: Option<ProgressCallback>,
    ) -> ParseResult<Self::Output> {
        let file = std::fs::File::open(path)?;
        // SAFETY: the map is read-only and dropped before this call returns
        let mmap = unsafe { Mmap::map(&file)? };
        tracing::debug!(path = %path.display(), len = mmap.len(), "Memory-mapped input");
        let mut resolver = BulkResolver::new(mmap);
        self.decode(&mut resolver, options, progress.as_ref())
    }
}

#[derive(Serialize)]
struct AssetSummary<'a> {
    file_length: u32,
    textures: usize,
    materials: usize,
    vertex_buffers: Vec<BufferSummary>,
    chunks: usize,
    elements: usize,
    layers: &'a [LayerInfo],
    diagnostics: &'a [Diagnostic],
}

#[derive(Serialize)]
struct BufferSummary {
    id: u32,
    stride: u32,
    size: usize,
}

impl<T> HgpAsset<T> {
    fn summary(&self) -> AssetSummary<'_> {
        AssetSummary {
            file_length: self.file_length,
            textures: self.model.textures.len(),
            materials: self.model.materials.len(),
            vertex_buffers: self
                .model
                .vertex_buffers
                .iter()
                .map(|b| BufferSummary {
                    id: b.id,
                    stride: b.stride,
                    size: b.size(),
                })
                .collect(),
            chunks: self.model.chunks.len(),
            elements: self.model.element_count(),
            layers: &self.layers,
            diagnostics: &self.diagnostics,
        }
    }
}

impl<T> HumanReadable for HgpAsset<T> {
    fn to_readable_string(&self) -> String {
        let mut out = String::new();
        out.push_str("HGP Model\n");
        out.push_str(&format!("  Declared length: {} bytes\n", self.file_length));
        out.push_str(&format!("  Textures: {}\n", self.model.textures.len()));
        out.push_str(&format!("  Materials: {}\n", self.model.materials.len()));
        out.push_str(&format!(
            "  Chunks: {} ({} indices)\n",
            self.model.chunks.len(),
            self.model.element_count()
        ));

        out.push_str(&format!("  Vertex buffers: {}\n", self.model.vertex_buffers.len()));
        for (i, buffer) in self.model.vertex_buffers.iter().enumerate() {
            out.push_str(&format!(
                "    [{}] id {} stride {} ({} bytes)\n",
                i,
                buffer.id,
                buffer.stride,
                buffer.size()
            ));
        }

        out.push_str(&format!("  Layers: {}\n", self.layers.len()));
        for layer in &self.layers {
            out.push_str(&format!(
                "    [{}] {}{}\n",
                layer.index,
                layer.name.as_deref().unwrap_or("<unnamed>"),
                if layer.selected { " (decoded)" } else { "" }
            ));
        }

        if !self.diagnostics.is_empty() {
            out.push_str(&format!("  Diagnostics: {}\n", self.diagnostics.len()));
            for diagnostic in &self.diagnostics {
                out.push_str(&format!("    - {}\n", diagnostic));
            }
        }

        out
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.summary()).unwrap_or(serde_json::Value::Null)
    }
}
