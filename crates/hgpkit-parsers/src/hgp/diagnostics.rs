//! Recoverable conditions collected during a decode

use std::fmt;

use serde::Serialize;

/// Something odd the decoder worked around instead of failing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Vertex type with no known stride; the buffer keeps stride 0
    UnknownVertexType { vertex_type: u32, mesh_offset: u32 },
    /// Mesh references a material past the material table
    MaterialOutOfRange {
        material_idx: u32,
        material_count: usize,
        mesh_offset: u32,
    },
    /// Material references a texture past the texture table
    TextureOutOfRange {
        material: usize,
        texture_idx: u16,
        texture_count: usize,
    },
    /// Requested layer does not exist in the file
    LayerOutOfRange { layer: u8, num_layers: u8 },
}

impl Diagnostic {
    /// Log the diagnostic and add it to `sink`
    pub(crate) fn record(self, sink: &mut Vec<Diagnostic>) {
        tracing::warn!(diagnostic = %self, "Recoverable decode issue");
        sink.push(self);
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownVertexType { vertex_type, mesh_offset } => write!(
                f,
                "unknown vertex type {vertex_type} in mesh at 0x{mesh_offset:X}"
            ),
            Diagnostic::MaterialOutOfRange {
                material_idx,
                material_count,
                mesh_offset,
            } => write!(
                f,
                "mesh at 0x{mesh_offset:X} uses material {material_idx} of {material_count}"
            ),
            Diagnostic::TextureOutOfRange {
                material,
                texture_idx,
                texture_count,
            } => write!(
                f,
                "material {material} uses texture {texture_idx} of {texture_count}"
            ),
            Diagnostic::LayerOutOfRange { layer, num_layers } => {
                write!(f, "layer {layer} requested, file has {num_layers}")
            }
        }
    }
}
