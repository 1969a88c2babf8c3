//! hgpkit-parsers
//!
//! Decoders for HGP game-model containers and the textures embedded in them.
//!
//! # Supported Formats
//!
//! | Format | Extension | Description |
//! |--------|-----------|-------------|
//! | HGP    | `.hgp`    | Model container: meshes, materials, vertex data, textures |
//! | DDS    | `.dds`    | DirectDraw Surface texture (also the embedded texture format) |
//!
//! # Example
//!
//! ```rust,ignore
//! use hgpkit_parsers::{HgpParser, Parser};
//!
//! let parser = HgpParser::new();
//! let asset = parser.parse_file("ship.hgp".as_ref())?;
//!
//! for chunk in &asset.model.chunks {
//!     println!("{} indices into buffer {}", chunk.num_elements(), chunk.vertex_buffer_idx);
//! }
//! ```

pub mod dds;
pub mod hgp;
pub mod logging;
pub mod resolver;
pub mod traits;

// Re-export main types
pub use traits::{
    HumanReadable, LayerSelection, ParseError, ParseOptions, ParsePhase, ParseProgress,
    ParseResult, Parser, ProgressCallback, ResolverStrategy, TextureDecoder,
};

pub use resolver::{BulkResolver, OffsetResolver, StreamResolver, BODY_OFFSET};

pub use hgp::{Diagnostic, HgpAsset, HgpParser, LayerInfo, ModelAssembler, MeshGraphWalker};
pub use dds::{DdsHeader, DdsParser, DdsTexture, TextureFormat};

pub use hgpkit_core::{DrawChunk, Material, Matrix, Model, VertexBuffer};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
