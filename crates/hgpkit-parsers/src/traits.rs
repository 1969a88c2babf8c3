// hgpkit-parsers/src/traits.rs
//! Core traits defining the parser interface.
//!
//! This module establishes the shared pieces every decoder in the crate uses:
//! - A single error type and result alias
//! - Parse options, loadable from JSON
//! - Progress reporting for long decodes
//! - The pluggable texture decoder seam

use std::io::{Read, Seek};
use std::path::Path;

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use thiserror::Error;

/// Errors that can occur during parsing operations
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Read out of bounds at offset 0x{offset:X}: requested {requested} bytes, {available} available")]
    OutOfBounds { offset: u64, requested: usize, available: u64 },

    #[error("Invalid {kind} index {index} (limit {limit})")]
    InvalidIndex { kind: &'static str, index: i64, limit: usize },

    #[error("Corrupted data at offset 0x{offset:X}: {message}")]
    CorruptedData { offset: u64, message: String },

    #[error("Unknown vertex type {vertex_type} in mesh at 0x{offset:X}")]
    UnknownVertexType { vertex_type: u32, offset: u32 },

    #[error("Invalid magic bytes: expected {expected:?}, found {found:?}")]
    InvalidMagic { expected: Vec<u8>, found: Vec<u8> },

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error("Failed to decode texture {index}: {source}")]
    TextureDecode {
        index: usize,
        #[source]
        source: Box<ParseError>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    #[error("Nested error in {context}: {source}")]
    Nested {
        context: String,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    /// Wrap this error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ParseError::Nested {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if this error means the input is truncated or corrupt
    pub fn is_corruption(&self) -> bool {
        match self {
            ParseError::OutOfBounds { .. }
            | ParseError::InvalidIndex { .. }
            | ParseError::CorruptedData { .. } => true,
            ParseError::Nested { source, .. } | ParseError::TextureDecode { source, .. } => {
                source.is_corruption()
            }
            _ => false,
        }
    }
}

/// Result type alias for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Progress callback for long-running parse operations
pub type ProgressCallback = Box<dyn Fn(ParseProgress) + Send + Sync>;

/// Progress information during parsing
#[derive(Debug, Clone)]
pub struct ParseProgress {
    /// Current phase of parsing
    pub phase: ParsePhase,
    /// Bytes processed so far
    pub bytes_processed: u64,
    /// Total bytes to process (if known)
    pub total_bytes: Option<u64>,
    /// Current item being processed (e.g., table name)
    pub current_item: Option<String>,
    /// Number of items processed
    pub items_processed: u64,
    /// Total items to process (if known)
    pub total_items: Option<u64>,
}

impl ParseProgress {
    /// Progress report with only a phase and a label
    pub fn phase(phase: ParsePhase, item: impl Into<String>) -> Self {
        Self {
            phase,
            bytes_processed: 0,
            total_bytes: None,
            current_item: Some(item.into()),
            items_processed: 0,
            total_items: None,
        }
    }

    /// Calculate percentage complete (0.0 - 1.0)
    pub fn percentage(&self) -> Option<f32> {
        self.total_bytes.map(|total| {
            if total == 0 {
                1.0
            } else {
                self.bytes_processed as f32 / total as f32
            }
        })
    }
}

/// Phases of the parsing process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsePhase {
    /// Reading file headers
    ReadingHeader,
    /// Parsing texture, material and vertex tables
    ParsingRecords,
    /// Walking the mesh graph
    LinkingReferences,
    /// Parsing complete
    Complete,
}

/// Which offset resolver backs a decode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverStrategy {
    /// Read the whole file into memory and slice it
    #[default]
    Bulk,
    /// Seek and read on the underlying stream
    ///
    /// Files at or above the memory-mapping threshold are still streamed.
    Streaming,
}

/// Layers to pull geometry from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerSelection {
    /// Every layer in the file
    All,
    /// Only the listed layer indices
    Indices(SmallVec<[u8; 4]>),
}

impl LayerSelection {
    /// Select the given layer indices
    pub fn indices(layers: impl IntoIterator<Item = u8>) -> Self {
        LayerSelection::Indices(layers.into_iter().collect())
    }

    /// Check if a layer is selected
    pub fn contains(&self, layer: u8) -> bool {
        match self {
            LayerSelection::All => true,
            LayerSelection::Indices(layers) => layers.contains(&layer),
        }
    }

    /// Explicitly requested indices (empty for `All`)
    pub fn requested(&self) -> &[u8] {
        match self {
            LayerSelection::All => &[],
            LayerSelection::Indices(layers) => layers,
        }
    }
}

impl Default for LayerSelection {
    fn default() -> Self {
        LayerSelection::Indices(smallvec![0, 2])
    }
}

/// Configuration options for parsing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Layers whose meshes end up in the model
    pub layers: LayerSelection,
    /// Resolver used by `parse_with_options`
    pub strategy: ResolverStrategy,
    /// Treat recoverable oddities (unknown vertex types) as errors
    pub strict_validation: bool,
    /// Walk per-mesh slot entries on the rayon pool
    pub parallel_walk: bool,
    /// Upper bound on the length of a mesh or chunk chain
    pub max_chain_length: u32,
    /// Whether to use memory mapping for large files
    pub use_memory_mapping: bool,
    /// Minimum file size to enable memory mapping
    pub memory_mapping_threshold: u64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            layers: LayerSelection::default(),
            strategy: ResolverStrategy::Bulk,
            strict_validation: false,
            parallel_walk: false,
            max_chain_length: 65_536,
            use_memory_mapping: true,
            memory_mapping_threshold: 10 * 1024 * 1024, // 10 MB
        }
    }
}

impl ParseOptions {
    /// Load options from a JSON document; missing fields keep their defaults
    pub fn from_json(json: &str) -> ParseResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Core trait for all file format parsers
pub trait Parser: Send + Sync {
    /// The parsed output type
    type Output: Send + Sync;

    /// Returns the file extensions this parser handles (e.g., ["hgp"])
    fn extensions(&self) -> &[&str];

    /// Returns the magic bytes that identify this file type (if applicable)
    fn magic_bytes(&self) -> Option<&[u8]> {
        None
    }

    /// Returns a human-readable name for this parser
    fn name(&self) -> &str;

    /// Parse from a reader with default options
    fn parse<R: Read + Seek>(&self, reader: R) -> ParseResult<Self::Output> {
        self.parse_with_options(reader, &ParseOptions::default(), None)
    }

    /// Parse from a reader with custom options and optional progress callback
    fn parse_with_options<R: Read + Seek>(
        &self,
        reader: R,
        options: &ParseOptions,
        progress: Option<ProgressCallback>,
    ) -> ParseResult<Self::Output>;

    /// Parse from a file path
    fn parse_file(&self, path: &Path) -> ParseResult<Self::Output> {
        self.parse_file_with_options(path, &ParseOptions::default(), None)
    }

    /// Parse from a file path with options
    fn parse_file_with_options(
        &self,
        path: &Path,
        options: &ParseOptions,
        progress: Option<ProgressCallback>,
    ) -> ParseResult<Self::Output> {
        crate::log_parse_start!(self.name(), path);
        let file = std::fs::File::open(path)?;

        // Use memory mapping for large files if enabled
        if options.use_memory_mapping && options.strategy != ResolverStrategy::Streaming {
            let metadata = file.metadata()?;
            if metadata.len() >= options.memory_mapping_threshold {
                return self.parse_memory_mapped(path, options, progress);
            }
        }

        let reader = std::io::BufReader::new(file);
        self.parse_with_options(reader, options, progress)
    }

    /// Parse using memory-mapped I/O (for large files)
    fn parse_memory_mapped(
        &self,
        path: &Path,
        options: &ParseOptions,
        progress: Option<ProgressCallback>,
    ) -> ParseResult<Self::Output> {
        // Default implementation falls back to standard I/O
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        self.parse_with_options(reader, options, progress)
    }

    /// Check if this parser can handle the given file
    fn can_parse(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension() {
            let ext_str = ext.to_string_lossy().to_lowercase();
            if self.extensions().iter().any(|e| e.to_lowercase() == ext_str) {
                return true;
            }
        }

        if let Some(magic) = self.magic_bytes() {
            if let Ok(file) = std::fs::File::open(path) {
                let mut reader = std::io::BufReader::new(file);
                let mut buffer = vec![0u8; magic.len()];
                if reader.read_exact(&mut buffer).is_ok() {
                    return buffer == magic;
                }
            }
        }

        false
    }
}

/// Turns one embedded image payload into a texture object
///
/// The HGP decoder hands each texture's byte region to an implementation of
/// this trait and stores whatever comes back at the same index.
pub trait TextureDecoder: Send + Sync {
    /// Decoded texture type
    type Texture: Send + Sync;

    /// Decode a self-contained image payload
    fn decode_texture(&self, data: &[u8]) -> ParseResult<Self::Texture>;
}

impl<F, T> TextureDecoder for F
where
    F: Fn(&[u8]) -> ParseResult<T> + Send + Sync,
    T: Send + Sync,
{
    type Texture = T;

    fn decode_texture(&self, data: &[u8]) -> ParseResult<T> {
        self(data)
    }
}

/// Trait for converting parsed data to human-readable formats
pub trait HumanReadable {
    /// Convert to a human-readable string representation
    fn to_readable_string(&self) -> String;

    /// Convert to formatted JSON
    fn to_json(&self) -> serde_json::Value;

    /// Convert to formatted YAML (optional, returns JSON by default)
    fn to_yaml(&self) -> String {
        serde_yaml::to_string(&self.to_json()).unwrap_or_else(|_| self.to_readable_string())
    }
}
