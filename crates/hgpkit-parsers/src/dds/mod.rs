//! DDS (DirectDraw Surface) texture parser
//!
//! HGP files embed their textures as complete DDS images. [`DdsParser`] is
//! both a standalone [`Parser`] for `.dds` files and the default
//! [`TextureDecoder`] used by the HGP decoder.

mod format;
mod header;

pub use format::TextureFormat;
pub use header::{DX10Header, DdsHeader, PixelFormat};

use std::io::{Read, Seek};

use serde::Serialize;

use crate::traits::{
    ParseError, ParseOptions, ParseResult, Parser, ProgressCallback, TextureDecoder,
};

/// DDS file magic "DDS "
const DDS_MAGIC: &[u8; 4] = b"DDS ";

/// Parsed DDS texture
#[derive(Debug, Clone)]
pub struct DdsTexture {
    pub header: DdsHeader,
    /// DX10 extended header (if present)
    pub dx10_header: Option<DX10Header>,
    /// Pixel data following the headers, all mip levels back to back
    pub data: Vec<u8>,
    pub format: TextureFormat,
}

/// Short description of a texture, used in asset summaries
#[derive(Debug, Clone, Serialize)]
pub struct DdsSummary {
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub format: TextureFormat,
    pub data_size: usize,
}

impl DdsTexture {
    /// Decode a complete in-memory DDS image
    pub fn from_bytes(bytes: &[u8]) -> ParseResult<Self> {
        let magic = bytes.get(..4).unwrap_or(bytes);
        if magic != DDS_MAGIC {
            return Err(ParseError::InvalidMagic {
                expected: DDS_MAGIC.to_vec(),
                found: magic.to_vec(),
            });
        }

        let header = DdsHeader::parse(&bytes[4..])?;
        let mut data_start = 4 + DdsHeader::SIZE;

        let dx10_header = if header.has_dx10_header() {
            let dx10 = DX10Header::parse(&bytes[data_start..])?;
            data_start += DX10Header::SIZE;
            Some(dx10)
        } else {
            None
        };

        let format = TextureFormat::from_header(&header, dx10_header.as_ref());
        if format == TextureFormat::Unknown {
            tracing::debug!(
                fourcc = %header.pixel_format.fourcc_string(),
                "Unrecognised DDS pixel format"
            );
        }

        Ok(DdsTexture {
            header,
            dx10_header,
            data: bytes[data_start..].to_vec(),
            format,
        })
    }

    pub fn width(&self) -> u32 {
        self.header.width
    }

    pub fn height(&self) -> u32 {
        self.header.height
    }

    pub fn mipmap_count(&self) -> u32 {
        self.header.mip_levels()
    }

    pub fn is_cubemap(&self) -> bool {
        self.header.is_cubemap()
    }

    /// Dimensions of a mip level
    pub fn mipmap_dimensions(&self, level: u32) -> Option<(u32, u32)> {
        if level >= self.mipmap_count() {
            return None;
        }
        Some((
            self.width().checked_shr(level).unwrap_or(0).max(1),
            self.height().checked_shr(level).unwrap_or(0).max(1),
        ))
    }

    /// Pixel data of a mip level
    ///
    /// Returns `None` if the level does not exist or the data is short.
    pub fn mipmap(&self, level: u32) -> Option<&[u8]> {
        let mut offset = 0usize;
        for l in 0..level {
            let (w, h) = self.mipmap_dimensions(l)?;
            offset = offset.checked_add(self.format.level_size(w, h)?)?;
        }
        let (width, height) = self.mipmap_dimensions(level)?;
        let end = offset.checked_add(self.format.level_size(width, height)?)?;
        self.data.get(offset..end)
    }

    pub fn summary(&self) -> DdsSummary {
        DdsSummary {
            width: self.width(),
            height: self.height(),
            mip_levels: self.mipmap_count(),
            format: self.format,
            data_size: self.data.len(),
        }
    }
}

/// DDS Parser
#[derive(Debug, Clone, Copy, Default)]
pub struct DdsParser;

impl DdsParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for DdsParser {
    type Output = DdsTexture;

    fn extensions(&self) -> &[&str] {
        &["dds"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(DDS_MAGIC)
    }

    fn name(&self) -> &str {
        "DDS Texture Parser"
    }

    fn parse_with_options<R: Read + Seek>(
        &self,
        mut reader: R,
        _options: &ParseOptions,
        _progress: Option<ProgressCallback>,
    ) -> ParseResult<Self::Output> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        DdsTexture::from_bytes(&bytes)
    }
}

impl TextureDecoder for DdsParser {
    type Texture = DdsTexture;

    fn decode_texture(&self, data: &[u8]) -> ParseResult<DdsTexture> {
        DdsTexture::from_bytes(data)
    }
}
