//! DDS texture format detection

use serde::Serialize;

use super::header::{pf_flags, DdsHeader, DX10Header, PixelFormat};

/// Detected texture format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextureFormat {
    /// Block Compressed 1 (DXT1)
    BC1,
    /// Block Compressed 2 (DXT3)
    BC2,
    /// Block Compressed 3 (DXT5)
    BC3,
    BC4,
    BC5,
    /// Block Compressed 6 (HDR)
    BC6H,
    BC7,
    /// Uncompressed RGBA8
    RGBA8,
    /// Uncompressed BGRA8
    BGRA8,
    Unknown,
}

impl TextureFormat {
    /// Detect format from DDS header
    pub fn from_header(header: &DdsHeader, dx10: Option<&DX10Header>) -> Self {
        match dx10 {
            Some(dx10) => Self::from_dxgi_format(dx10.dxgi_format),
            None => Self::from_pixel_format(&header.pixel_format),
        }
    }

    fn from_dxgi_format(format: u32) -> Self {
        match format {
            71 | 72 => TextureFormat::BC1,
            74 | 75 => TextureFormat::BC2,
            77 | 78 => TextureFormat::BC3,
            80 | 81 => TextureFormat::BC4,
            83 | 84 => TextureFormat::BC5,
            95 | 96 => TextureFormat::BC6H,
            98 | 99 => TextureFormat::BC7,
            28 | 29 => TextureFormat::RGBA8,
            87 | 91 => TextureFormat::BGRA8,
            _ => TextureFormat::Unknown,
        }
    }

    fn from_pixel_format(pf: &PixelFormat) -> Self {
        if pf.flags & pf_flags::FOURCC != 0 {
            match &pf.fourcc {
                b"DXT1" => TextureFormat::BC1,
                b"DXT2" | b"DXT3" => TextureFormat::BC2,
                b"DXT4" | b"DXT5" => TextureFormat::BC3,
                b"ATI1" | b"BC4U" => TextureFormat::BC4,
                b"ATI2" | b"BC5U" => TextureFormat::BC5,
                _ => TextureFormat::Unknown,
            }
        } else if pf.flags & pf_flags::RGB != 0 && pf.rgb_bit_count == 32 {
            if pf.r_bit_mask == 0x0000_00FF {
                TextureFormat::RGBA8
            } else {
                TextureFormat::BGRA8
            }
        } else {
            TextureFormat::Unknown
        }
    }

    /// Get block size for compressed formats
    pub fn block_size(&self) -> Option<usize> {
        match self {
            TextureFormat::BC1 | TextureFormat::BC4 => Some(8),
            TextureFormat::BC2
            | TextureFormat::BC3
            | TextureFormat::BC5
            | TextureFormat::BC6H
            | TextureFormat::BC7 => Some(16),
            _ => None,
        }
    }

    /// Check if format is block-compressed
    pub fn is_compressed(&self) -> bool {
        self.block_size().is_some()
    }

    /// Bytes needed for one mip level of the given size
    ///
    /// `None` if the size does not fit in `usize`.
    pub fn level_size(&self, width: u32, height: u32) -> Option<usize> {
        let (width, height) = (width.max(1) as usize, height.max(1) as usize);
        match self.block_size() {
            Some(block) => width
                .div_ceil(4)
                .checked_mul(height.div_ceil(4))?
                .checked_mul(block),
            // Uncompressed and unknown formats are assumed 4 bytes per pixel
            None => width.checked_mul(height)?.checked_mul(4),
        }
    }
}
