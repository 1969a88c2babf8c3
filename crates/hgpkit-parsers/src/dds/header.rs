//! DDS header structures

use byteorder::{ByteOrder, LittleEndian};

use crate::traits::{ParseError, ParseResult};

/// Caps2 flags
pub mod caps2 {
    pub const CUBEMAP: u32 = 0x200;
    pub const VOLUME: u32 = 0x20_0000;
}

/// DDS pixel format flags
pub mod pf_flags {
    pub const ALPHAPIXELS: u32 = 0x1;
    pub const FOURCC: u32 = 0x4;
    pub const RGB: u32 = 0x40;
}

/// DDS header (124 bytes, following the magic)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdsHeader {
    pub flags: u32,
    pub height: u32,
    pub width: u32,
    pub pitch_or_linear_size: u32,
    pub depth: u32,
    pub mipmap_count: u32,
    pub pixel_format: PixelFormat,
    pub caps: u32,
    pub caps2: u32,
}

impl DdsHeader {
    pub const SIZE: usize = 124;

    /// Parse the header from the bytes right after the magic
    pub fn parse(data: &[u8]) -> ParseResult<Self> {
        if data.len() < Self::SIZE {
            return Err(ParseError::InvalidStructure(format!(
                "DDS header truncated: {} of {} bytes",
                data.len(),
                Self::SIZE
            )));
        }

        let size = LittleEndian::read_u32(&data[0..4]);
        if size as usize != Self::SIZE {
            return Err(ParseError::InvalidStructure(format!(
                "Invalid DDS header size: expected 124, got {}",
                size
            )));
        }

        Ok(DdsHeader {
            flags: LittleEndian::read_u32(&data[4..8]),
            height: LittleEndian::read_u32(&data[8..12]),
            width: LittleEndian::read_u32(&data[12..16]),
            pitch_or_linear_size: LittleEndian::read_u32(&data[16..20]),
            depth: LittleEndian::read_u32(&data[20..24]),
            mipmap_count: LittleEndian::read_u32(&data[24..28]),
            // 11 reserved dwords
            pixel_format: PixelFormat::parse(&data[72..104]),
            caps: LittleEndian::read_u32(&data[104..108]),
            caps2: LittleEndian::read_u32(&data[108..112]),
        })
    }

    /// Check if this DDS has a DX10 extended header
    pub fn has_dx10_header(&self) -> bool {
        self.pixel_format.flags & pf_flags::FOURCC != 0 && self.pixel_format.fourcc == *b"DX10"
    }

    pub fn is_cubemap(&self) -> bool {
        self.caps2 & caps2::CUBEMAP != 0
    }

    /// Mip levels stored in the file; a count of 0 means a single level
    ///
    /// Capped at 32, the most a 32-bit dimension can halve through.
    pub fn mip_levels(&self) -> u32 {
        self.mipmap_count.clamp(1, u32::BITS)
    }
}

/// DDS pixel format (32 bytes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelFormat {
    pub flags: u32,
    pub fourcc: [u8; 4],
    pub rgb_bit_count: u32,
    pub r_bit_mask: u32,
    pub g_bit_mask: u32,
    pub b_bit_mask: u32,
    pub a_bit_mask: u32,
}

impl PixelFormat {
    /// Parse from the 32-byte pixel format block
    fn parse(data: &[u8]) -> Self {
        PixelFormat {
            flags: LittleEndian::read_u32(&data[4..8]),
            fourcc: [data[8], data[9], data[10], data[11]],
            rgb_bit_count: LittleEndian::read_u32(&data[12..16]),
            r_bit_mask: LittleEndian::read_u32(&data[16..20]),
            g_bit_mask: LittleEndian::read_u32(&data[20..24]),
            b_bit_mask: LittleEndian::read_u32(&data[24..28]),
            a_bit_mask: LittleEndian::read_u32(&data[28..32]),
        }
    }

    /// Get FourCC as string
    pub fn fourcc_string(&self) -> String {
        String::from_utf8_lossy(&self.fourcc).to_string()
    }
}

/// DX10 extended header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DX10Header {
    pub dxgi_format: u32,
    pub resource_dimension: u32,
    pub misc_flag: u32,
    pub array_size: u32,
}

impl DX10Header {
    pub const SIZE: usize = 20;

    pub fn parse(data: &[u8]) -> ParseResult<Self> {
        if data.len() < Self::SIZE {
            return Err(ParseError::InvalidStructure(
                "DX10 header truncated".to_string(),
            ));
        }

        Ok(DX10Header {
            dxgi_format: LittleEndian::read_u32(&data[0..4]),
            resource_dimension: LittleEndian::read_u32(&data[4..8]),
            misc_flag: LittleEndian::read_u32(&data[8..12]),
            array_size: LittleEndian::read_u32(&data[12..16]),
        })
    }
}
