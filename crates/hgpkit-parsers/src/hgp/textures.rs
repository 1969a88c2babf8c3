//! Embedded texture extraction
//!
//! The texture table points at a texture block: a 12-byte sub-header
//! followed by the image payloads. Each table entry gives the payload's
//! offset from the end of that sub-header. Payloads carry no explicit size,
//! so a payload is taken to run until the next payload or the end of the
//! block, whichever comes first.

use rayon::prelude::*;

use super::structs::{Record, TextureHeader};
use crate::resolver::{OffsetResolver, BODY_OFFSET};
use crate::traits::{ParseError, ParseResult, TextureDecoder};

/// Size of the sub-header at the start of the texture block
pub const TEXTURE_BLOCK_PREFIX: u64 = 12;

/// Absolute byte range of one embedded texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureRegion {
    pub start: u64,
    pub end: u64,
}

impl TextureRegion {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Compute the byte range of every texture in the table
///
/// A `texture_block_size` of zero means the block size is unknown and the
/// block is taken to extend to the end of the file. A declared block that
/// runs past the end of the file is rejected.
pub fn texture_regions(
    header: &TextureHeader,
    table_offset: u32,
    file_len: u64,
) -> ParseResult<Vec<TextureRegion>> {
    let block_start = BODY_OFFSET + u64::from(table_offset) + u64::from(header.texture_block_offset);
    let data_start = block_start + TEXTURE_BLOCK_PREFIX;
    let block_end = if header.texture_block_size == 0 {
        file_len
    } else {
        let end = block_start + u64::from(header.texture_block_size);
        if end > file_len {
            return Err(ParseError::OutOfBounds {
                offset: block_start,
                requested: header.texture_block_size as usize,
                available: file_len.saturating_sub(block_start),
            });
        }
        end
    };

    let mut starts: Vec<u64> = header
        .entries
        .iter()
        .map(|&offset| data_start + u64::from(offset))
        .collect();
    starts.sort_unstable();
    starts.dedup();

    header
        .entries
        .iter()
        .map(|&offset| {
            let start = data_start + u64::from(offset);
            let next = starts.iter().copied().find(|&s| s > start);
            let end = next.map_or(block_end, |n| n.min(block_end));
            if start > end {
                return Err(ParseError::CorruptedData {
                    offset: start,
                    message: format!("texture payload starts past the block end 0x{end:X}"),
                });
            }
            Ok(TextureRegion { start, end })
        })
        .collect()
}

/// Read the texture table and decode every payload
///
/// Payload bytes are read sequentially; decoding runs on the rayon pool when
/// `parallel` is set.
pub fn extract_textures<R, D>(
    r: &mut R,
    table_offset: u32,
    decoder: &D,
    parallel: bool,
) -> ParseResult<Vec<D::Texture>>
where
    R: OffsetResolver + ?Sized,
    D: TextureDecoder,
{
    let header = TextureHeader::read_at(r, table_offset)?;
    let regions = texture_regions(&header, table_offset, r.len())?;
    tracing::debug!(count = regions.len(), "Extracting textures");

    let mut payloads = Vec::with_capacity(regions.len());
    for region in &regions {
        r.seek_file(region.start)?;
        payloads.push(r.read_bytes(region.len() as usize)?);
    }

    let decode = |(index, payload): (usize, &Vec<u8>)| {
        decoder
            .decode_texture(payload)
            .map_err(|source| ParseError::TextureDecode {
                index,
                source: Box::new(source),
            })
    };

    if parallel {
        payloads.par_iter().enumerate().map(decode).collect()
    } else {
        payloads.iter().enumerate().map(decode).collect()
    }
}
