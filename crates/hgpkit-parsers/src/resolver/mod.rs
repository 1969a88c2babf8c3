//! Offset resolution
//!
//! HGP files address almost everything through byte offsets relative to the
//! start of the body, which sits right after a fixed 0x30-byte preamble.
//! [`OffsetResolver`] turns such offsets into typed reads. Two backends are
//! provided and are interchangeable from the decoder's point of view:
//!
//! - [`BulkResolver`]: the whole file is held in memory (owned buffer,
//!   borrowed slice or memory map) and each read is a bounds-checked slice.
//! - [`StreamResolver`]: every read is a seek followed by sequential reads
//!   on a `Read + Seek` stream.
//!
//! Both refuse any read that would cross the end of the input.

mod bulk;
mod stream;

pub use bulk::BulkResolver;
pub use stream::StreamResolver;

use hgpkit_core::Matrix;

use crate::traits::{ParseError, ParseResult};

/// Size of the preamble that precedes the body
pub const BODY_OFFSET: u64 = 0x30;

/// Longest NUL-terminated string `read_cstring` will look for
pub const MAX_CSTRING_LEN: usize = 256;

/// Cursor-based typed reader over an HGP file
///
/// All multi-byte values are little-endian. Every read advances the cursor.
pub trait OffsetResolver {
    /// Move the cursor to an absolute file position
    fn seek_file(&mut self, pos: u64) -> ParseResult<()>;

    /// Skip `count` bytes from the current position
    fn skip(&mut self, count: u64) -> ParseResult<()>;

    /// Current absolute file position
    fn position(&self) -> u64;

    /// Total length of the input in bytes
    fn len(&self) -> u64;

    /// Check if the input is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read `count` raw bytes into an owned buffer
    fn read_bytes(&mut self, count: usize) -> ParseResult<Vec<u8>>;

    fn read_u8(&mut self) -> ParseResult<u8>;
    fn read_u16(&mut self) -> ParseResult<u16>;
    fn read_u32(&mut self) -> ParseResult<u32>;
    fn read_f32(&mut self) -> ParseResult<f32>;

    /// The complete input, when it is resident in memory
    fn shared_bytes(&self) -> Option<&[u8]> {
        None
    }

    /// Move the cursor to a body-relative offset
    fn seek_body(&mut self, offset: u32) -> ParseResult<()> {
        self.seek_file(BODY_OFFSET + u64::from(offset))
    }

    /// Fail unless `count` more bytes can be read from the cursor
    fn ensure(&self, count: usize) -> ParseResult<()> {
        let offset = self.position();
        let len = self.len();
        let available = len.saturating_sub(offset);
        if offset > len || count as u64 > available {
            return Err(ParseError::OutOfBounds {
                offset,
                requested: count,
                available,
            });
        }
        Ok(())
    }

    fn read_i8(&mut self) -> ParseResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    fn read_i16(&mut self) -> ParseResult<i16> {
        Ok(self.read_u16()? as i16)
    }

    /// Read 16 floats as a column-major 4x4 matrix
    fn read_matrix(&mut self) -> ParseResult<Matrix> {
        self.ensure(64)?;
        let mut cols = [0.0f32; 16];
        for value in cols.iter_mut() {
            *value = self.read_f32()?;
        }
        Ok(Matrix::from_cols_array(&cols))
    }

    /// Read `count` consecutive 16-bit values
    fn read_u16_array(&mut self, count: usize) -> ParseResult<Vec<u16>> {
        self.ensure(count.saturating_mul(2))?;
        (0..count).map(|_| self.read_u16()).collect()
    }

    /// Read `count` consecutive 32-bit values
    fn read_u32_array(&mut self, count: usize) -> ParseResult<Vec<u32>> {
        self.ensure(count.saturating_mul(4))?;
        (0..count).map(|_| self.read_u32()).collect()
    }

    /// Read a NUL-terminated string of at most [`MAX_CSTRING_LEN`] bytes
    fn read_cstring(&mut self) -> ParseResult<String> {
        let start = self.position();
        let mut bytes = Vec::new();
        loop {
            let byte = self.read_u8()?;
            if byte == 0 {
                break;
            }
            if bytes.len() == MAX_CSTRING_LEN {
                return Err(ParseError::CorruptedData {
                    offset: start,
                    message: format!("string longer than {} bytes", MAX_CSTRING_LEN),
                });
            }
            bytes.push(byte);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl<T: OffsetResolver + ?Sized> OffsetResolver for &mut T {
    fn seek_file(&mut self, pos: u64) -> ParseResult<()> {
        (**self).seek_file(pos)
    }

    fn skip(&mut self, count: u64) -> ParseResult<()> {
        (**self).skip(count)
    }

    fn position(&self) -> u64 {
        (**self).position()
    }

    fn len(&self) -> u64 {
        (**self).len()
    }

    fn read_bytes(&mut self, count: usize) -> ParseResult<Vec<u8>> {
        (**self).read_bytes(count)
    }

    fn read_u8(&mut self) -> ParseResult<u8> {
        (**self).read_u8()
    }

    fn read_u16(&mut self) -> ParseResult<u16> {
        (**self).read_u16()
    }

    fn read_u32(&mut self) -> ParseResult<u32> {
        (**self).read_u32()
    }

    fn read_f32(&mut self) -> ParseResult<f32> {
        (**self).read_f32()
    }

    fn shared_bytes(&self) -> Option<&[u8]> {
        (**self).shared_bytes()
    }
}
