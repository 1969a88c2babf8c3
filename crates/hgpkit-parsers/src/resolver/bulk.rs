//! In-memory resolver

use std::io::Read;

use byteorder::{ByteOrder, LittleEndian};

use super::OffsetResolver;
use crate::traits::{ParseError, ParseResult};

/// Resolver over a fully resident byte buffer
///
/// `B` can be an owned `Vec<u8>`, a borrowed slice or a `memmap2::Mmap`.
#[derive(Debug, Clone)]
pub struct BulkResolver<B> {
    data: B,
    cursor: u64,
}

impl<B: AsRef<[u8]>> BulkResolver<B> {
    /// Wrap a buffer holding the complete file
    pub fn new(data: B) -> Self {
        Self { data, cursor: 0 }
    }

    /// Give the buffer back
    pub fn into_inner(self) -> B {
        self.data
    }

    /// Borrow `count` bytes at the cursor and advance past them
    fn take(&mut self, count: usize) -> ParseResult<&[u8]> {
        self.ensure(count)?;
        let start = self.cursor as usize;
        let bytes = self
            .data
            .as_ref()
            .get(start..start + count)
            .ok_or(ParseError::OutOfBounds {
                offset: self.cursor,
                requested: count,
                available: 0,
            })?;
        self.cursor += count as u64;
        Ok(bytes)
    }
}

impl BulkResolver<Vec<u8>> {
    /// Read an entire stream into an owned buffer
    pub fn from_reader<R: Read>(mut reader: R) -> ParseResult<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self::new(data))
    }
}

impl<B: AsRef<[u8]>> OffsetResolver for BulkResolver<B> {
    fn seek_file(&mut self, pos: u64) -> ParseResult<()> {
        self.cursor = pos;
        Ok(())
    }

    fn skip(&mut self, count: u64) -> ParseResult<()> {
        self.cursor = self
            .cursor
            .checked_add(count)
            .ok_or_else(|| ParseError::CorruptedData {
                offset: self.cursor,
                message: format!("skip of {count} bytes overflows"),
            })?;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.cursor
    }

    fn len(&self) -> u64 {
        self.data.as_ref().len() as u64
    }

    fn read_bytes(&mut self, count: usize) -> ParseResult<Vec<u8>> {
        Ok(self.take(count)?.to_vec())
    }

    fn read_u8(&mut self) -> ParseResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> ParseResult<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    fn read_u32(&mut self) -> ParseResult<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    fn read_f32(&mut self) -> ParseResult<f32> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    fn read_u16_array(&mut self, count: usize) -> ParseResult<Vec<u16>> {
        let bytes = self.take(count.saturating_mul(2))?;
        let mut values = vec![0u16; count];
        LittleEndian::read_u16_into(bytes, &mut values);
        Ok(values)
    }

    fn shared_bytes(&self) -> Option<&[u8]> {
        Some(self.data.as_ref())
    }
}
