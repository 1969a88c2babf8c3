//! Seek/read resolver

use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use super::OffsetResolver;
use crate::traits::{ParseError, ParseResult};

/// Resolver that seeks and reads on a stream
///
/// The stream length is measured once when the resolver is created; reads
/// are checked against it before touching the stream.
#[derive(Debug)]
pub struct StreamResolver<R> {
    inner: R,
    pos: u64,
    len: u64,
}

impl<R: Read + Seek> StreamResolver<R> {
    /// Wrap a stream positioned anywhere; the cursor starts at byte 0
    pub fn new(mut inner: R) -> ParseResult<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self { inner, pos: 0, len })
    }

    /// Give the stream back
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> OffsetResolver for StreamResolver<R> {
    fn seek_file(&mut self, pos: u64) -> ParseResult<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        self.pos = pos;
        Ok(())
    }

    fn skip(&mut self, count: u64) -> ParseResult<()> {
        let overflow = || ParseError::CorruptedData {
            offset: self.pos,
            message: format!("skip of {count} bytes overflows"),
        };
        let target = self.pos.checked_add(count).ok_or_else(overflow)?;
        let delta = i64::try_from(count).map_err(|_| overflow())?;
        self.inner.seek(SeekFrom::Current(delta))?;
        self.pos = target;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.pos
    }

    fn len(&self) -> u64 {
        self.len
    }

    fn read_bytes(&mut self, count: usize) -> ParseResult<Vec<u8>> {
        self.ensure(count)?;
        let mut buf = vec![0u8; count];
        self.inner.read_exact(&mut buf)?;
        self.pos += count as u64;
        Ok(buf)
    }

    fn read_u8(&mut self) -> ParseResult<u8> {
        self.ensure(1)?;
        let value = self.inner.read_u8()?;
        self.pos += 1;
        Ok(value)
    }

    fn read_u16(&mut self) -> ParseResult<u16> {
        self.ensure(2)?;
        let value = self.inner.read_u16::<LittleEndian>()?;
        self.pos += 2;
        Ok(value)
    }

    fn read_u32(&mut self) -> ParseResult<u32> {
        self.ensure(4)?;
        let value = self.inner.read_u32::<LittleEndian>()?;
        self.pos += 4;
        Ok(value)
    }

    fn read_f32(&mut self) -> ParseResult<f32> {
        self.ensure(4)?;
        let value = self.inner.read_f32::<LittleEndian>()?;
        self.pos += 4;
        Ok(value)
    }
}
