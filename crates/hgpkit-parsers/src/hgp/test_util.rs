//! Byte-level helpers for crafting HGP fragments in unit tests

use hgpkit_core::Matrix;

use crate::resolver::{BulkResolver, BODY_OFFSET};

/// Growable file image with body-relative writers
pub(crate) struct BodyWriter {
    pub data: Vec<u8>,
}

impl BodyWriter {
    /// Zeroed preamble plus `body_len` zeroed body bytes
    pub fn new(body_len: usize) -> Self {
        Self {
            data: vec![0u8; BODY_OFFSET as usize + body_len],
        }
    }

    fn put(&mut self, pos: usize, bytes: &[u8]) -> &mut Self {
        if self.data.len() < pos + bytes.len() {
            self.data.resize(pos + bytes.len(), 0);
        }
        self.data[pos..pos + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn file_u32(&mut self, pos: usize, value: u32) -> &mut Self {
        self.put(pos, &value.to_le_bytes())
    }

    pub fn bytes(&mut self, offset: u32, bytes: &[u8]) -> &mut Self {
        self.put(BODY_OFFSET as usize + offset as usize, bytes)
    }

    pub fn u8(&mut self, offset: u32, value: u8) -> &mut Self {
        self.bytes(offset, &[value])
    }

    pub fn i8(&mut self, offset: u32, value: i8) -> &mut Self {
        self.bytes(offset, &value.to_le_bytes())
    }

    pub fn u16(&mut self, offset: u32, value: u16) -> &mut Self {
        self.bytes(offset, &value.to_le_bytes())
    }

    pub fn i16(&mut self, offset: u32, value: i16) -> &mut Self {
        self.bytes(offset, &value.to_le_bytes())
    }

    pub fn u32(&mut self, offset: u32, value: u32) -> &mut Self {
        self.bytes(offset, &value.to_le_bytes())
    }

    pub fn f32(&mut self, offset: u32, value: f32) -> &mut Self {
        self.bytes(offset, &value.to_le_bytes())
    }

    pub fn matrix(&mut self, offset: u32, value: &Matrix) -> &mut Self {
        let bytes: Vec<u8> = value
            .to_cols_array()
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        self.bytes(offset, &bytes)
    }

    /// Mesh record at `offset` (0x44 bytes)
    pub fn mesh(
        &mut self,
        offset: u32,
        next: u32,
        material_idx: u32,
        vertex_type: u32,
        vertex_block_idx: u32,
        chunk_offset: u32,
    ) -> &mut Self {
        self.u32(offset, next)
            .u32(offset + 0x08, material_idx)
            .u32(offset + 0x0C, vertex_type)
            .u32(offset + 0x1C, vertex_block_idx)
            .u32(offset + 0x30, chunk_offset)
            .u32(offset + 0x40, 0)
    }

    /// Chunk record at `offset` (0x50 bytes) plus its index data
    pub fn chunk(
        &mut self,
        offset: u32,
        next: u32,
        primitive_type: u32,
        elements_offset: u32,
        elements: &[u16],
    ) -> &mut Self {
        self.u32(offset, next)
            .u32(offset + 0x04, primitive_type)
            .u16(offset + 0x08, elements.len() as u16)
            .u32(offset + 0x0C, elements_offset)
            .u32(offset + 0x4C, 0);
        for (i, element) in elements.iter().enumerate() {
            self.u16(elements_offset + 2 * i as u32, *element);
        }
        self
    }

    pub fn resolver(&self) -> BulkResolver<&[u8]> {
        BulkResolver::new(&self.data[..])
    }
}
