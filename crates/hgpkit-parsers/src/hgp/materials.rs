//! Material table extraction

use hgpkit_core::Material;

use super::diagnostics::Diagnostic;
use super::structs::{MaterialHeader, MaterialRecord, Record};
use crate::resolver::OffsetResolver;
use crate::traits::ParseResult;

/// Flag marking a texture reference stored with its high bit set
const TEXTURE_FLAG: u16 = 0x8000;

/// Map a raw on-disk texture reference to a texture index
///
/// `-1` means untextured. Any other value with the high bit set carries
/// the index in its low 15 bits.
pub fn normalize_texture_index(raw: i16) -> Option<u16> {
    if raw == -1 {
        return None;
    }
    let bits = raw as u16;
    if bits & TEXTURE_FLAG != 0 {
        Some(bits & !TEXTURE_FLAG)
    } else {
        Some(bits)
    }
}

/// Read every material referenced by the material table
///
/// Texture references past `texture_count` are kept as-is and reported as
/// diagnostics; consumers resolve them through [`hgpkit_core::Model::texture_for`].
pub fn extract_materials<R: OffsetResolver + ?Sized>(
    r: &mut R,
    table_offset: u32,
    texture_count: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> ParseResult<Vec<Material>> {
    let header = MaterialHeader::read_at(r, table_offset)?;
    tracing::debug!(count = header.material_offsets.len(), "Extracting materials");

    let mut materials = Vec::with_capacity(header.material_offsets.len());
    for (index, &offset) in header.material_offsets.iter().enumerate() {
        let record = MaterialRecord::read_at(r, offset)?;
        let texture_idx = normalize_texture_index(record.texture_idx);

        match texture_idx {
            Some(texture_idx) if usize::from(texture_idx) >= texture_count => {
                Diagnostic::TextureOutOfRange {
                    material: index,
                    texture_idx,
                    texture_count,
                }
                .record(diagnostics);
            }
            _ => {}
        }

        materials.push(Material {
            red: record.red,
            green: record.green,
            blue: record.blue,
            alpha: record.alpha,
            texture_idx,
        });
    }

    Ok(materials)
}
