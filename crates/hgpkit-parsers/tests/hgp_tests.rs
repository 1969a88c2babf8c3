//! Integration tests for the HGP decoder
//!
//! Every test decodes a small file crafted byte by byte:
//! - One DXT1 texture, one material, one vertex block
//! - A single root mesh and three layers
//! - Layer 0 holds an even slot, layer 1 an odd (static) slot, layer 2 is empty

use std::io::Cursor;

use glam::Vec3;
use hgpkit_parsers::{
    Diagnostic, HgpParser, HumanReadable, LayerSelection, Matrix, ParseError, ParseOptions,
    Parser, ResolverStrategy, TextureFormat, BODY_OFFSET,
};

const TEXTURES: u32 = 0x000;
const MATERIALS: u32 = 0x040;
const MATERIAL_0: u32 = 0x050;
const VERTICES: u32 = 0x110;
const MODEL: u32 = 0x130;
const TREE: u32 = 0x1F0;
const LOCAL: u32 = 0x250;
const STATIC: u32 = 0x290;
const LAYERS: u32 = 0x2D0;
const SLOT_0: u32 = 0x310;
const HEADER_A: u32 = 0x318;
const HEADER_B: u32 = 0x330;
const MESH_A: u32 = 0x350;
const MESH_B: u32 = 0x3A0;
const CHUNK_A: u32 = 0x3F0;
const CHUNK_B: u32 = 0x440;
const ELEMENTS: u32 = 0x490;
const NAMES: u32 = 0x4A0;
const TEXTURE_BLOCK: u32 = 0x4B0;
const VERTEX_DATA: u32 = 0x550;
const VERTEX_BYTES: u32 = 3 * 36;

/// Little-endian writer over a file image, addressed by body offset
struct HgpBuilder {
    data: Vec<u8>,
}

impl HgpBuilder {
    fn new() -> Self {
        Self {
            data: vec![0u8; BODY_OFFSET as usize],
        }
    }

    fn put(&mut self, pos: usize, bytes: &[u8]) -> &mut Self {
        if self.data.len() < pos + bytes.len() {
            self.data.resize(pos + bytes.len(), 0);
        }
        self.data[pos..pos + bytes.len()].copy_from_slice(bytes);
        self
    }

    fn header(&mut self, pos: usize, value: u32) -> &mut Self {
        self.put(pos, &value.to_le_bytes())
    }

    fn bytes(&mut self, offset: u32, bytes: &[u8]) -> &mut Self {
        self.put(BODY_OFFSET as usize + offset as usize, bytes)
    }

    fn u8(&mut self, offset: u32, value: u8) -> &mut Self {
        self.bytes(offset, &[value])
    }

    fn u16(&mut self, offset: u32, value: u16) -> &mut Self {
        self.bytes(offset, &value.to_le_bytes())
    }

    fn u32(&mut self, offset: u32, value: u32) -> &mut Self {
        self.bytes(offset, &value.to_le_bytes())
    }

    fn f32(&mut self, offset: u32, value: f32) -> &mut Self {
        self.bytes(offset, &value.to_le_bytes())
    }

    fn matrix(&mut self, offset: u32, value: &Matrix) -> &mut Self {
        for (i, v) in value.to_cols_array().iter().enumerate() {
            self.f32(offset + 4 * i as u32, *v);
        }
        self
    }

    fn mesh(&mut self, offset: u32, vertex_type: u32, vertex_block: u32, chunk: u32) -> &mut Self {
        self.u32(offset, 0)
            .u32(offset + 0x08, 0)
            .u32(offset + 0x0C, vertex_type)
            .u32(offset + 0x1C, vertex_block)
            .u32(offset + 0x30, chunk)
    }

    fn chunk(&mut self, offset: u32, elements_offset: u32, elements: &[u16]) -> &mut Self {
        self.u32(offset, 0)
            .u32(offset + 0x04, 5)
            .u16(offset + 0x08, elements.len() as u16)
            .u32(offset + 0x0C, elements_offset);
        for (i, e) in elements.iter().enumerate() {
            self.u16(elements_offset + 2 * i as u32, *e);
        }
        self
    }

    fn build(&self) -> Vec<u8> {
        self.data.clone()
    }
}

/// 4x4 DXT1 image, single mip
fn dds_image() -> Vec<u8> {
    let mut header = [0u8; 124];
    header[0..4].copy_from_slice(&124u32.to_le_bytes());
    header[8..12].copy_from_slice(&4u32.to_le_bytes());
    header[12..16].copy_from_slice(&4u32.to_le_bytes());
    header[24..28].copy_from_slice(&1u32.to_le_bytes());
    header[72..76].copy_from_slice(&32u32.to_le_bytes());
    header[76..80].copy_from_slice(&4u32.to_le_bytes());
    header[80..84].copy_from_slice(b"DXT1");

    let mut image = b"DDS ".to_vec();
    image.extend_from_slice(&header);
    image.extend_from_slice(&[0x55; 8]);
    image
}

fn minimal_file() -> HgpBuilder {
    let dds = dds_image();
    let mut b = HgpBuilder::new();

    b.header(0x08, TEXTURES)
        .header(0x0C, MATERIALS)
        .header(0x14, VERTICES)
        .header(0x18, MODEL);

    // Texture table: one entry at the start of the block
    b.u32(TEXTURES, TEXTURE_BLOCK - TEXTURES)
        .u32(TEXTURES + 4, 12 + dds.len() as u32)
        .u32(TEXTURES + 8, 1)
        .u32(TEXTURES + 0x1C, 0);
    b.bytes(TEXTURE_BLOCK + 12, &dds);

    // Material table; texture reference uses the high-bit form
    b.u32(MATERIALS, 1).u32(MATERIALS + 4, MATERIAL_0);
    b.f32(MATERIAL_0 + 0x54, 0.5)
        .f32(MATERIAL_0 + 0x58, 0.25)
        .f32(MATERIAL_0 + 0x5C, 1.0)
        .u32(MATERIAL_0 + 0x74, 0xFF)
        .u16(MATERIAL_0 + 0x78, 0x8000);

    b.u32(VERTICES, 1)
        .u32(VERTICES + 0x10, VERTEX_BYTES)
        .u32(VERTICES + 0x14, 7)
        .u32(VERTICES + 0x18, VERTEX_DATA - VERTICES);

    b.u32(MODEL + 0x14, TREE)
        .u32(MODEL + 0x18, LOCAL)
        .u32(MODEL + 0x1C, STATIC)
        .u32(MODEL + 0x24, LAYERS)
        .u8(MODEL + 0x7C, 1)
        .u8(MODEL + 0x7E, 3);

    b.u8(TREE + 0x50, 0xFF);
    b.matrix(LOCAL, &Matrix::IDENTITY);
    b.matrix(STATIC, &Matrix::from_translation(Vec3::new(0.0, 0.0, 5.0)));

    b.u32(LAYERS, NAMES).u32(LAYERS + 4, SLOT_0);
    b.u32(LAYERS + 0x14, NAMES + 5).u32(LAYERS + 0x14 + 8, HEADER_B);
    b.bytes(NAMES, b"high\0low\0");

    b.u32(SLOT_0, HEADER_A);
    b.u32(HEADER_A + 0x0C, MESH_A).u32(HEADER_B + 0x0C, MESH_B);
    b.mesh(MESH_A, 89, 1, CHUNK_A).mesh(MESH_B, 89, 1, CHUNK_B);
    b.chunk(CHUNK_A, ELEMENTS, &[0, 1, 2])
        .chunk(CHUNK_B, ELEMENTS + 8, &[2, 1, 0]);

    let vertices: Vec<u8> = (0..VERTEX_BYTES).map(|i| i as u8).collect();
    b.bytes(VERTEX_DATA, &vertices);

    let len = b.data.len() as u32;
    b.header(0x2C, len);
    b
}

fn decode(bytes: Vec<u8>, options: &ParseOptions) -> Result<hgpkit_parsers::HgpAsset<hgpkit_parsers::DdsTexture>, ParseError> {
    HgpParser::new().parse_with_options(Cursor::new(bytes), options, None)
}

fn streaming() -> ParseOptions {
    ParseOptions {
        strategy: ResolverStrategy::Streaming,
        ..ParseOptions::default()
    }
}

mod minimal_file_tests {
    use super::*;

    #[test]
    fn test_minimal_model() {
        let asset = decode(minimal_file().build(), &ParseOptions::default()).unwrap();
        let model = &asset.model;

        assert_eq!(model.textures.len(), 1);
        assert_eq!(model.textures[0].width(), 4);
        assert_eq!(model.textures[0].format, TextureFormat::BC1);

        assert_eq!(model.materials.len(), 1);
        assert_eq!(model.materials[0].color(), [0.5, 0.25, 1.0]);
        assert_eq!(model.materials[0].alpha, 0xFF);
        assert_eq!(model.materials[0].texture_idx, Some(0));

        assert_eq!(model.vertex_buffers.len(), 1);
        assert_eq!(model.vertex_buffers[0].id, 7);
        assert_eq!(model.vertex_buffers[0].stride, 36);
        assert_eq!(model.vertex_buffers[0].size(), VERTEX_BYTES as usize);
        assert_eq!(model.vertex_buffers[0].data[5], 5);

        assert_eq!(model.chunks.len(), 1);
        let chunk = &model.chunks[0];
        assert_eq!(chunk.elements, vec![0, 1, 2]);
        assert_eq!(chunk.primitive_type, 5);
        assert_eq!(chunk.vertex_buffer_idx, 0);
        assert_eq!(chunk.material_idx, 0);
        assert_eq!(chunk.transform, Matrix::IDENTITY);

        assert!(asset.diagnostics.is_empty());
        assert_eq!(asset.file_length as usize, minimal_file().build().len());
    }

    #[test]
    fn test_layer_listing() {
        let asset = decode(minimal_file().build(), &ParseOptions::default()).unwrap();

        let names: Vec<_> = asset.layers.iter().map(|l| l.name.as_deref()).collect();
        assert_eq!(names, vec![Some("high"), Some("low"), None]);

        let selected: Vec<_> = asset.layers.iter().map(|l| l.selected).collect();
        assert_eq!(selected, vec![true, false, true]);
    }

    #[test]
    fn test_model_lookups() {
        let asset = decode(minimal_file().build(), &ParseOptions::default()).unwrap();
        let model = &asset.model;
        let chunk = &model.chunks[0];

        let material = model.material_for(chunk).unwrap();
        assert!(material.is_textured());
        assert_eq!(model.texture_for(material).unwrap().height(), 4);
        assert_eq!(model.vertex_buffer_for(chunk).unwrap().vertex_count(), Some(3));
    }

    #[test]
    fn test_custom_texture_decoder() {
        let parser = HgpParser::with_decoder(|data: &[u8]| -> Result<usize, ParseError> { Ok(data.len()) });
        let asset = parser.parse(Cursor::new(minimal_file().build())).unwrap();
        assert_eq!(asset.model.textures, vec![dds_image().len()]);
    }
}

mod strategy_tests {
    use super::*;

    #[test]
    fn test_bulk_and_streaming_agree() {
        let bytes = minimal_file().build();
        let options = ParseOptions {
            layers: LayerSelection::All,
            ..ParseOptions::default()
        };
        let bulk = decode(bytes.clone(), &options).unwrap();
        let stream = decode(
            bytes,
            &ParseOptions {
                strategy: ResolverStrategy::Streaming,
                ..options
            },
        )
        .unwrap();

        assert_eq!(bulk.model.chunks, stream.model.chunks);
        assert_eq!(bulk.model.vertex_buffers, stream.model.vertex_buffers);
        assert_eq!(bulk.model.materials, stream.model.materials);
        assert_eq!(bulk.model.textures[0].data, stream.model.textures[0].data);
        assert_eq!(bulk.layers, stream.layers);
        assert_eq!(bulk.diagnostics, stream.diagnostics);
    }

    #[test]
    fn test_parallel_walk_agrees() {
        let bytes = minimal_file().build();
        let sequential = decode(bytes.clone(), &ParseOptions::default()).unwrap();
        let parallel = decode(
            bytes,
            &ParseOptions {
                parallel_walk: true,
                ..ParseOptions::default()
            },
        )
        .unwrap();

        assert_eq!(sequential.model.chunks, parallel.model.chunks);
        assert_eq!(sequential.model.vertex_buffers, parallel.model.vertex_buffers);
    }

    #[test]
    fn test_parse_file_memory_mapped() {
        let path = std::env::temp_dir().join(format!("hgpkit-{}.hgp", std::process::id()));
        std::fs::write(&path, minimal_file().build()).unwrap();

        let parser = HgpParser::new();
        assert!(parser.can_parse(&path));

        let options = ParseOptions {
            memory_mapping_threshold: 0,
            ..ParseOptions::default()
        };
        let mapped = parser.parse_file_with_options(&path, &options, None);
        let buffered = parser.parse_file_with_options(
            &path,
            &ParseOptions {
                use_memory_mapping: false,
                ..ParseOptions::default()
            },
            None,
        );
        std::fs::remove_file(&path).unwrap();

        assert_eq!(mapped.unwrap().model.chunks, buffered.unwrap().model.chunks);
    }
}

mod layer_tests {
    use super::*;

    #[test]
    fn test_static_slot_transform() {
        let options = ParseOptions {
            layers: LayerSelection::indices([1]),
            ..ParseOptions::default()
        };
        let asset = decode(minimal_file().build(), &options).unwrap();

        assert_eq!(asset.model.chunks.len(), 1);
        assert_eq!(asset.model.chunks[0].elements, vec![2, 1, 0]);
        assert_eq!(
            asset.model.chunks[0].transform,
            Matrix::from_translation(Vec3::new(0.0, 0.0, 5.0))
        );
    }

    #[test]
    fn test_all_layers_in_order() {
        let options = ParseOptions {
            layers: LayerSelection::All,
            ..ParseOptions::default()
        };
        let asset = decode(minimal_file().build(), &options).unwrap();

        let elements: Vec<_> = asset.model.chunks.iter().map(|c| c.elements.clone()).collect();
        assert_eq!(elements, vec![vec![0, 1, 2], vec![2, 1, 0]]);
    }

    #[test]
    fn test_missing_layer_is_diagnostic() {
        let options = ParseOptions {
            layers: LayerSelection::indices([0, 9]),
            ..ParseOptions::default()
        };
        let asset = decode(minimal_file().build(), &options).unwrap();

        assert_eq!(asset.model.chunks.len(), 1);
        assert_eq!(
            asset.diagnostics,
            vec![Diagnostic::LayerOutOfRange { layer: 9, num_layers: 3 }]
        );
    }

    #[test]
    fn test_options_from_json() {
        let options = ParseOptions::from_json(r#"{ "layers": "all", "strategy": "streaming" }"#).unwrap();
        let asset = decode(minimal_file().build(), &options).unwrap();
        assert_eq!(asset.model.chunks.len(), 2);
    }
}

mod error_tests {
    use super::*;

    #[test]
    fn test_unknown_vertex_type_recovers() {
        let mut b = minimal_file();
        b.u32(MESH_A + 0x0C, 42);
        let asset = decode(b.build(), &ParseOptions::default()).unwrap();

        assert_eq!(asset.model.chunks.len(), 1);
        assert_eq!(asset.model.vertex_buffers[0].stride, 0);
        assert_eq!(
            asset.diagnostics,
            vec![Diagnostic::UnknownVertexType {
                vertex_type: 42,
                mesh_offset: MESH_A,
            }]
        );
    }

    #[test]
    fn test_unknown_vertex_type_strict() {
        let mut b = minimal_file();
        b.u32(MESH_A + 0x0C, 42);
        let options = ParseOptions {
            strict_validation: true,
            ..ParseOptions::default()
        };
        let err = decode(b.build(), &options).unwrap_err();
        assert!(matches!(err, ParseError::UnknownVertexType { vertex_type: 42, .. }));
    }

    #[test]
    fn test_vertex_block_zero_rejected() {
        let mut b = minimal_file();
        b.u32(MESH_A + 0x1C, 0);
        let err = decode(b.build(), &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidIndex { .. }));
    }

    #[test]
    fn test_self_parent_rejected() {
        let mut b = minimal_file();
        b.u8(TREE + 0x50, 0);
        let err = decode(b.build(), &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidIndex { .. }));
    }

    #[test]
    fn test_mesh_chain_cycle_rejected() {
        let mut b = minimal_file();
        b.u32(MESH_A, MESH_A);
        for options in [ParseOptions::default(), streaming()] {
            let err = decode(b.build(), &options).unwrap_err();
            assert!(matches!(err, ParseError::CorruptedData { .. }));
        }
    }

    #[test]
    fn test_broken_texture_reports_index() {
        let mut b = minimal_file();
        b.bytes(TEXTURE_BLOCK + 12, b"XXXX");
        let err = decode(b.build(), &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::TextureDecode { index: 0, .. }));
    }

    #[test]
    fn test_every_truncation_fails() {
        let bytes = minimal_file().build();
        for len in 0..bytes.len() {
            let cut = bytes[..len].to_vec();
            assert!(
                decode(cut.clone(), &ParseOptions::default()).is_err(),
                "bulk decode of {len} bytes succeeded"
            );
            if len % 7 == 0 {
                assert!(decode(cut, &streaming()).is_err(), "streaming decode of {len} bytes succeeded");
            }
        }
    }

    #[test]
    fn test_file_ending_inside_texture_block() {
        let bytes = minimal_file().build();
        let block_start = BODY_OFFSET + u64::from(TEXTURE_BLOCK);
        let cut_at = block_start as usize + 12 + dds_image().len() - 2;
        let cut = bytes[..cut_at].to_vec();
        for options in [ParseOptions::default(), streaming()] {
            let err = decode(cut.clone(), &options).unwrap_err();
            assert!(
                matches!(err, ParseError::OutOfBounds { offset, .. } if offset == block_start),
                "unexpected error: {err:?}"
            );
        }
    }

    #[test]
    fn test_truncated_vertex_data_is_bounds_error() {
        let bytes = minimal_file().build();
        let cut = bytes[..bytes.len() - 1].to_vec();
        for options in [ParseOptions::default(), streaming()] {
            let err = decode(cut.clone(), &options).unwrap_err();
            assert!(matches!(err, ParseError::OutOfBounds { .. }));
            assert!(err.is_corruption());
        }
    }
}

mod readable_tests {
    use super::*;

    #[test]
    fn test_readable_summary() {
        let asset = decode(minimal_file().build(), &ParseOptions::default()).unwrap();

        let text = asset.to_readable_string();
        assert!(text.contains("Chunks: 1 (3 indices)"));
        assert!(text.contains("[0] high (decoded)"));
        assert!(text.contains("stride 36"));

        let json = asset.to_json();
        assert_eq!(json["textures"], 1);
        assert_eq!(json["vertex_buffers"][0]["stride"], 36);
        assert_eq!(json["layers"][1]["name"], "low");

        assert!(asset.to_yaml().contains("chunks: 1"));
    }
}
