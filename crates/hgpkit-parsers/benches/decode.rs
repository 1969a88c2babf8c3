//! Benchmarks for the HGP decoder
//!
//! Run with: cargo bench

use std::hint::black_box;
use std::io::Cursor;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use hgpkit_parsers::{
    HgpParser, Matrix, ParseOptions, Parser, ResolverStrategy, BODY_OFFSET,
};

const ELEMENTS_PER_CHUNK: u32 = 96;
const VERTEX_BYTES: u32 = 36 * 64;

struct Image(Vec<u8>);

impl Image {
    fn put(&mut self, offset: u32, bytes: &[u8]) {
        let pos = BODY_OFFSET as usize + offset as usize;
        if self.0.len() < pos + bytes.len() {
            self.0.resize(pos + bytes.len(), 0);
        }
        self.0[pos..pos + bytes.len()].copy_from_slice(bytes);
    }

    fn u32(&mut self, offset: u32, value: u32) {
        self.put(offset, &value.to_le_bytes());
    }
}

/// File with a linear mesh tree of `meshes` nodes (at most 128), one chunk per mesh
fn synthetic_file(meshes: u8) -> Vec<u8> {
    let n = u32::from(meshes);
    let mut img = Image(vec![0u8; BODY_OFFSET as usize]);

    let materials = 0x20;
    let vertices = 0xF0;
    let model = 0x110;
    let tree = 0x200;
    let local = tree + n * 0x60;
    let layers = local + n * 64;
    let slot = layers + 0x14;
    let records = slot + n * 4;
    let per_mesh = 0x14 + 0x44 + 0x50 + ELEMENTS_PER_CHUNK * 2;
    let vertex_data = records + n * per_mesh;

    img.0[0x0C..0x10].copy_from_slice(&materials.to_le_bytes());
    img.0[0x14..0x18].copy_from_slice(&vertices.to_le_bytes());
    img.0[0x18..0x1C].copy_from_slice(&model.to_le_bytes());

    img.u32(materials, 1);
    img.u32(materials + 4, 0x30);
    img.put(0x30 + 0x78, &(-1i16).to_le_bytes());

    img.u32(vertices, 1);
    img.u32(vertices + 0x10, VERTEX_BYTES);
    img.u32(vertices + 0x18, vertex_data - vertices);

    img.u32(model + 0x14, tree);
    img.u32(model + 0x18, local);
    img.u32(model + 0x24, layers);
    img.put(model + 0x7C, &[meshes]);
    img.put(model + 0x7E, &[1]);

    let step = Matrix::from_translation(glam::Vec3::new(0.0, 1.0, 0.0));
    for i in 0..n {
        let parent = if i == 0 { -1i8 } else { (i - 1) as i8 };
        img.put(tree + i * 0x60 + 0x50, &parent.to_le_bytes());
        let cols: Vec<u8> = step
            .to_cols_array()
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        img.put(local + i * 64, &cols);
    }

    img.u32(layers + 4, slot);
    for i in 0..n {
        let header = records + i * per_mesh;
        let mesh = header + 0x14;
        let chunk = mesh + 0x44;
        let elements = chunk + 0x50;

        img.u32(slot + i * 4, header);
        img.u32(header + 0x0C, mesh);
        img.u32(mesh + 0x0C, 89);
        img.u32(mesh + 0x1C, 1);
        img.u32(mesh + 0x30, chunk);
        img.u32(chunk + 0x04, 4);
        img.put(chunk + 0x08, &(ELEMENTS_PER_CHUNK as u16).to_le_bytes());
        img.u32(chunk + 0x0C, elements);
        let indices: Vec<u8> = (0..ELEMENTS_PER_CHUNK as u16)
            .flat_map(|e| (e % 64).to_le_bytes())
            .collect();
        img.put(elements, &indices);
    }

    img.put(vertex_data, &vec![0x11; VERTEX_BYTES as usize]);
    img.0
}

/// Benchmark the two resolver strategies and the parallel walk
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    let parser = HgpParser::new();

    for meshes in [8u8, 64, 127] {
        let bytes = synthetic_file(meshes);
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        let variants = [
            ("bulk", ResolverStrategy::Bulk, false),
            ("streaming", ResolverStrategy::Streaming, false),
            ("bulk_parallel", ResolverStrategy::Bulk, true),
        ];

        for (name, strategy, parallel_walk) in variants {
            let options = ParseOptions {
                strategy,
                parallel_walk,
                ..ParseOptions::default()
            };
            group.bench_with_input(BenchmarkId::new(name, meshes), &bytes, |b, bytes| {
                b.iter(|| {
                    parser
                        .parse_with_options(Cursor::new(black_box(bytes.as_slice())), &options, None)
                        .map(|asset| asset.model.chunks.len())
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_decode);
criterion_main!(benches);
