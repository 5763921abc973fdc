//! # Extraction Buffer Benchmark
//!
//! Measures a full frame of record traffic: reset, allocate N sprites,
//! drain them. After the first frame the arena has reached its steady-state
//! size, so the measured path performs no heap allocation.
//!
//! Run with: `cargo bench --package krepel_rendering`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use krepel_core::Owned;
use krepel_rendering::extraction::{BufferMode, ExtractionBuffer, LineData, SpriteData};
use krepel_rendering::{Color, Sampler, ShaderProgram, Texture, Transform2D, Vec2, VertexBuffer};

fn bench_sprite_frame(c: &mut Criterion) {
    let texture = Owned::new(Texture::new("atlas", 256, 256));
    let shader = Owned::new(ShaderProgram::new("sprite"));
    let quad = Owned::new(VertexBuffer::unit_quad());
    let sampler = Owned::new(Sampler::default());

    let mut group = c.benchmark_group("sprite_frame");
    for count in [100_usize, 1_000, 10_000] {
        let mut buffer = ExtractionBuffer::new(1024, BufferMode::WriteOnly);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                buffer.set_mode(BufferMode::WriteOnly);
                buffer.reset();
                for i in 0..count {
                    #[allow(clippy::cast_precision_loss)]
                    let x = i as f32;
                    buffer.allocate(SpriteData {
                        texture: texture.borrow(),
                        shader: shader.borrow(),
                        vertex_buffer: quad.borrow(),
                        sampler: sampler.borrow(),
                        transform: Transform2D::new(Vec2::new(x, 0.0), 0.0),
                        size: Vec2::new(16.0, 16.0),
                        color: Color::WHITE,
                    });
                }
                buffer.set_mode(BufferMode::ReadOnly);
                black_box(buffer.drain().count())
            });
        });
    }
    group.finish();
}

fn bench_plain_records(c: &mut Criterion) {
    let mut buffer = ExtractionBuffer::new(1024, BufferMode::WriteOnly);
    c.bench_function("line_records_10k", |b| {
        b.iter(|| {
            buffer.reset();
            for _ in 0..10_000 {
                buffer.allocate(LineData {
                    start: Vec2::ZERO,
                    end: Vec2::new(1.0, 1.0),
                    color: Color::RED,
                });
            }
            black_box(buffer.allocated_bytes())
        });
    });
}

criterion_group!(benches, bench_sprite_frame, bench_plain_records);
criterion_main!(benches);
