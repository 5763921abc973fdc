//! # Scene
//!
//! Plain scene-side types and the helpers that turn them into extraction
//! records.
//!
//! ```rust
//! use krepel_core::Owned;
//! use krepel_rendering::extraction::{BufferMode, ExtractionBuffer, Extractor, RecordKind};
//! use krepel_rendering::resource::{Sampler, ShaderProgram, Texture, VertexBuffer};
//! use krepel_rendering::scene::{self, Camera2D, Sprite, Transform2D, Vec2};
//!
//! let texture = Owned::new(Texture::new("hero", 16, 16));
//! let shader = Owned::new(ShaderProgram::new("sprite"));
//! let quad = Owned::new(VertexBuffer::unit_quad());
//! let sampler = Owned::new(Sampler::default());
//! let hero = Sprite::new(&texture, &shader, &quad, &sampler);
//!
//! let mut buffer = ExtractionBuffer::new(256, BufferMode::WriteOnly);
//! let mut extractor = Extractor::new(&mut buffer);
//! scene::extract_camera(&mut extractor, &Camera2D::default());
//! scene::extract_sprite(&mut extractor, &hero, Transform2D::new(Vec2::new(4.0, 2.0), 0.0));
//!
//! let kinds: Vec<RecordKind> = buffer.iter().map(|record| record.kind()).collect();
//! assert_eq!(kinds, [RecordKind::Camera, RecordKind::Sprite]);
//! ```

mod color;
mod sprite;
mod transform;

pub use color::Color;
pub use sprite::{Camera2D, Sprite};
pub use transform::{Mat4, Transform2D, Vec2, DEFAULT_EPSILON};

use crate::extraction::{CircleData, Extractor, LineData, SpriteData};

/// Records `sprite` drawn at `transform`.
pub fn extract_sprite<'e>(
    extractor: &'e mut Extractor<'_>,
    sprite: &Sprite,
    transform: Transform2D,
) -> &'e mut SpriteData {
    extractor.allocate(SpriteData {
        texture: sprite.texture().clone(),
        shader: sprite.shader().clone(),
        vertex_buffer: sprite.vertex_buffer().clone(),
        sampler: sprite.sampler().clone(),
        transform,
        size: sprite.size,
        color: sprite.color,
    })
}

/// Records `camera` for the draws that follow.
pub fn extract_camera(extractor: &mut Extractor<'_>, camera: &Camera2D) {
    extractor.set_camera(camera.view_matrix(), camera.projection_matrix());
}

/// Records a debug line.
pub fn extract_line(extractor: &mut Extractor<'_>, start: Vec2, end: Vec2, color: Color) {
    extractor.allocate(LineData { start, end, color });
}

/// Records a debug circle outline.
pub fn extract_circle(extractor: &mut Extractor<'_>, center: Vec2, radius: f32, color: Color) {
    extractor.allocate(CircleData {
        center,
        radius,
        color,
    });
}
