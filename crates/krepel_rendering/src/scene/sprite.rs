//! Sprites and the 2D camera.

use krepel_core::{Borrowed, Owned};

use super::{Color, Mat4, Vec2};
use crate::resource::{Sampler, ShaderProgram, Texture, VertexBuffer};

/// A textured quad.
///
/// Holds borrows of its resources, so their owners cannot release them while
/// the sprite exists. Drop sprites before the resources they reference.
#[derive(Debug, Clone)]
pub struct Sprite {
    texture: Borrowed<Texture>,
    shader: Borrowed<ShaderProgram>,
    vertex_buffer: Borrowed<VertexBuffer>,
    sampler: Borrowed<Sampler>,
    /// Size in world units. Defaults to the texture size.
    pub size: Vec2,
    /// Tint.
    pub color: Color,
}

impl Sprite {
    /// Creates a sprite drawing `texture` at its native size.
    ///
    /// # Panics
    ///
    /// Panics if `texture` holds no resource.
    #[must_use]
    pub fn new(
        texture: &Owned<Texture>,
        shader: &Owned<ShaderProgram>,
        vertex_buffer: &Owned<VertexBuffer>,
        sampler: &Owned<Sampler>,
    ) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let size = Vec2::new(texture.get().width as f32, texture.get().height as f32);
        Self {
            texture: texture.borrow(),
            shader: shader.borrow(),
            vertex_buffer: vertex_buffer.borrow(),
            sampler: sampler.borrow(),
            size,
            color: Color::WHITE,
        }
    }

    /// Sets the tint.
    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Sets the size.
    #[must_use]
    pub fn with_size(mut self, size: Vec2) -> Self {
        self.size = size;
        self
    }

    /// Texture borrow.
    #[must_use]
    pub fn texture(&self) -> &Borrowed<Texture> {
        &self.texture
    }

    /// Program borrow.
    #[must_use]
    pub fn shader(&self) -> &Borrowed<ShaderProgram> {
        &self.shader
    }

    /// Geometry borrow.
    #[must_use]
    pub fn vertex_buffer(&self) -> &Borrowed<VertexBuffer> {
        &self.vertex_buffer
    }

    /// Sampler borrow.
    #[must_use]
    pub fn sampler(&self) -> &Borrowed<Sampler> {
        &self.sampler
    }
}

/// An orthographic 2D camera centered on `position`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera2D {
    /// World point at the center of the viewport.
    pub position: Vec2,
    /// Magnification; 1.0 maps one world unit to one pixel.
    pub zoom: f32,
    /// Viewport size in pixels.
    pub viewport: Vec2,
}

impl Camera2D {
    /// Creates a camera at the origin with no zoom.
    #[must_use]
    pub const fn new(viewport: Vec2) -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            viewport,
        }
    }

    /// World to view.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::scale(self.zoom) * Mat4::translation(-self.position.x, -self.position.y)
    }

    /// View to clip.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        let half_w = self.viewport.x * 0.5;
        let half_h = self.viewport.y * 0.5;
        Mat4::orthographic(-half_w, half_w, -half_h, half_h, -1.0, 1.0)
    }
}

impl Default for Camera2D {
    fn default() -> Self {
        Self::new(Vec2::new(800.0, 600.0))
    }
}
