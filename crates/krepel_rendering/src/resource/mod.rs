//! # Graphics Resources
//!
//! Descriptors for the GPU-side objects a sprite references. Binding and
//! upload belong to the [`GraphicsDevice`](crate::GraphicsDevice); these
//! types only describe what should be bound. Scenes keep them in
//! [`Owned`](krepel_core::Owned) slots and hand out
//! [`Borrowed`](krepel_core::Borrowed) views to extraction records.

mod target;

pub use target::RenderTarget;

/// A 2D texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    /// Asset name, used for diagnostics.
    pub name: String,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
}

impl Texture {
    /// Creates a texture descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }
}

/// A linked vertex + fragment program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderProgram {
    /// Program name.
    pub name: String,
    /// Vertex stage entry point.
    pub vertex_entry: String,
    /// Fragment stage entry point.
    pub fragment_entry: String,
}

impl ShaderProgram {
    /// Creates a program descriptor with `vs_main` / `fs_main` entry points.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertex_entry: "vs_main".to_owned(),
            fragment_entry: "fs_main".to_owned(),
        }
    }
}

/// Texel filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Nearest texel.
    #[default]
    Nearest,
    /// Bilinear.
    Linear,
}

/// Addressing outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// Clamp to the edge texel.
    #[default]
    Clamp,
    /// Tile.
    Repeat,
}

/// Sampler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sampler {
    /// Filtering.
    pub filter: FilterMode,
    /// Wrapping.
    pub wrap: WrapMode,
}

/// Vertex data for a mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexBuffer {
    /// Buffer name.
    pub name: String,
    /// Number of vertices.
    pub vertex_count: u32,
    /// Bytes per vertex.
    pub stride: u32,
}

impl VertexBuffer {
    /// The unit quad every sprite is drawn with.
    #[must_use]
    pub fn unit_quad() -> Self {
        Self {
            name: "unit_quad".to_owned(),
            vertex_count: 4,
            stride: 16,
        }
    }
}
