//! # KREPEL Rendering
//!
//! Extraction and presentation for the KREPEL frame loop:
//! - **Extraction**: scene listeners record draw requests into a bump arena
//! - **Presentation**: the renderer drains last frame's arena into a device
//! - **Resources**: descriptors borrowed by records, and the shared render target
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        ONE FRAME                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  present (prio 100)  drain READ buffer ─► GraphicsDevice    │
//! │  game logic (prio 0)                                        │
//! │  extract (prio -100) reset WRITE ─► listeners ─► swap       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Frame N presents what frame N-1 extracted; frame 0 presents nothing.
//!
//! ## Rules
//!
//! - No allocation per record: records live in the arena
//! - Records borrow resources; a resource cannot be released while a
//!   pending record references it
//! - Record kinds form a closed set matched on the read path

#![deny(missing_docs)]
// Note: unsafe code is allowed in the extraction arena for typed slot access
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod device;
pub mod error;
pub mod extraction;
pub mod renderer;
pub mod resource;
pub mod scene;

pub use device::{GraphicsDevice, HeadlessDevice, Submission, ViewState};
pub use error::{RenderError, RenderResult};
pub use extraction::{
    BufferMode, ExtractionBuffer, ExtractionConfig, ExtractionPipeline, ExtractionRecord,
    Extractor, ListenerId, RecordKind,
};
pub use renderer::{FrameStats, Renderer, RendererConfig, RendererStats};
pub use resource::{RenderTarget, Sampler, ShaderProgram, Texture, VertexBuffer};
pub use scene::{
    extract_camera, extract_circle, extract_line, extract_sprite, Camera2D, Color, Mat4, Sprite,
    Transform2D, Vec2,
};
