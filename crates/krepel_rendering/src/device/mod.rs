//! # Graphics Device Boundary
//!
//! Everything past this trait (shader compilation, buffer and texture
//! binding, swapchains) belongs to a backend. The renderer calls it once per
//! record, in record order, while the borrows inside the record are live.

mod headless;

pub use headless::{HeadlessDevice, Submission};

use bytemuck::{Pod, Zeroable};

use crate::error::RenderResult;
use crate::extraction::{CircleData, LineData, SpriteData};
use crate::resource::RenderTarget;
use crate::scene::Mat4;

/// The camera state draws are submitted with.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct ViewState {
    /// World to view.
    pub view: Mat4,
    /// View to clip.
    pub projection: Mat4,
}

/// A backend able to present extraction records.
pub trait GraphicsDevice {
    /// Starts a frame on `target` (typically clears it).
    fn begin_frame(&mut self, target: &RenderTarget);

    /// Draws one sprite.
    fn draw_sprite(&mut self, sprite: &SpriteData, view: &ViewState);

    /// Draws one debug line.
    fn draw_line(&mut self, line: &LineData, view: &ViewState);

    /// Draws one debug circle.
    fn draw_circle(&mut self, circle: &CircleData, view: &ViewState);

    /// Finishes and presents the frame.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`](crate::RenderError) if the frame could not
    /// be presented.
    fn end_frame(&mut self, target: &RenderTarget) -> RenderResult<()>;
}
