//! A device that draws nothing and remembers every submission.

use super::{GraphicsDevice, ViewState};
use crate::error::{RenderError, RenderResult};
use crate::extraction::{CircleData, LineData, SpriteData};
use crate::resource::RenderTarget;
use crate::scene::{Color, Transform2D, Vec2};

/// One draw call as seen by [`HeadlessDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// A sprite draw.
    Sprite {
        /// Name of the bound texture.
        texture: String,
        /// Name of the bound program.
        shader: String,
        /// World transform.
        transform: Transform2D,
        /// Tint.
        color: Color,
        /// Camera at submission time.
        view: ViewState,
    },
    /// A debug line.
    Line {
        /// First end point.
        start: Vec2,
        /// Second end point.
        end: Vec2,
        /// Camera at submission time.
        view: ViewState,
    },
    /// A debug circle.
    Circle {
        /// Center point.
        center: Vec2,
        /// Radius.
        radius: f32,
        /// Camera at submission time.
        view: ViewState,
    },
}

/// Headless backend for tests and the demo driver.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    current: Option<Vec<Submission>>,
    frames: Vec<Vec<Submission>>,
    fail_next_end_frame: bool,
}

impl HeadlessDevice {
    /// Creates a device with no recorded frames.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every presented frame, oldest first.
    #[must_use]
    pub fn frames(&self) -> &[Vec<Submission>] {
        &self.frames
    }

    /// Submissions of the most recently presented frame.
    #[must_use]
    pub fn last_frame(&self) -> Option<&[Submission]> {
        self.frames.last().map(Vec::as_slice)
    }

    /// Total submissions across all presented frames.
    #[must_use]
    pub fn total_submissions(&self) -> usize {
        self.frames.iter().map(Vec::len).sum()
    }

    /// Makes the next `end_frame` report a lost device.
    pub fn fail_next_frame(&mut self) {
        self.fail_next_end_frame = true;
    }

    fn submit(&mut self, submission: Submission) {
        match &mut self.current {
            Some(frame) => frame.push(submission),
            None => tracing::warn!("draw submitted outside of a frame; ignoring"),
        }
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn begin_frame(&mut self, target: &RenderTarget) {
        if self.current.is_some() {
            tracing::warn!(target = target.label(), "begin_frame while a frame is open; discarding it");
        }
        self.current = Some(Vec::new());
    }

    fn draw_sprite(&mut self, sprite: &SpriteData, view: &ViewState) {
        self.submit(Submission::Sprite {
            texture: sprite.texture.name.clone(),
            shader: sprite.shader.name.clone(),
            transform: sprite.transform,
            color: sprite.color,
            view: *view,
        });
    }

    fn draw_line(&mut self, line: &LineData, view: &ViewState) {
        self.submit(Submission::Line {
            start: line.start,
            end: line.end,
            view: *view,
        });
    }

    fn draw_circle(&mut self, circle: &CircleData, view: &ViewState) {
        self.submit(Submission::Circle {
            center: circle.center,
            radius: circle.radius,
            view: *view,
        });
    }

    fn end_frame(&mut self, _target: &RenderTarget) -> RenderResult<()> {
        let frame = self.current.take().ok_or(RenderError::NoFrameInProgress)?;
        if std::mem::take(&mut self.fail_next_end_frame) {
            return Err(RenderError::DeviceLost("injected failure".to_owned()));
        }
        self.frames.push(frame);
        Ok(())
    }
}
