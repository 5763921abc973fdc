//! # Renderer
//!
//! The consumer side of extraction: drains last frame's records and drives a
//! [`GraphicsDevice`].
//!
//! ```text
//! present(buffer, target)
//!   ├── camera_missing?     → warn, keep previous ViewState
//!   ├── target null?        → warn, drop records, skip
//!   ├── device.begin_frame
//!   ├── for record in drain:
//!   │     Camera  → update ViewState
//!   │     Sprite  → device.draw_sprite(…, view)
//!   │     Line    → device.draw_line(…, view)
//!   │     Circle  → device.draw_circle(…, view)
//!   │     (record dropped here: borrows released)
//!   └── device.end_frame    → warn on error
//! ```

mod stats;

pub use stats::{FrameStats, RendererStats};

use krepel_core::RefCountedPtr;

use crate::device::{GraphicsDevice, ViewState};
use crate::extraction::{ExtractionBuffer, ExtractionRecord};
use crate::resource::RenderTarget;

/// Presentation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererConfig {
    /// Log a warning when a frame was extracted without a camera record.
    pub warn_on_missing_camera: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            warn_on_missing_camera: true,
        }
    }
}

/// Presents extraction records through a device.
#[derive(Debug)]
pub struct Renderer<D: GraphicsDevice> {
    device: D,
    config: RendererConfig,
    view: ViewState,
    frame_number: u64,
    stats: RendererStats,
}

impl<D: GraphicsDevice> Renderer<D> {
    /// Creates a renderer with an identity view.
    #[must_use]
    pub fn new(device: D, config: RendererConfig) -> Self {
        Self {
            device,
            config,
            view: ViewState::default(),
            frame_number: 0,
            stats: RendererStats::default(),
        }
    }

    /// The device.
    #[must_use]
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Mutable access to the device.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Camera state left by the last camera record.
    #[must_use]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Lifetime totals.
    #[must_use]
    pub fn stats(&self) -> &RendererStats {
        &self.stats
    }

    /// Consumes every record in `buffer` and presents them to `target`.
    ///
    /// `buffer` must be the read-only side of the extraction pair.
    pub fn present(
        &mut self,
        buffer: &mut ExtractionBuffer,
        target: &RefCountedPtr<RenderTarget>,
    ) -> FrameStats {
        let mut frame = FrameStats {
            frame_number: self.frame_number,
            missing_camera: buffer.camera_missing(),
            ..FrameStats::default()
        };
        self.frame_number += 1;

        if frame.missing_camera && self.config.warn_on_missing_camera {
            tracing::warn!(
                frame = frame.frame_number,
                "no camera was extracted for this frame; reusing the previous view"
            );
        }

        let Some(target) = target.get() else {
            let dropped = buffer.record_count();
            buffer.drain().for_each(drop);
            tracing::warn!(
                frame = frame.frame_number,
                dropped,
                "no render target; skipping presentation"
            );
            frame.skipped = true;
            self.stats.record(&frame);
            return frame;
        };

        self.device.begin_frame(target);
        for record in buffer.drain() {
            frame.records += 1;
            match record {
                ExtractionRecord::Camera(camera) => {
                    self.view = ViewState {
                        view: camera.view,
                        projection: camera.projection,
                    };
                    frame.cameras += 1;
                }
                ExtractionRecord::Sprite(sprite) => {
                    self.device.draw_sprite(&sprite, &self.view);
                    frame.sprites += 1;
                }
                ExtractionRecord::Line(line) => {
                    self.device.draw_line(&line, &self.view);
                    frame.debug_primitives += 1;
                }
                ExtractionRecord::Circle(circle) => {
                    self.device.draw_circle(&circle, &self.view);
                    frame.debug_primitives += 1;
                }
            }
        }
        frame.draw_calls = frame.sprites + frame.debug_primitives;

        match self.device.end_frame(target) {
            Ok(()) => target.mark_presented(),
            Err(error) => {
                tracing::warn!(frame = frame.frame_number, %error, "failed to present frame");
                frame.device_error = true;
            }
        }

        self.stats.record(&frame);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{HeadlessDevice, Submission};
    use crate::extraction::{BufferMode, CameraData, LineData};
    use crate::scene::{Color, Mat4, Vec2};

    fn read_only(records: impl FnOnce(&mut ExtractionBuffer)) -> ExtractionBuffer {
        let mut buffer = ExtractionBuffer::default();
        records(&mut buffer);
        buffer.set_mode(BufferMode::ReadOnly);
        buffer
    }

    fn line(x: f32) -> LineData {
        LineData {
            start: Vec2::new(x, 0.0),
            end: Vec2::new(x, 1.0),
            color: Color::WHITE,
        }
    }

    fn target() -> RefCountedPtr<RenderTarget> {
        RefCountedPtr::new(Box::new(RenderTarget::new("test", 320, 240)))
    }

    #[test]
    fn test_camera_applies_to_following_draws() {
        let zoomed = Mat4::scale(2.0);
        let mut buffer = read_only(|buffer| {
            buffer.allocate(line(0.0));
            buffer.allocate(CameraData {
                view: zoomed,
                projection: Mat4::IDENTITY,
            });
            buffer.allocate(line(1.0));
        });
        let mut renderer = Renderer::new(HeadlessDevice::new(), RendererConfig::default());
        let target = target();

        let stats = renderer.present(&mut buffer, &target);
        assert_eq!(stats.records, 3);
        assert_eq!(stats.draw_calls, 2);
        assert!(!stats.missing_camera);
        assert!(buffer.is_empty());
        assert_eq!(target.frames_presented(), 1);

        let frame = renderer.device().last_frame().unwrap();
        let views: Vec<Mat4> = frame
            .iter()
            .map(|submission| match submission {
                Submission::Line { view, .. } => view.view,
                other => panic!("unexpected submission {other:?}"),
            })
            .collect();
        assert_eq!(views, [Mat4::IDENTITY, zoomed]);
        assert_eq!(renderer.view().view, zoomed);
    }

    #[test]
    fn test_missing_camera_reuses_previous_view() {
        let zoomed = Mat4::scale(3.0);
        let mut renderer = Renderer::new(HeadlessDevice::new(), RendererConfig::default());
        let target = target();

        let mut first = read_only(|buffer| {
            buffer.allocate(CameraData {
                view: zoomed,
                projection: Mat4::IDENTITY,
            });
        });
        renderer.present(&mut first, &target);

        let mut second = read_only(|buffer| {
            buffer.allocate(line(0.0));
            buffer.set_camera_missing(true);
        });
        let stats = renderer.present(&mut second, &target);
        assert!(stats.missing_camera);
        assert_eq!(renderer.stats().frames_missing_camera, 1);
        match &renderer.device().last_frame().unwrap()[0] {
            Submission::Line { view, .. } => assert_eq!(view.view, zoomed),
            other => panic!("unexpected submission {other:?}"),
        }
    }

    #[test]
    fn test_unextracted_buffer_is_not_missing_camera() {
        let mut renderer = Renderer::new(HeadlessDevice::new(), RendererConfig::default());
        let mut buffer = read_only(|_| {});
        let stats = renderer.present(&mut buffer, &target());
        assert_eq!(stats.records, 0);
        assert!(!stats.missing_camera);
        assert!(stats.presented());
        assert_eq!(renderer.device().frames().len(), 1);
    }

    #[test]
    fn test_empty_camera_less_extraction_is_missing_camera() {
        let mut renderer = Renderer::new(
            HeadlessDevice::new(),
            RendererConfig {
                warn_on_missing_camera: false,
            },
        );
        let mut buffer = read_only(|buffer| buffer.set_camera_missing(true));

        let stats = renderer.present(&mut buffer, &target());
        assert_eq!(stats.draw_calls, 0);
        assert!(stats.missing_camera);
        assert!(!buffer.camera_missing());
        assert_eq!(renderer.stats().frames_missing_camera, 1);
    }

    #[test]
    fn test_null_target_skips_and_drops_records() {
        let mut renderer = Renderer::new(HeadlessDevice::new(), RendererConfig::default());
        let mut buffer = read_only(|buffer| {
            buffer.allocate(line(0.0));
        });

        let stats = renderer.present(&mut buffer, &RefCountedPtr::null());
        assert!(stats.skipped);
        assert!(buffer.is_empty());
        assert!(renderer.device().frames().is_empty());
        assert_eq!(renderer.stats().total_frames, 1);
        assert_eq!(renderer.stats().frames_presented, 0);
    }

    #[test]
    fn test_device_failure_is_reported_not_fatal() {
        let mut renderer = Renderer::new(HeadlessDevice::new(), RendererConfig::default());
        let target = target();
        renderer.device_mut().fail_next_frame();

        let mut buffer = read_only(|buffer| {
            buffer.allocate(line(0.0));
        });
        let stats = renderer.present(&mut buffer, &target);
        assert!(stats.device_error);
        assert_eq!(target.frames_presented(), 0);

        let mut buffer = read_only(|_| {});
        assert!(renderer.present(&mut buffer, &target).presented());
        assert_eq!(renderer.stats().device_errors, 1);
        assert_eq!(renderer.stats().frames_presented, 1);
        assert_eq!(target.frames_presented(), 1);
    }
}
