//! The handle extraction listeners write through.

use super::buffer::ExtractionBuffer;
use super::record::{CameraData, ExtractionPayload};
use crate::scene::Mat4;

/// Write access to the current frame's extraction buffer.
///
/// Listeners receive one per frame and record what should be presented next
/// frame. Records are immutable once the extraction pass ends.
#[derive(Debug)]
pub struct Extractor<'a> {
    buffer: &'a mut ExtractionBuffer,
    camera_count: usize,
}

impl<'a> Extractor<'a> {
    /// Wraps a write-mode buffer.
    #[must_use]
    pub fn new(buffer: &'a mut ExtractionBuffer) -> Self {
        Self {
            buffer,
            camera_count: 0,
        }
    }

    /// Records `payload`. See [`ExtractionBuffer::allocate`].
    #[inline]
    pub fn allocate<R: ExtractionPayload>(&mut self, payload: R) -> &mut R {
        self.buffer.allocate(payload)
    }

    /// Records the camera used for the draws recorded after it.
    pub fn set_camera(&mut self, view: Mat4, projection: Mat4) {
        self.camera_count += 1;
        self.buffer.allocate(CameraData { view, projection });
    }

    /// Whether any listener set a camera during this pass.
    #[inline]
    #[must_use]
    pub fn has_camera(&self) -> bool {
        self.camera_count > 0
    }

    /// Bytes recorded so far this frame.
    #[inline]
    #[must_use]
    pub fn allocated_bytes(&self) -> usize {
        self.buffer.allocated_bytes()
    }

    /// Records written so far this frame.
    #[inline]
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.buffer.record_count()
    }
}
