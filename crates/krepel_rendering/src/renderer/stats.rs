//! Presentation statistics.

/// Statistics from one presented frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Presentation index, starting at 0.
    pub frame_number: u64,
    /// Records consumed.
    pub records: u32,
    /// Draw calls submitted to the device.
    pub draw_calls: u32,
    /// Sprite draws.
    pub sprites: u32,
    /// Debug line and circle draws.
    pub debug_primitives: u32,
    /// Camera records applied.
    pub cameras: u32,
    /// The frame was extracted without a camera record; draws reused the
    /// previous view.
    pub missing_camera: bool,
    /// Records were dropped because there was no target.
    pub skipped: bool,
    /// The device failed to present.
    pub device_error: bool,
}

impl FrameStats {
    /// Returns true if the frame reached the target.
    #[must_use]
    pub fn presented(&self) -> bool {
        !self.skipped && !self.device_error
    }
}

/// Totals over the renderer's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererStats {
    /// Frames attempted.
    pub total_frames: u64,
    /// Frames that reached the target.
    pub frames_presented: u64,
    /// Draw calls across all frames.
    pub total_draw_calls: u64,
    /// Frames extracted without a camera record.
    pub frames_missing_camera: u64,
    /// Frames the device failed to present.
    pub device_errors: u64,
}

impl RendererStats {
    pub(crate) fn record(&mut self, frame: &FrameStats) {
        self.total_frames += 1;
        self.total_draw_calls += u64::from(frame.draw_calls);
        if frame.presented() {
            self.frames_presented += 1;
        }
        if frame.missing_camera {
            self.frames_missing_camera += 1;
        }
        if frame.device_error {
            self.device_errors += 1;
        }
    }
}
