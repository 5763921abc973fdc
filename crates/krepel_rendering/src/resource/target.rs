//! The surface frames are presented to.

use krepel_core::{DefaultDelete, RefCount, RefCounted};
use parking_lot::Mutex;

use crate::scene::Color;

/// A presentable surface shared by the renderer, the window layer and
/// whoever resizes it, with no single owner. Held through
/// [`RefCountedPtr`](krepel_core::RefCountedPtr); freed when the last handle drops.
///
/// The handles stay on the engine thread, but the target itself is `Sync`:
/// a `&RenderTarget` may be lent to a window or presentation thread, which
/// is why the mutable state sits behind a lock.
#[derive(Debug)]
pub struct RenderTarget {
    ref_count: RefCount,
    label: String,
    state: Mutex<TargetState>,
}

#[derive(Debug, Clone, Copy)]
struct TargetState {
    width: u32,
    height: u32,
    clear_color: Color,
    frames_presented: u64,
}

impl RenderTarget {
    /// Creates a target of the given size.
    #[must_use]
    pub fn new(label: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            ref_count: RefCount::new(),
            label: label.into(),
            state: Mutex::new(TargetState {
                width,
                height,
                clear_color: Color::CORNFLOWER_BLUE,
                frames_presented: 0,
            }),
        }
    }

    /// Diagnostic label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Current `(width, height)`.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        let state = self.state.lock();
        (state.width, state.height)
    }

    /// Changes the size; takes effect on the next frame.
    pub fn resize(&self, width: u32, height: u32) {
        let mut state = self.state.lock();
        state.width = width;
        state.height = height;
        tracing::debug!(label = %self.label, width, height, "render target resized");
    }

    /// Color the device clears to at the start of each frame.
    #[must_use]
    pub fn clear_color(&self) -> Color {
        self.state.lock().clear_color
    }

    /// Sets the clear color.
    pub fn set_clear_color(&self, color: Color) {
        self.state.lock().clear_color = color;
    }

    /// Number of frames successfully presented to this target.
    #[must_use]
    pub fn frames_presented(&self) -> u64 {
        self.state.lock().frames_presented
    }

    pub(crate) fn mark_presented(&self) {
        self.state.lock().frames_presented += 1;
    }
}

impl RefCounted for RenderTarget {
    type Release = DefaultDelete;

    fn ref_count(&self) -> &RefCount {
        &self.ref_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use krepel_core::RefCountedPtr;

    #[test]
    fn test_shared_target() {
        let target = RefCountedPtr::new(Box::new(RenderTarget::new("main", 800, 600)));
        let window_side = target.clone();
        assert_eq!(krepel_core::ownership::ref_count_of(&*target), 2);

        window_side.resize(1024, 768);
        window_side.set_clear_color(Color::BLACK);
        assert_eq!(target.size(), (1024, 768));
        assert_eq!(target.clear_color(), Color::BLACK);

        drop(window_side);
        assert_eq!(krepel_core::ownership::ref_count_of(&*target), 1);
    }

    #[test]
    fn test_target_is_shared_across_threads() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<RenderTarget>();

        let target = RefCountedPtr::new(Box::new(RenderTarget::new("main", 800, 600)));
        let surface: &RenderTarget = &target;
        std::thread::scope(|scope| {
            scope.spawn(|| surface.resize(1280, 720));
            for _ in 0..100 {
                surface.mark_presented();
            }
        });

        assert_eq!(target.size(), (1280, 720));
        assert_eq!(target.frames_presented(), 100);
    }
}
