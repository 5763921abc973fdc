//! # Engine
//!
//! The explicit context that owns the loop registry, the extraction pipeline,
//! the renderer and the main render target.
//!
//! ```text
//! Engine::tick()
//!   └── LoopRegistry::tick()
//!         ├── krepel.present   (prio 100)  drain last frame's records
//!         ├── game callbacks   (prio 0)
//!         └── krepel.extract   (prio -100) run listeners, swap buffers
//! ```
//!
//! Frame N presents what frame N-1 extracted. The first frame presents an
//! empty buffer.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use krepel_core::{LoopRegistry, RefCountedPtr};
use krepel_rendering::{
    Extractor, ExtractionPipeline, FrameStats, GraphicsDevice, ListenerId, RenderTarget, Renderer,
};

use crate::config::EngineConfig;
use crate::error::EngineResult;

/// Registry name of the presentation callback.
pub const PRESENT_LOOP: &str = "krepel.present";

/// Registry name of the extraction callback.
pub const EXTRACT_LOOP: &str = "krepel.extract";

/// The frame driver.
pub struct Engine<D: GraphicsDevice + 'static> {
    config: EngineConfig,
    registry: Rc<LoopRegistry>,
    pipeline: Rc<RefCell<ExtractionPipeline>>,
    renderer: Rc<RefCell<Renderer<D>>>,
    target: Rc<RefCell<RefCountedPtr<RenderTarget>>>,
    last_frame: Rc<Cell<Option<FrameStats>>>,
    frame_count: u64,
}

impl<D: GraphicsDevice + 'static> Engine<D> {
    /// Validates `config` and registers the presentation and extraction
    /// callbacks.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`](crate::EngineError::Config) if the
    /// configuration is invalid.
    pub fn new(config: EngineConfig, device: D) -> EngineResult<Self> {
        config.validate()?;

        let target = RenderTarget::new(
            "main",
            config.presentation.target_width,
            config.presentation.target_height,
        );
        target.set_clear_color(config.clear_color());

        let engine = Self {
            registry: Rc::new(LoopRegistry::new()),
            pipeline: Rc::new(RefCell::new(ExtractionPipeline::new(config.extraction()))),
            renderer: Rc::new(RefCell::new(Renderer::new(device, config.renderer()))),
            target: Rc::new(RefCell::new(RefCountedPtr::new(Box::new(target)))),
            last_frame: Rc::new(Cell::new(None)),
            frame_count: 0,
            config,
        };
        engine.register_frame_callbacks();

        tracing::info!(
            arena_capacity = config.arena.initial_capacity,
            present_priority = config.schedule.present_priority,
            extract_priority = config.schedule.extract_priority,
            "engine started"
        );
        Ok(engine)
    }

    fn register_frame_callbacks(&self) {
        let pipeline = Rc::clone(&self.pipeline);
        let renderer = Rc::clone(&self.renderer);
        let target = Rc::clone(&self.target);
        let last_frame = Rc::clone(&self.last_frame);
        self.registry.set_with_priority(
            PRESENT_LOOP,
            self.config.schedule.present_priority,
            move || {
                let mut pipeline = pipeline.borrow_mut();
                let target = target.borrow();
                let stats = renderer
                    .borrow_mut()
                    .present(pipeline.read_buffer_mut(), &target);
                last_frame.set(Some(stats));
            },
        );

        let pipeline = Rc::clone(&self.pipeline);
        self.registry.set_with_priority(
            EXTRACT_LOOP,
            self.config.schedule.extract_priority,
            move || {
                let _ = pipeline.borrow_mut().extract();
            },
        );
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The loop registry. Game callbacks registered here usually capture a
    /// `Weak` of it.
    #[must_use]
    pub fn registry(&self) -> &Rc<LoopRegistry> {
        &self.registry
    }

    /// Registers a game callback at `priority`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Loop`](crate::EngineError::Loop) if `name` is
    /// already registered.
    pub fn add_loop<F>(&self, name: &str, priority: i32, callback: F) -> EngineResult<()>
    where
        F: FnMut() + 'static,
    {
        self.registry.add(name, callback)?;
        self.registry.set_priority(name, priority)?;
        Ok(())
    }

    /// Registers an extraction listener, invoked once per frame in
    /// registration order.
    ///
    /// # Panics
    ///
    /// Panics if called from inside an extraction listener.
    pub fn add_extraction_listener<F>(&self, listener: F) -> ListenerId
    where
        F: FnMut(&mut Extractor<'_>) + 'static,
    {
        self.pipeline_mut().add_listener(listener)
    }

    /// Unregisters an extraction listener. Returns `false` if `id` is unknown.
    ///
    /// # Panics
    ///
    /// Panics if called from inside an extraction listener.
    pub fn remove_extraction_listener(&self, id: ListenerId) -> bool {
        self.pipeline_mut().remove_listener(id)
    }

    fn pipeline_mut(&self) -> std::cell::RefMut<'_, ExtractionPipeline> {
        self.pipeline.try_borrow_mut().unwrap_or_else(|_| {
            panic!("Invalid operation: extraction listeners cannot change while extraction runs")
        })
    }

    /// Runs one frame. Returns the presentation statistics of this frame, if
    /// presentation ran.
    pub fn tick(&mut self) -> Option<FrameStats> {
        self.registry.tick();
        self.frame_count += 1;
        if let Some(max) = self.config.max_frames {
            if self.frame_count >= max && self.registry.keep_ticking() {
                tracing::info!(frames = self.frame_count, "frame limit reached");
                self.registry.set_keep_ticking(false);
            }
        }
        self.last_frame.take()
    }

    /// Ticks until [`keep_ticking`](Self::keep_ticking) turns false. Returns
    /// the number of frames run by this call.
    pub fn run(&mut self) -> u64 {
        let start = self.frame_count;
        while self.registry.keep_ticking() {
            let _ = self.tick();
        }
        self.frame_count - start
    }

    /// Whether the frame driver should continue.
    #[must_use]
    pub fn keep_ticking(&self) -> bool {
        self.registry.keep_ticking()
    }

    /// Requests the driver to stop (or continue) after the current frame.
    pub fn set_keep_ticking(&self, value: bool) {
        self.registry.set_keep_ticking(value);
    }

    /// Frames ticked so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// A new handle to the main render target.
    #[must_use]
    pub fn render_target(&self) -> RefCountedPtr<RenderTarget> {
        self.target.borrow().clone()
    }

    /// Replaces the render target. A null target makes presentation skip
    /// frames with a warning.
    pub fn set_render_target(&self, target: &RefCountedPtr<RenderTarget>) {
        self.target.borrow_mut().assign(target);
    }

    /// The renderer, for inspecting the device and statistics.
    ///
    /// # Panics
    ///
    /// Panics if called while presentation runs.
    #[must_use]
    pub fn renderer(&self) -> Ref<'_, Renderer<D>> {
        self.renderer.borrow()
    }

    /// The extraction pipeline.
    ///
    /// # Panics
    ///
    /// Panics if called while extraction runs.
    #[must_use]
    pub fn pipeline(&self) -> Ref<'_, ExtractionPipeline> {
        self.pipeline.borrow()
    }

    /// Removes every loop callback and listener and drops pending records,
    /// releasing their resource borrows. The engine ticks nothing afterwards
    /// and [`keep_ticking`](Self::keep_ticking) reports false.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a loop callback.
    pub fn shutdown(&mut self) {
        self.registry.reset();
        self.registry.set_keep_ticking(false);
        let mut pipeline = self.pipeline_mut();
        pipeline.clear_listeners();
        pipeline.reset_buffers();
        tracing::info!(frames = self.frame_count, "engine shut down");
    }
}

impl<D: GraphicsDevice + 'static> std::fmt::Debug for Engine<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("frame_count", &self.frame_count)
            .finish_non_exhaustive()
    }
}
