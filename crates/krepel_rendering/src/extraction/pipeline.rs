//! # Extraction Pipeline
//!
//! The double-buffered pair of [`ExtractionBuffer`]s and the listeners that
//! fill it.
//!
//! ```text
//!   extract():  reset write ──► listeners (registration order) ──► swap
//!                                                                   │
//!   present():  drain read  ◄───────────────────────────────────────┘
//! ```
//!
//! Presentation in frame N consumes what extraction wrote in frame N-1.

use krepel_core::DoubleBuffer;

use super::buffer::{BufferMode, ExtractionBuffer, DEFAULT_BUFFER_CAPACITY};
use super::extractor::Extractor;

/// Identifies a registered extraction listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&mut Extractor<'_>)>;

/// Buffer sizing for an [`ExtractionPipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionConfig {
    /// Initial capacity of each buffer in bytes.
    pub initial_capacity: usize,
    /// Whether a full write buffer may grow.
    pub allow_growth: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_BUFFER_CAPACITY,
            allow_growth: true,
        }
    }
}

/// Summary of one extraction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Records written.
    pub records: usize,
    /// Bytes written.
    pub bytes: usize,
    /// Whether any listener set a camera.
    pub camera_set: bool,
    /// Listeners invoked.
    pub listeners: usize,
}

/// Producer side of the frame hand-off.
pub struct ExtractionPipeline {
    buffers: DoubleBuffer<ExtractionBuffer>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl ExtractionPipeline {
    /// Creates the buffer pair: the first buffer starts write-only.
    #[must_use]
    pub fn new(config: ExtractionConfig) -> Self {
        let make = |mode| {
            let mut buffer = ExtractionBuffer::new(config.initial_capacity, mode);
            buffer.set_growth_allowed(config.allow_growth);
            buffer
        };
        Self {
            buffers: DoubleBuffer::new(make(BufferMode::WriteOnly), make(BufferMode::ReadOnly)),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Registers a listener invoked on every [`extract`](Self::extract).
    pub fn add_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&mut Extractor<'_>) + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        tracing::debug!(listener = id.0, "extraction listener added");
        id
    }

    /// Unregisters a listener. Returns `false` if `id` is unknown.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        let removed = self.listeners.len() != before;
        if !removed {
            tracing::info!(listener = id.0, "cannot remove unknown extraction listener");
        }
        removed
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Removes every listener.
    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    /// Runs one extraction pass and hands the result to presentation.
    ///
    /// Drops whatever the write buffer still holds, lets every listener
    /// record, then swaps buffer roles and modes. A pass in which no listener
    /// set a camera flags the handed-off buffer with
    /// [`camera_missing`](ExtractionBuffer::camera_missing).
    pub fn extract(&mut self) -> ExtractionStats {
        let write = self.buffers.write();
        write.reset();

        let mut extractor = Extractor::new(write);
        for (_, listener) in &mut self.listeners {
            listener(&mut extractor);
        }
        let stats = ExtractionStats {
            records: extractor.record_count(),
            bytes: extractor.allocated_bytes(),
            camera_set: extractor.has_camera(),
            listeners: self.listeners.len(),
        };

        let (write, read) = self.buffers.write_and_read();
        write.set_camera_missing(!stats.camera_set);
        write.set_mode(BufferMode::ReadOnly);
        read.set_mode(BufferMode::WriteOnly);
        self.buffers.swap();

        tracing::trace!(
            frame = self.buffers.frame_count(),
            records = stats.records,
            bytes = stats.bytes,
            camera_set = stats.camera_set,
            "extraction pass complete"
        );
        stats
    }

    /// The buffer presentation consumes this frame.
    #[must_use]
    pub fn read_buffer(&self) -> &ExtractionBuffer {
        self.buffers.read()
    }

    /// Mutable access to the read buffer, for draining.
    pub fn read_buffer_mut(&mut self) -> &mut ExtractionBuffer {
        self.buffers.read_mut()
    }

    /// The buffer the next extraction writes into.
    #[must_use]
    pub fn write_buffer(&self) -> &ExtractionBuffer {
        self.buffers.peek_write()
    }

    /// Number of completed extraction passes.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.buffers.frame_count()
    }

    /// Drops every pending record in both buffers.
    pub fn reset_buffers(&mut self) {
        for buffer in self.buffers.iter_mut() {
            buffer.reset();
        }
    }
}

impl Default for ExtractionPipeline {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

impl std::fmt::Debug for ExtractionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionPipeline")
            .field("buffers", &self.buffers)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
