//! # Extraction
//!
//! Captures a frame's draw requests as self-describing records in a bump
//! arena, then hands the whole arena to presentation in one swap.
//!
//! ## Lifecycle
//!
//! 1. `extract()` resets the write buffer and runs each listener with an
//!    [`Extractor`].
//! 2. The buffers swap: what was written becomes read-only.
//! 3. Next frame, the renderer drains the read-only buffer. Dropping each
//!    record releases the resource borrows it held.

mod buffer;
mod extractor;
mod pipeline;
mod record;

pub use buffer::{
    BufferMode, Drain, ExtractionBuffer, Iter, RecordRef, DEFAULT_BUFFER_CAPACITY,
};
pub use extractor::Extractor;
pub use pipeline::{ExtractionConfig, ExtractionPipeline, ExtractionStats, ListenerId};
pub use record::{
    record_size, CameraData, CircleData, ExtractionPayload, ExtractionRecord, LineData,
    RecordHeader, RecordKind, SpriteData, RECORD_ALIGN,
};
