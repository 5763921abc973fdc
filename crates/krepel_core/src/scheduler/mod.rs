//! # Scheduler
//!
//! The per-frame callback registry that drives the engine loop.
//!
//! The registry is single-threaded: callbacks are `FnMut() + 'static` and
//! usually capture a `Weak` handle to the registry itself so they can
//! reschedule or remove entries mid-tick.

mod loop_registry;

pub use loop_registry::{LoopEntryInfo, LoopRegistry};
