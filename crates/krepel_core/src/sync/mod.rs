//! # Frame Synchronization
//!
//! Producer/consumer role swapping between consecutive frames.

mod double_buffer;

pub use double_buffer::DoubleBuffer;
