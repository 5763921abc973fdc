//! # Memory
//!
//! Raw storage for per-frame data.

mod arena;

pub use arena::{ByteArena, ARENA_ALIGN};
