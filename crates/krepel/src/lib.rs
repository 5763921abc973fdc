//! # KREPEL
//!
//! The engine context tying the frame-lifecycle pieces together:
//! - [`krepel_core`]: ownership, the loop registry, frame memory
//! - [`krepel_rendering`]: extraction records and presentation
//!
//! ## Example
//!
//! ```rust
//! use krepel::{Engine, EngineConfig};
//! use krepel_rendering::{extract_line, Color, HeadlessDevice, Vec2};
//!
//! let config = EngineConfig {
//!     max_frames: Some(3),
//!     ..EngineConfig::default()
//! };
//! let mut engine = Engine::new(config, HeadlessDevice::new()).unwrap();
//! engine.add_extraction_listener(|extractor| {
//!     extract_line(extractor, Vec2::ZERO, Vec2::new(1.0, 0.0), Color::RED);
//! });
//!
//! assert_eq!(engine.run(), 3);
//! // Frame 0 presented nothing; frames 1 and 2 each drew one line.
//! assert_eq!(engine.renderer().device().total_submissions(), 2);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod engine;
pub mod error;

pub use config::{
    ArenaConfig, EngineConfig, PresentationConfig, ScheduleConfig, MAX_ARENA_CAPACITY,
};
pub use engine::{Engine, EXTRACT_LOOP, PRESENT_LOOP};
pub use error::{ConfigError, EngineError, EngineResult};
