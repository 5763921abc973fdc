//! # KREPEL Core Engine
//!
//! The frame-lifecycle substrate shared by every other KREPEL crate:
//! - **Ownership**: exclusive owners, counted borrows, intrusive ref counting
//! - **Scheduling**: a named, prioritized loop registry ticked once per frame
//! - **Frame memory**: a growable byte arena and a double-buffer pair
//!
//! ## Architecture Rules
//!
//! 1. **Misuse is fatal** - releasing a borrowed resource or dereferencing a
//!    dead handle panics immediately with the violated invariant
//! 2. **No hidden statics** - every registry and buffer pair is an explicit value
//! 3. **Single logical thread per frame** - the swap is the only hand-off point
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//! use krepel_core::{LoopRegistry, Owned};
//!
//! let texture = Owned::new(String::from("atlas.png"));
//! let handle = texture.borrow();
//! assert_eq!(texture.borrow_count(), 1);
//!
//! let registry = Rc::new(LoopRegistry::new());
//! registry.set("draw", move || assert_eq!(handle.len(), 9));
//! registry.tick();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod memory;
pub mod ownership;
pub mod scheduler;
pub mod sync;

pub use error::{LoopError, LoopResult};
pub use memory::{ByteArena, ARENA_ALIGN};
pub use ownership::{
    borrow, own, own_nullable, Borrowed, DefaultDelete, DoNothing, Owned, RefCount, RefCounted,
    RefCountedPtr, ReleasePolicy, SetNull,
};
pub use scheduler::{LoopEntryInfo, LoopRegistry};
pub use sync::DoubleBuffer;
