//! # Ownership
//!
//! Two ways to keep a resource alive:
//!
//! - [`Owned`] / [`Borrowed`]: one exclusive owner, any number of counted
//!   borrows. Releasing a resource that is still borrowed is a fatal error.
//!   Every resource referenced by an extraction record uses this model.
//! - [`RefCountedPtr`]: intrusive counting for objects that are shared with no
//!   single owner, such as a render target.
//!
//! ## Failure Policy
//!
//! Misuse (dereferencing a dead handle, releasing a borrowed resource) panics
//! with a message naming the violated invariant. Nothing here returns a
//! `Result`.

mod owned;
mod ref_counted;

pub use owned::{borrow, own, own_nullable, Borrowed, Owned};
pub use ref_counted::{
    is_referenced, ref_count_of, DefaultDelete, DoNothing, RefCount, RefCounted, RefCountedPtr,
    ReleasePolicy, SetNull,
};
