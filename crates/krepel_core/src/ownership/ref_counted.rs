//! # Intrusive Reference Counting
//!
//! For objects with no single owner, the object itself carries an atomic
//! [`RefCount`] and every [`RefCountedPtr`] handle adds one reference. When the
//! last handle goes away, the type's [`ReleasePolicy`] runs exactly once.
//!
//! ## Safety Note
//!
//! Handles store a raw pointer. Objects are either leaked boxes or `'static`
//! references, so the pointer stays valid until a policy that reclaims memory
//! ([`DefaultDelete`]) runs, which only happens after the final handle drops.

#![allow(unsafe_code)]

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicI32, Ordering};

/// Atomic reference count embedded in a [`RefCounted`] object.
///
/// Cloning an object does not copy its count: the clone starts at zero.
#[derive(Default)]
pub struct RefCount(AtomicI32);

impl RefCount {
    /// Creates a count of zero.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicI32::new(0))
    }

    /// Returns the current number of references.
    #[inline]
    #[must_use]
    pub fn get(&self) -> i32 {
        self.0.load(Ordering::Acquire)
    }

    #[inline]
    fn add_ref(&self) {
        self.0.fetch_add(1, Ordering::AcqRel);
    }

    /// Returns the count after the decrement.
    #[inline]
    fn release_ref(&self) -> i32 {
        self.0.fetch_sub(1, Ordering::AcqRel) - 1
    }
}

impl Clone for RefCount {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl fmt::Debug for RefCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RefCount({})", self.get())
    }
}

/// What happens to an object once its last reference is released.
///
/// # Safety
///
/// Implementations with `RECLAIMS_MEMORY == true` may free the allocation in
/// [`release`](ReleasePolicy::release); they must only be used with objects
/// created through [`RefCountedPtr::new`].
pub unsafe trait ReleasePolicy {
    /// Whether `release` frees the object's allocation.
    const RECLAIMS_MEMORY: bool;

    /// Called exactly once when the count of `object` drops to zero.
    ///
    /// # Safety
    ///
    /// `object` must point to a live object whose count just reached zero and
    /// that no handle refers to any more.
    unsafe fn release<T: RefCounted>(object: NonNull<T>);
}

/// Leaves the object untouched.
#[derive(Debug, Clone, Copy)]
pub struct DoNothing;

// SAFETY: never touches the allocation.
unsafe impl ReleasePolicy for DoNothing {
    const RECLAIMS_MEMORY: bool = false;

    unsafe fn release<T: RefCounted>(_object: NonNull<T>) {}
}

/// Only clears the releasing handle; the object stays where it lives.
///
/// This is the policy for objects owned elsewhere (statics, process-lifetime
/// singletons).
#[derive(Debug, Clone, Copy)]
pub struct SetNull;

// SAFETY: never touches the allocation.
unsafe impl ReleasePolicy for SetNull {
    const RECLAIMS_MEMORY: bool = false;

    unsafe fn release<T: RefCounted>(_object: NonNull<T>) {
        tracing::trace!(object = std::any::type_name::<T>(), "last reference released");
    }
}

/// Drops the object and frees its allocation.
#[derive(Debug, Clone, Copy)]
pub struct DefaultDelete;

// SAFETY: only objects boxed by `RefCountedPtr::new` are accepted for
// reclaiming policies.
unsafe impl ReleasePolicy for DefaultDelete {
    const RECLAIMS_MEMORY: bool = true;

    unsafe fn release<T: RefCounted>(object: NonNull<T>) {
        drop(Box::from_raw(object.as_ptr()));
    }
}

/// An object that carries its own reference count.
///
/// # Example
///
/// ```rust
/// use krepel_core::{DefaultDelete, RefCount, RefCounted, RefCountedPtr};
///
/// struct Surface {
///     refs: RefCount,
///     width: u32,
/// }
///
/// impl RefCounted for Surface {
///     type Release = DefaultDelete;
///     fn ref_count(&self) -> &RefCount {
///         &self.refs
///     }
/// }
///
/// let a = RefCountedPtr::new(Box::new(Surface { refs: RefCount::new(), width: 640 }));
/// let b = a.clone();
/// assert_eq!(b.width, 640);
/// assert_eq!(a.ref_count().get(), 2);
/// ```
pub trait RefCounted {
    /// Policy invoked when the last reference is released.
    type Release: ReleasePolicy;

    /// Returns the embedded count.
    fn ref_count(&self) -> &RefCount;
}

/// Returns the current reference count of `object`.
#[must_use]
pub fn ref_count_of<T: RefCounted>(object: &T) -> i32 {
    object.ref_count().get()
}

/// Returns whether `object` is still referenced.
#[must_use]
pub fn is_referenced<T: RefCounted>(object: &T) -> bool {
    ref_count_of(object) > 0
}

/// Counted handle to a [`RefCounted`] object.
pub struct RefCountedPtr<T: RefCounted> {
    object: Option<NonNull<T>>,
    _marker: PhantomData<T>,
}

impl<T: RefCounted> RefCountedPtr<T> {
    /// Creates a handle that refers to nothing.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            object: None,
            _marker: PhantomData,
        }
    }

    /// Hands `object` over to reference counting and returns the first handle.
    ///
    /// With a non-reclaiming policy the allocation is intentionally leaked
    /// once the count reaches zero.
    #[must_use]
    pub fn new(object: Box<T>) -> Self {
        let object = NonNull::from(Box::leak(object));
        Self::acquire(object)
    }

    /// Counts references to an object that lives for the whole process.
    ///
    /// # Panics
    ///
    /// Panics if `T`'s release policy would free the object.
    #[must_use]
    pub fn from_static(object: &'static T) -> Self {
        assert!(
            !<T::Release as ReleasePolicy>::RECLAIMS_MEMORY,
            "Invalid operation: a static object cannot use a reclaiming release policy"
        );
        Self::acquire(NonNull::from(object))
    }

    fn acquire(object: NonNull<T>) -> Self {
        // SAFETY: `object` is valid for the duration of this call.
        unsafe { object.as_ref() }.ref_count().add_ref();
        Self {
            object: Some(object),
            _marker: PhantomData,
        }
    }

    /// Returns whether the handle refers to nothing.
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.object.is_none()
    }

    /// Returns the object, or `None` for a null handle.
    #[inline]
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        // SAFETY: this handle holds a reference, so the object is alive.
        self.object.map(|object| unsafe { &*object.as_ptr() })
    }

    /// Returns whether both handles refer to the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.object == other.object
    }

    /// Makes this handle refer to the same object as `other`.
    ///
    /// Assigning the pointer this handle already holds does nothing; the
    /// count is never dropped and re-acquired.
    pub fn assign(&mut self, other: &Self) {
        if self.ptr_eq(other) {
            return;
        }
        *self = other.clone();
    }

    /// Releases this handle's reference and makes it null.
    pub fn set_null(&mut self) {
        if let Some(object) = self.object.take() {
            // SAFETY: the reference held by this handle keeps `object` alive
            // until the decrement below.
            let remaining = unsafe { object.as_ref() }.ref_count().release_ref();
            if remaining == 0 {
                // SAFETY: the count reached zero and this was the last handle.
                unsafe { <T::Release as ReleasePolicy>::release(object) };
            }
        }
    }
}

impl<T: RefCounted> Default for RefCountedPtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: RefCounted> Clone for RefCountedPtr<T> {
    fn clone(&self) -> Self {
        match self.object {
            Some(object) => Self::acquire(object),
            None => Self::null(),
        }
    }
}

impl<T: RefCounted> Drop for RefCountedPtr<T> {
    fn drop(&mut self) {
        self.set_null();
    }
}

impl<T: RefCounted> Deref for RefCountedPtr<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.get() {
            Some(object) => object,
            None => panic!("Invalid operation: dereferencing a null RefCountedPtr"),
        }
    }
}

impl<T: RefCounted> PartialEq for RefCountedPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T: RefCounted> Eq for RefCountedPtr<T> {}

impl<T: RefCounted + fmt::Debug> fmt::Debug for RefCountedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefCountedPtr").field(&self.get()).finish()
    }
}
