//! # Owned and Borrowed Handles
//!
//! Exclusive ownership with counted, non-owning borrows.
//!
//! ## Safety Note
//!
//! The resource slot lives in an `UnsafeCell` inside a shared control block.
//! All unsafe blocks rely on one invariant: the slot is only mutated through
//! `&mut Owned` while `borrow_count == 0`, and every live `Borrowed` holds
//! exactly one count on its control block.

#![allow(unsafe_code)]

use std::cell::UnsafeCell;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Cleanup function invoked with the resource when its owner releases it.
type Cleanup<T> = Box<dyn FnMut(T)>;

/// Shared bookkeeping behind an `Owned`/`Borrowed` pair.
struct ControlBlock<T> {
    /// The owned resource, `None` once released or before assignment.
    resource: UnsafeCell<Option<T>>,
    /// Number of live `Borrowed` handles pointing at this block.
    borrow_count: AtomicI64,
}

impl<T> ControlBlock<T> {
    fn new(resource: Option<T>) -> Arc<Self> {
        Arc::new(Self {
            resource: UnsafeCell::new(resource),
            borrow_count: AtomicI64::new(0),
        })
    }

    #[inline]
    fn add_ref(&self) {
        self.borrow_count.fetch_add(1, Ordering::AcqRel);
    }

    #[inline]
    fn remove_ref(&self) {
        let previous = self.borrow_count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "Borrow count underflow");
    }

    #[inline]
    fn borrow_count(&self) -> i64 {
        self.borrow_count.load(Ordering::Acquire)
    }

    #[inline]
    fn resource(&self) -> Option<&T> {
        // SAFETY: the slot is only written through `slot_mut`, which requires
        // exclusive access to the owner and zero outstanding borrows, so no
        // writer can exist while this shared view is alive.
        unsafe { (*self.resource.get()).as_ref() }
    }

    /// # Safety
    ///
    /// The caller must hold the unique `Owned` for this block mutably and must
    /// guarantee that no reference obtained from `resource()` is alive.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    unsafe fn slot_mut(&self) -> &mut Option<T> {
        &mut *self.resource.get()
    }
}

/// Exclusive owner of one resource.
///
/// Exactly one `Owned` exists per resource. It cannot be cloned; moving it
/// (or calling [`Owned::take`]) transfers the control block. Dropping or
/// resetting it invokes the cleanup function, which is only legal while no
/// [`Borrowed`] handle is alive.
///
/// # Example
///
/// ```rust
/// use krepel_core::{own, Owned};
///
/// let mut texture = own(7u32, |id| println!("freeing texture {id}"));
/// {
///     let view = texture.borrow();
///     assert_eq!(*view, 7);
///     assert_eq!(texture.borrow_count(), 1);
/// }
/// texture.reset();
/// assert!(!texture.is_valid());
/// ```
pub struct Owned<T> {
    block: Arc<ControlBlock<T>>,
    /// `None` drops the resource normally.
    cleanup: Option<Cleanup<T>>,
}

impl<T> Owned<T> {
    /// Takes ownership of `resource`, dropping it normally on release.
    #[must_use]
    pub fn new(resource: T) -> Self {
        Self {
            block: ControlBlock::new(Some(resource)),
            cleanup: None,
        }
    }

    /// Creates an owner that holds nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            block: ControlBlock::new(None),
            cleanup: None,
        }
    }

    /// Returns whether a resource is currently held.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.block.resource().is_some()
    }

    /// Returns the number of live borrows of this resource.
    #[inline]
    #[must_use]
    pub fn borrow_count(&self) -> i64 {
        self.block.borrow_count()
    }

    /// Returns the resource, or `None` if nothing is held.
    #[inline]
    #[must_use]
    pub fn try_get(&self) -> Option<&T> {
        self.block.resource()
    }

    /// Returns the resource.
    ///
    /// # Panics
    ///
    /// Panics if the owner holds nothing.
    #[inline]
    #[must_use]
    pub fn get(&self) -> &T {
        match self.block.resource() {
            Some(resource) => resource,
            None => panic!("Validation failed: owner holds no resource"),
        }
    }

    /// Returns mutable access to the resource.
    ///
    /// # Panics
    ///
    /// Panics if the owner holds nothing or if any borrow is outstanding.
    #[must_use]
    pub fn get_mut(&mut self) -> &mut T {
        let count = self.borrow_count();
        assert!(
            count == 0,
            "Ownership violation: mutable access while {count} borrow(s) are outstanding"
        );
        // SAFETY: `&mut self` and a zero borrow count mean no other reference
        // into the slot exists.
        match unsafe { self.block.slot_mut() } {
            Some(resource) => resource,
            None => panic!("Validation failed: owner holds no resource"),
        }
    }

    /// Creates a new borrow of this resource.
    ///
    /// Borrowing an empty owner yields a handle that reports
    /// [`Borrowed::is_valid`] as `false`.
    #[must_use]
    pub fn borrow(&self) -> Borrowed<T> {
        self.block.add_ref();
        Borrowed {
            block: Some(Arc::clone(&self.block)),
        }
    }

    /// Releases the resource through the cleanup function.
    ///
    /// Does nothing if no resource is held, so the cleanup runs exactly once.
    ///
    /// # Panics
    ///
    /// Panics if the resource is still borrowed.
    pub fn reset(&mut self) {
        if let Some(resource) = self.release_checked("reset") {
            if let Some(cleanup) = self.cleanup.as_mut() {
                cleanup(resource);
            }
        }
    }

    /// Releases the current resource (if any) and takes ownership of `resource`.
    ///
    /// Borrows taken while this owner was empty stay invalid: if any are
    /// still alive, the new resource gets a fresh control block.
    ///
    /// # Panics
    ///
    /// Panics if the current resource is still borrowed.
    pub fn assign<F>(&mut self, resource: T, cleanup: F)
    where
        F: FnMut(T) + 'static,
    {
        self.reset();
        if self.borrow_count() == 0 {
            // SAFETY: exclusive access; the slot is empty and unborrowed.
            unsafe {
                *self.block.slot_mut() = Some(resource);
            }
        } else {
            self.block = ControlBlock::new(Some(resource));
        }
        self.cleanup = Some(Box::new(cleanup));
    }

    /// Gives up ownership without running the cleanup function.
    ///
    /// The caller becomes responsible for the returned resource.
    ///
    /// # Panics
    ///
    /// Panics if the resource is still borrowed.
    #[must_use]
    pub fn yield_ownership(&mut self) -> Option<T> {
        self.release_checked("yield ownership of")
    }

    /// Moves ownership into a new `Owned`, leaving this one empty.
    ///
    /// Outstanding borrows follow the control block to the new owner. No
    /// cleanup runs.
    #[must_use]
    pub fn take(&mut self) -> Self {
        std::mem::replace(self, Self::empty())
    }

    /// Exchanges resources and cleanup functions with `other`.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    fn release_checked(&mut self, action: &str) -> Option<T> {
        if !self.is_valid() {
            return None;
        }
        let count = self.borrow_count();
        assert!(
            count == 0,
            "Ownership violation: cannot {action} a resource that is still borrowed ({count} outstanding)"
        );
        // SAFETY: exclusive access and no outstanding borrows.
        unsafe { self.block.slot_mut().take() }
    }
}

impl<T> Default for Owned<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Deref for Owned<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.get()
    }
}

impl<T> Drop for Owned<T> {
    fn drop(&mut self) {
        if std::thread::panicking() && self.is_valid() && self.borrow_count() != 0 {
            // A second panic would abort; leak the resource instead.
            tracing::error!(
                borrows = self.borrow_count(),
                "owner dropped during unwinding with live borrows, resource leaked"
            );
            return;
        }
        self.reset();
    }
}

impl<T: fmt::Debug> fmt::Debug for Owned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owned")
            .field("resource", &self.block.resource())
            .field("borrow_count", &self.borrow_count())
            .finish()
    }
}

/// Non-owning, counted reference to a resource held by an [`Owned`].
///
/// Cloning increments the owner's borrow count and dropping decrements it.
/// Dereferencing asserts that the resource is still present; the view is
/// always read-only.
pub struct Borrowed<T> {
    block: Option<Arc<ControlBlock<T>>>,
}

impl<T> Borrowed<T> {
    /// Creates a handle that refers to nothing.
    #[must_use]
    pub const fn null() -> Self {
        Self { block: None }
    }

    /// Returns whether the handle refers to a present resource.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.try_get().is_some()
    }

    /// Returns the resource, or `None` for a null or released borrow.
    #[inline]
    #[must_use]
    pub fn try_get(&self) -> Option<&T> {
        self.block.as_ref().and_then(|block| block.resource())
    }

    /// Returns the resource.
    ///
    /// # Panics
    ///
    /// Panics if the handle is null or the resource was released.
    #[inline]
    #[must_use]
    pub fn get(&self) -> &T {
        let Some(block) = self.block.as_ref() else {
            panic!("Invalid state: borrow handle has no control block");
        };
        match block.resource() {
            Some(resource) => resource,
            None => panic!("Validation failed: borrowed resource is not present"),
        }
    }

    /// Returns whether both handles refer to the same control block.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.block, &other.block) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

/// Borrows the resource held by `owned`.
#[must_use]
pub fn borrow<T>(owned: &Owned<T>) -> Borrowed<T> {
    owned.borrow()
}

impl<T> Default for Borrowed<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> Clone for Borrowed<T> {
    fn clone(&self) -> Self {
        if let Some(block) = &self.block {
            block.add_ref();
        }
        Self {
            block: self.block.clone(),
        }
    }
}

impl<T> Drop for Borrowed<T> {
    fn drop(&mut self) {
        if let Some(block) = self.block.take() {
            block.remove_ref();
        }
    }
}

impl<T> Deref for Borrowed<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.get()
    }
}

impl<T: fmt::Debug> fmt::Debug for Borrowed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Borrowed").field(&self.try_get()).finish()
    }
}

/// Takes ownership of `resource`; `cleanup` runs when the owner releases it.
#[must_use]
pub fn own<T, F>(resource: T, cleanup: F) -> Owned<T>
where
    F: FnMut(T) + 'static,
{
    Owned {
        block: ControlBlock::new(Some(resource)),
        cleanup: Some(Box::new(cleanup)),
    }
}

/// Like [`own`], but accepts an absent resource and yields an empty owner.
#[must_use]
pub fn own_nullable<T, F>(resource: Option<T>, cleanup: F) -> Owned<T>
where
    F: FnMut(T) + 'static,
{
    Owned {
        block: ControlBlock::new(resource),
        cleanup: Some(Box::new(cleanup)),
    }
}
