//! # Byte Arena
//!
//! A growable bump region of raw, 16-byte aligned bytes. The arena never
//! constructs or drops values; callers that place typed data in it are
//! responsible for running destructors before [`ByteArena::reset`].

#![allow(unsafe_code)]

use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use std::ops::Range;
use std::ptr::NonNull;

/// Alignment of the arena base address. Bump offsets can be aligned to any
/// power of two up to this value.
pub const ARENA_ALIGN: usize = 16;

/// A bump-pointer byte region.
///
/// Allocation bumps an offset. When growth is requested the contents are
/// copied into a buffer twice as large, so pointers handed out earlier are
/// invalidated; hold offsets instead.
///
/// # Thread Safety
///
/// This arena is NOT thread-safe. Use one arena per thread.
///
/// # Example
///
/// ```rust
/// use krepel_core::ByteArena;
///
/// let mut arena = ByteArena::with_capacity(64);
/// let offset = arena.bump(24, 8).unwrap();
/// assert_eq!(offset, 0);
/// assert_eq!(arena.used(), 24);
///
/// arena.reset();
/// assert_eq!(arena.used(), 0);
/// ```
pub struct ByteArena {
    ptr: NonNull<u8>,
    capacity: usize,
    used: usize,
}

impl ByteArena {
    /// Creates an arena holding `capacity` bytes. A zero capacity allocates
    /// nothing until the first growth.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ptr: Self::allocate_block(capacity),
            capacity,
            used: 0,
        }
    }

    /// Returns the total capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the current used space in bytes.
    #[inline]
    #[must_use]
    pub const fn used(&self) -> usize {
        self.used
    }

    /// Returns the remaining free space in bytes.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.capacity - self.used
    }

    /// Returns where a `size`-byte block aligned to `align` would start and
    /// end, without reserving it.
    ///
    /// # Panics
    ///
    /// Panics if `align` is not a power of two no larger than [`ARENA_ALIGN`].
    #[must_use]
    pub fn fit(&self, size: usize, align: usize) -> (usize, usize) {
        assert!(
            align.is_power_of_two() && align <= ARENA_ALIGN,
            "Invalid argument: arena alignment {align} exceeds {ARENA_ALIGN}"
        );
        let start = (self.used + align - 1) & !(align - 1);
        (start, start + size)
    }

    /// Reserves `size` bytes aligned to `align` and returns their offset,
    /// or `None` if the block does not fit in the current capacity.
    ///
    /// # Panics
    ///
    /// Panics if `align` is not a power of two no larger than [`ARENA_ALIGN`].
    pub fn bump(&mut self, size: usize, align: usize) -> Option<usize> {
        let (start, end) = self.fit(size, align);
        if end > self.capacity {
            return None;
        }
        self.used = end;
        Some(start)
    }

    /// Doubles the capacity until it is at least `min_capacity`, copying the
    /// used bytes into the new block.
    pub fn grow_to(&mut self, min_capacity: usize) {
        if min_capacity <= self.capacity {
            return;
        }
        let mut new_capacity = self.capacity.max(ARENA_ALIGN);
        while new_capacity < min_capacity {
            new_capacity = new_capacity
                .checked_mul(2)
                .unwrap_or_else(|| panic!("Invalid state: arena capacity overflow"));
        }

        let new_ptr = Self::allocate_block(new_capacity);
        // SAFETY: both blocks are live, distinct allocations of at least
        // `self.used` bytes.
        unsafe {
            std::ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_ptr.as_ptr(), self.used);
        }
        Self::free_block(self.ptr, self.capacity);

        tracing::debug!(
            old_capacity = self.capacity,
            new_capacity,
            "byte arena grown"
        );
        self.ptr = new_ptr;
        self.capacity = new_capacity;
    }

    /// Ensures at least `additional` bytes past [`used`](Self::used) fit
    /// without a further growth.
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        let required = self
            .used
            .checked_add(additional)
            .unwrap_or_else(|| panic!("Invalid state: arena capacity overflow"));
        self.grow_to(required);
    }

    /// Raw `[start, start + used)` range of the written bytes.
    #[inline]
    #[must_use]
    pub fn as_ptr_range(&self) -> Range<*const u8> {
        let start = self.ptr.as_ptr().cast_const();
        // SAFETY: `used <= capacity`, so the end stays inside the block.
        start..unsafe { start.add(self.used) }
    }

    /// Rewinds the bump offset. Memory is kept for reuse.
    #[inline]
    pub fn reset(&mut self) {
        self.used = 0;
    }

    /// Sets the used length directly.
    ///
    /// # Panics
    ///
    /// Panics if `used` exceeds the capacity.
    #[inline]
    pub fn set_used(&mut self, used: usize) {
        assert!(used <= self.capacity, "Invalid argument: used exceeds capacity");
        self.used = used;
    }

    /// Returns a pointer to the byte at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is past the end of the arena.
    #[inline]
    #[must_use]
    pub fn ptr_at(&self, offset: usize) -> NonNull<u8> {
        assert!(offset <= self.capacity, "Invalid argument: offset past arena end");
        // SAFETY: `offset` is within (or one past) the allocated block.
        unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(offset)) }
    }

    fn layout(capacity: usize) -> Layout {
        Layout::from_size_align(capacity, ARENA_ALIGN)
            .unwrap_or_else(|_| panic!("Invalid argument: arena capacity {capacity} is too large"))
    }

    fn allocate_block(capacity: usize) -> NonNull<u8> {
        if capacity == 0 {
            return Self::dangling();
        }
        let layout = Self::layout(capacity);
        // SAFETY: `layout` has a non-zero size.
        let ptr = unsafe { alloc(layout) };
        NonNull::new(ptr).unwrap_or_else(|| handle_alloc_error(layout))
    }

    fn free_block(ptr: NonNull<u8>, capacity: usize) {
        if capacity == 0 {
            return;
        }
        // SAFETY: `ptr` came from `allocate_block(capacity)` with the same layout.
        unsafe { dealloc(ptr.as_ptr(), Self::layout(capacity)) };
    }

    fn dangling() -> NonNull<u8> {
        // SAFETY: ARENA_ALIGN is non-zero.
        unsafe { NonNull::new_unchecked(ARENA_ALIGN as *mut u8) }
    }
}

impl Drop for ByteArena {
    fn drop(&mut self) {
        Self::free_block(self.ptr, self.capacity);
    }
}

impl std::fmt::Debug for ByteArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteArena")
            .field("capacity", &self.capacity)
            .field("used", &self.used)
            .finish()
    }
}
