//! # Extraction Buffer
//!
//! One half of the extraction double buffer: a [`ByteArena`] holding
//! back-to-back [record slots](super::record). While `WriteOnly` it accepts
//! allocations from the extractor; while `ReadOnly` the renderer walks or
//! drains it.
//!
//! ## Safety Note
//!
//! The arena stores typed payloads as raw bytes. The invariants that keep the
//! unsafe reads sound:
//!
//! 1. Slots in `[0, used)` are contiguous, each starting at a
//!    [`RECORD_ALIGN`]-aligned offset with a valid header.
//! 2. Each slot's payload is initialized and owned by the buffer until it is
//!    moved out by [`ExtractionBuffer::drain`] or dropped by
//!    [`ExtractionBuffer::reset`].
//! 3. Padding bytes are never read.

#![allow(unsafe_code)]

use std::fmt;
use std::marker::PhantomData;
use std::ops::Range;

use krepel_core::ByteArena;

use super::record::{
    record_size, take_record, ExtractionPayload, ExtractionRecord, RecordHeader, RecordKind,
    RecordSlot, RECORD_ALIGN,
};

/// Default initial capacity of each extraction buffer, in bytes.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// Which side of the pipeline currently owns a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferMode {
    /// Being consumed by presentation. Allocation is fatal.
    ReadOnly,
    /// Being filled by extraction.
    WriteOnly,
}

/// A growable arena of extraction records.
pub struct ExtractionBuffer {
    arena: ByteArena,
    mode: BufferMode,
    growth_allowed: bool,
    record_count: usize,
    camera_missing: bool,
}

impl ExtractionBuffer {
    /// Creates a buffer with `initial_capacity` bytes.
    #[must_use]
    pub fn new(initial_capacity: usize, mode: BufferMode) -> Self {
        Self {
            arena: ByteArena::with_capacity(initial_capacity),
            mode,
            growth_allowed: true,
            record_count: 0,
            camera_missing: false,
        }
    }

    /// Current mode.
    #[inline]
    #[must_use]
    pub const fn mode(&self) -> BufferMode {
        self.mode
    }

    /// Changes the mode. Done by the pipeline at swap time.
    #[inline]
    pub fn set_mode(&mut self, mode: BufferMode) {
        self.mode = mode;
    }

    /// Whether a full buffer may grow instead of failing.
    #[inline]
    #[must_use]
    pub const fn growth_allowed(&self) -> bool {
        self.growth_allowed
    }

    /// Enables or disables growth.
    #[inline]
    pub fn set_growth_allowed(&mut self, allowed: bool) {
        self.growth_allowed = allowed;
    }

    /// Whether the extraction pass that filled this buffer recorded no
    /// camera. Cleared by [`reset`](Self::reset) and [`drain`](Self::drain).
    #[inline]
    #[must_use]
    pub const fn camera_missing(&self) -> bool {
        self.camera_missing
    }

    /// Flags the buffer contents as extracted without a camera. Set by the
    /// pipeline at the end of each extraction pass.
    #[inline]
    pub fn set_camera_missing(&mut self, missing: bool) {
        self.camera_missing = missing;
    }

    /// Bytes occupied by records, padding included.
    #[inline]
    #[must_use]
    pub const fn allocated_bytes(&self) -> usize {
        self.arena.used()
    }

    /// Bytes available before the next growth.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Number of records currently stored.
    #[inline]
    #[must_use]
    pub const fn record_count(&self) -> usize {
        self.record_count
    }

    /// Returns whether no record is stored.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.record_count == 0
    }

    /// Raw `[start, end)` range of the record bytes. Never dereference
    /// padding through it.
    #[inline]
    #[must_use]
    pub fn as_ptr_range(&self) -> Range<*const u8> {
        self.arena.as_ptr_range()
    }

    /// Appends a record and returns its payload.
    ///
    /// When the slot does not fit, the buffer doubles until it does and
    /// copies the existing records over, so references returned by earlier
    /// calls cannot outlive this one.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is `ReadOnly`, or if it is full and growth is
    /// disabled.
    pub fn allocate<R: ExtractionPayload>(&mut self, payload: R) -> &mut R {
        assert!(
            self.mode == BufferMode::WriteOnly,
            "Invalid operation: cannot allocate from a read-only extraction buffer"
        );

        let size = record_size::<R>();
        let byte_len = u32::try_from(size)
            .unwrap_or_else(|_| panic!("Invalid record type: {size} bytes exceed the header range"));
        let (start, end) = self.arena.fit(size, RECORD_ALIGN);
        if end > self.arena.capacity() {
            assert!(
                self.growth_allowed,
                "Out of memory: extraction buffer holds {} of {} bytes and growth is disabled",
                self.arena.used(),
                self.arena.capacity()
            );
            self.arena.grow_to(end);
        }
        self.arena.set_used(end);
        self.record_count += 1;

        let slot = self.arena.ptr_at(start).as_ptr().cast::<RecordSlot<R>>();
        // SAFETY: `[start, end)` lies inside the arena, `start` is aligned to
        // RECORD_ALIGN (and `record_size` checked the slot alignment), and the
        // bytes are not part of any other record.
        unsafe {
            slot.write(RecordSlot {
                header: RecordHeader {
                    kind: R::KIND as u32,
                    byte_len,
                },
                payload,
            });
            &mut (*slot).payload
        }
    }

    /// Drops every record not yet consumed and rewinds to empty. Capacity is
    /// kept.
    pub fn reset(&mut self) {
        let end = self.arena.used();
        // Rewind first so a panicking destructor cannot cause a double drop.
        self.arena.reset();
        self.record_count = 0;
        self.camera_missing = false;
        let mut offset = 0;
        while offset < end {
            let (kind, byte_len, slot) = self.slot_at(offset);
            // SAFETY: the slot is live and is never visited again.
            drop(unsafe { take_record(kind, slot) });
            offset += byte_len;
        }
    }

    /// Walks the records in allocation order without consuming them.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            buffer: self,
            offset: 0,
            end: self.arena.used(),
        }
    }

    /// Moves every record out in allocation order, leaving the buffer empty.
    ///
    /// Records the caller does not pull are dropped when the iterator is.
    ///
    /// # Panics
    ///
    /// Panics unless the buffer is `ReadOnly`.
    pub fn drain(&mut self) -> Drain<'_> {
        assert!(
            self.mode == BufferMode::ReadOnly,
            "Invalid operation: only a read-only extraction buffer can be drained"
        );
        let end = self.arena.used();
        // From here on the drain owns the records; leaking it leaks them.
        self.arena.reset();
        self.record_count = 0;
        self.camera_missing = false;
        Drain {
            buffer: self,
            offset: 0,
            end,
        }
    }

    fn slot_at(&self, offset: usize) -> (RecordKind, usize, *const u8) {
        let slot = self.arena.ptr_at(offset).as_ptr().cast_const();
        // SAFETY: every offset produced by walking `byte_len` from 0 starts a
        // slot, and every slot starts with an initialized, aligned header.
        let header = unsafe { slot.cast::<RecordHeader>().read() };
        let kind = RecordKind::from_raw(header.kind).unwrap_or_else(|| {
            panic!("Invalid state: corrupt extraction record header at offset {offset}")
        });
        (kind, header.byte_len as usize, slot)
    }
}

impl Default for ExtractionBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY, BufferMode::WriteOnly)
    }
}

impl Drop for ExtractionBuffer {
    fn drop(&mut self) {
        self.reset();
    }
}

impl fmt::Debug for ExtractionBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionBuffer")
            .field("mode", &self.mode)
            .field("growth_allowed", &self.growth_allowed)
            .field("record_count", &self.record_count)
            .field("camera_missing", &self.camera_missing)
            .field("allocated_bytes", &self.allocated_bytes())
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// A borrowed view of one record, yielded by [`ExtractionBuffer::iter`].
#[derive(Clone, Copy)]
pub struct RecordRef<'a> {
    kind: RecordKind,
    offset: usize,
    byte_len: usize,
    slot: *const u8,
    _buffer: PhantomData<&'a ExtractionBuffer>,
}

impl<'a> RecordRef<'a> {
    /// Record kind.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Byte offset of the slot within the buffer.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Slot length, header and padding included.
    #[inline]
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// The payload, if this record is an `R`.
    #[must_use]
    pub fn downcast<R: ExtractionPayload>(&self) -> Option<&'a R> {
        if R::KIND != self.kind {
            return None;
        }
        // SAFETY: the header says this slot holds an `R`, and the shared
        // borrow of the buffer keeps it alive and unmodified for `'a`.
        let slot = unsafe { &*self.slot.cast::<RecordSlot<R>>() };
        debug_assert_eq!(slot.header.byte_len as usize, self.byte_len);
        Some(&slot.payload)
    }
}

impl fmt::Debug for RecordRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordRef")
            .field("kind", &self.kind)
            .field("offset", &self.offset)
            .field("byte_len", &self.byte_len)
            .finish()
    }
}

/// Iterator over [`RecordRef`]s.
#[derive(Debug)]
pub struct Iter<'a> {
    buffer: &'a ExtractionBuffer,
    offset: usize,
    end: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = RecordRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.end {
            return None;
        }
        let (kind, byte_len, slot) = self.buffer.slot_at(self.offset);
        let record = RecordRef {
            kind,
            offset: self.offset,
            byte_len,
            slot,
            _buffer: PhantomData,
        };
        self.offset += byte_len;
        Some(record)
    }
}

/// Owning iterator returned by [`ExtractionBuffer::drain`].
#[derive(Debug)]
pub struct Drain<'a> {
    buffer: &'a mut ExtractionBuffer,
    offset: usize,
    end: usize,
}

impl Iterator for Drain<'_> {
    type Item = ExtractionRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.end {
            return None;
        }
        let (kind, byte_len, slot) = self.buffer.slot_at(self.offset);
        self.offset += byte_len;
        // SAFETY: the offset moved past this slot, so it is read exactly once.
        Some(unsafe { take_record(kind, slot) })
    }
}

impl Drop for Drain<'_> {
    fn drop(&mut self) {
        self.for_each(drop);
    }
}
