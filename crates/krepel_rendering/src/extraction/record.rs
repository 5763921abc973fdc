//! # Extraction Records
//!
//! Every record occupies one slot in an [`ExtractionBuffer`](super::ExtractionBuffer):
//!
//! ```text
//! offset ──► ┌──────────────┬────────────┬─────────────┬──────────┐
//!            │ kind: u32    │ byte_len   │ payload R   │ padding  │
//!            └──────────────┴────────────┴─────────────┴──────────┘
//!            ◄──────────────── byte_len (multiple of 16) ─────────►
//! ```
//!
//! `byte_len` is the distance to the next slot, so a reader can walk the
//! buffer without knowing payload types. The set of payloads is closed:
//! [`RecordKind`] is matched exhaustively on the read path.

#![allow(unsafe_code)]

use std::ptr;

use bytemuck::{Pod, Zeroable};
use krepel_core::{Borrowed, ARENA_ALIGN};

use crate::resource::{Sampler, ShaderProgram, Texture, VertexBuffer};
use crate::scene::{Color, Mat4, Transform2D, Vec2};

/// Alignment and size granularity of every record slot.
pub const RECORD_ALIGN: usize = ARENA_ALIGN;

/// Discriminant stored in every record header.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// View and projection for the draws that follow.
    Camera = 1,
    /// A textured quad.
    Sprite = 2,
    /// A debug line segment.
    Line = 3,
    /// A debug circle outline.
    Circle = 4,
}

impl RecordKind {
    /// Decodes a raw header tag. Zero is never a valid kind.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(Self::Camera),
            2 => Some(Self::Sprite),
            3 => Some(Self::Line),
            4 => Some(Self::Circle),
            _ => None,
        }
    }
}

/// Fixed header at the start of every slot.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct RecordHeader {
    /// Raw [`RecordKind`].
    pub kind: u32,
    /// Slot length in bytes, header and padding included.
    pub byte_len: u32,
}

#[repr(C)]
pub(crate) struct RecordSlot<R> {
    pub(crate) header: RecordHeader,
    pub(crate) payload: R,
}

/// Camera matrices for the draws that follow in the same frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraData {
    /// World to view.
    pub view: Mat4,
    /// View to clip.
    pub projection: Mat4,
}

/// Everything the device needs to draw one sprite.
///
/// The resource handles are borrows: while the record is alive, the owners
/// of these resources cannot release them.
#[derive(Debug, Clone)]
pub struct SpriteData {
    /// Texture to sample.
    pub texture: Borrowed<Texture>,
    /// Program to draw with.
    pub shader: Borrowed<ShaderProgram>,
    /// Quad geometry.
    pub vertex_buffer: Borrowed<VertexBuffer>,
    /// Sampler state.
    pub sampler: Borrowed<Sampler>,
    /// World transform.
    pub transform: Transform2D,
    /// Size in world units.
    pub size: Vec2,
    /// Tint.
    pub color: Color,
}

/// A debug line segment.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LineData {
    /// First end point.
    pub start: Vec2,
    /// Second end point.
    pub end: Vec2,
    /// Line color.
    pub color: Color,
}

/// A debug circle outline.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CircleData {
    /// Center point.
    pub center: Vec2,
    /// Radius in world units.
    pub radius: f32,
    /// Outline color.
    pub color: Color,
}

/// An owned record moved out of a buffer by [`drain`](super::ExtractionBuffer::drain).
#[derive(Debug, Clone)]
pub enum ExtractionRecord {
    /// See [`CameraData`].
    Camera(CameraData),
    /// See [`SpriteData`].
    Sprite(SpriteData),
    /// See [`LineData`].
    Line(LineData),
    /// See [`CircleData`].
    Circle(CircleData),
}

impl ExtractionRecord {
    /// Kind tag of this record.
    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::Camera(_) => RecordKind::Camera,
            Self::Sprite(_) => RecordKind::Sprite,
            Self::Line(_) => RecordKind::Line,
            Self::Circle(_) => RecordKind::Circle,
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A payload type that can be stored in an extraction buffer.
///
/// Implemented for the four record payloads only.
pub trait ExtractionPayload: sealed::Sealed + Sized + 'static {
    /// Tag written into the header.
    const KIND: RecordKind;
}

macro_rules! payload {
    ($ty:ty, $kind:ident) => {
        impl sealed::Sealed for $ty {}
        impl ExtractionPayload for $ty {
            const KIND: RecordKind = RecordKind::$kind;
        }
    };
}

payload!(CameraData, Camera);
payload!(SpriteData, Sprite);
payload!(LineData, Line);
payload!(CircleData, Circle);

/// Bytes one record of type `R` occupies, rounded up to [`RECORD_ALIGN`].
///
/// # Panics
///
/// Panics if the slot needs a stricter alignment than [`RECORD_ALIGN`].
#[must_use]
pub fn record_size<R: ExtractionPayload>() -> usize {
    assert!(
        std::mem::align_of::<RecordSlot<R>>() <= RECORD_ALIGN,
        "Invalid record type: alignment exceeds {RECORD_ALIGN}"
    );
    let raw = std::mem::size_of::<RecordSlot<R>>();
    (raw + RECORD_ALIGN - 1) & !(RECORD_ALIGN - 1)
}

/// Moves the payload out of a slot.
///
/// # Safety
///
/// `slot` must point to a live `RecordSlot<R>` whose payload is not read
/// again afterwards.
unsafe fn read_payload<R>(slot: *const u8) -> R {
    ptr::read(ptr::addr_of!((*slot.cast::<RecordSlot<R>>()).payload))
}

/// Moves the record of kind `kind` out of `slot`.
///
/// # Safety
///
/// `slot` must point to a live slot whose header holds `kind`. The slot
/// counts as consumed afterwards and must not be read or dropped again.
pub(crate) unsafe fn take_record(kind: RecordKind, slot: *const u8) -> ExtractionRecord {
    match kind {
        RecordKind::Camera => ExtractionRecord::Camera(read_payload(slot)),
        RecordKind::Sprite => ExtractionRecord::Sprite(read_payload(slot)),
        RecordKind::Line => ExtractionRecord::Line(read_payload(slot)),
        RecordKind::Circle => ExtractionRecord::Circle(read_payload(slot)),
    }
}
