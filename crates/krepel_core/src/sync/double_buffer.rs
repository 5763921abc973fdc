//! # Double Buffer
//!
//! Two instances of the same state with alternating roles: one is being
//! produced for the next frame while the other is consumed.
//!
//! ## Architecture
//!
//! ```text
//!     frame N:    [ A: write ]   [ B: read ]
//!                      │ swap()
//!     frame N+1:  [ A: read  ]   [ B: write ]
//! ```
//!
//! Access goes through `&self`/`&mut self`, so the borrow checker rules out a
//! swap while either side is borrowed.

/// A pair of buffers whose write and read roles are exchanged by [`swap`](Self::swap).
///
/// ```rust
/// use krepel_core::DoubleBuffer;
///
/// let mut buffers = DoubleBuffer::new(Vec::new(), Vec::new());
/// buffers.write().push(1);
/// assert!(buffers.read().is_empty());
///
/// buffers.swap();
/// assert_eq!(buffers.read(), &[1]);
/// assert_eq!(buffers.frame_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DoubleBuffer<T> {
    buffers: [T; 2],
    /// Index of the current write buffer (0 or 1). Read is `write_index ^ 1`.
    write_index: usize,
    /// Number of swaps performed.
    frame_count: u64,
}

impl<T> DoubleBuffer<T> {
    /// Creates a double buffer. `first` starts as the write buffer.
    #[must_use]
    pub const fn new(first: T, second: T) -> Self {
        Self {
            buffers: [first, second],
            write_index: 0,
            frame_count: 0,
        }
    }

    /// Returns the index of the buffer currently being written.
    #[inline]
    #[must_use]
    pub const fn write_index(&self) -> usize {
        self.write_index
    }

    /// Returns how many times the roles have been swapped.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Mutable access to the write buffer.
    #[inline]
    pub fn write(&mut self) -> &mut T {
        &mut self.buffers[self.write_index]
    }

    /// Shared access to the write buffer.
    #[inline]
    #[must_use]
    pub fn peek_write(&self) -> &T {
        &self.buffers[self.write_index]
    }

    /// Shared access to the read buffer.
    #[inline]
    #[must_use]
    pub fn read(&self) -> &T {
        &self.buffers[self.write_index ^ 1]
    }

    /// Mutable access to the read buffer.
    #[inline]
    pub fn read_mut(&mut self) -> &mut T {
        &mut self.buffers[self.write_index ^ 1]
    }

    /// Mutable access to both buffers at once, as `(write, read)`.
    pub fn write_and_read(&mut self) -> (&mut T, &mut T) {
        let (first, second) = self.buffers.split_at_mut(1);
        if self.write_index == 0 {
            (&mut first[0], &mut second[0])
        } else {
            (&mut second[0], &mut first[0])
        }
    }

    /// Both buffers in index order, regardless of role.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.buffers.iter_mut()
    }

    /// Exchanges the write and read roles.
    #[inline]
    pub fn swap(&mut self) {
        self.write_index ^= 1;
        self.frame_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_buffer_creation() {
        let buffers = DoubleBuffer::new(1, 2);
        assert_eq!(buffers.frame_count(), 0);
        assert_eq!(buffers.write_index(), 0);
        assert_eq!(*buffers.read(), 2);
    }

    #[test]
    fn test_buffer_swap() {
        let mut buffers = DoubleBuffer::new(Vec::new(), Vec::new());
        buffers.write().push("frame 0");
        buffers.swap();

        assert_eq!(buffers.read(), &["frame 0"]);
        assert!(buffers.write().is_empty());
        assert_eq!(buffers.write_index(), 1);

        buffers.swap();
        assert_eq!(buffers.write(), &mut vec!["frame 0"]);
        assert_eq!(buffers.frame_count(), 2);
    }

    #[test]
    fn test_write_and_read_split() {
        let mut buffers = DoubleBuffer::new(0, 0);
        buffers.swap();
        {
            let (write, read) = buffers.write_and_read();
            *write = 7;
            *read = 3;
        }
        assert_eq!(buffers.buffers, [3, 7]);
    }
}
