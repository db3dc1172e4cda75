//! Grow-only staging buffers.

use tracing::trace;

/// An owned staging buffer whose length never shrinks.
///
/// Growing replaces the allocation outright; the previous contents are not
/// preserved because callers overwrite the region they use.
#[derive(Debug, Default)]
pub(crate) struct Scratch<T> {
    buf: Vec<T>,
}

impl<T: Copy + Default> Scratch<T> {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Usable length in elements.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Makes sure at least `len` elements are available.
    pub fn ensure(&mut self, len: usize) {
        if self.buf.len() >= len {
            return;
        }
        trace!(from = self.buf.len(), to = len, "scratch grow");
        self.buf = vec![T::default(); len];
    }

    /// Frees the allocation.
    pub fn release(&mut self) {
        self.buf = Vec::new();
    }

    pub fn as_slice(&self) -> &[T] {
        &self.buf
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.buf
    }
}
