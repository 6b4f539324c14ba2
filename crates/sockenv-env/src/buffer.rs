//! Fixed-capacity ring buffer with overwrite-oldest insertion.
//!
//! [`RingBuffer`] stores `capacity` elements of a fixed shape in one flat,
//! zero-initialised `f32` allocation. Pushing never fails because the buffer
//! is full; the oldest element is overwritten instead.
//!
//! [`get`](RingBuffer::get) always returns `capacity` elements, oldest first.
//! Slots that were never written keep their zero value and show up at the
//! oldest positions, so a fixed-width consumer always sees a constant-length
//! series.

use sockenv_core::error::BufferError;
use tracing::trace;

// ---------------------------------------------------------------------------
// RingBuffer
// ---------------------------------------------------------------------------

/// Circular store of the most recent `capacity` elements.
#[derive(Clone, Debug)]
pub struct RingBuffer {
    /// Flat storage, `capacity * element_len` values.
    data: Vec<f32>,
    shape: Vec<usize>,
    element_len: usize,
    capacity: usize,
    /// Slot of the most recent write; `None` before the first push.
    write_cursor: Option<usize>,
    /// Elements written so far, saturating at `capacity`.
    count: usize,
}

impl RingBuffer {
    /// Create a zero-filled buffer of `capacity` elements of `shape`.
    pub fn new(capacity: usize, shape: &[usize]) -> Result<Self, BufferError> {
        if capacity == 0 {
            return Err(BufferError::InvalidCapacity(capacity));
        }
        if shape.is_empty() || shape.contains(&0) {
            return Err(BufferError::InvalidShape(shape.to_vec()));
        }
        let element_len = shape.iter().product();
        Ok(Self {
            data: vec![0.0; capacity * element_len],
            shape: shape.to_vec(),
            element_len,
            capacity,
            write_cursor: None,
            count: 0,
        })
    }

    /// Append an element, overwriting the oldest one once full.
    ///
    /// `values` is the element in row-major order. Fails with
    /// [`BufferError::ShapeMismatch`] if `shape` differs from the buffer's
    /// element shape or `values` does not fill it; the buffer is left
    /// untouched in that case.
    pub fn push(&mut self, shape: &[usize], values: &[f32]) -> Result<(), BufferError> {
        if shape != self.shape.as_slice() {
            return Err(BufferError::ShapeMismatch {
                expected: self.shape.clone(),
                got: shape.to_vec(),
            });
        }
        if values.len() != self.element_len {
            return Err(BufferError::ShapeMismatch {
                expected: self.shape.clone(),
                got: vec![values.len()],
            });
        }

        let slot = self.write_cursor.map_or(0, |c| (c + 1) % self.capacity);
        let start = slot * self.element_len;
        self.data[start..start + self.element_len].copy_from_slice(values);
        self.write_cursor = Some(slot);
        self.count = (self.count + 1).min(self.capacity);

        trace!(slot, count = self.count, "ring buffer push");
        Ok(())
    }

    /// Append a rank-1 element whose shape is `[values.len()]`.
    pub fn push_vector(&mut self, values: &[f32]) -> Result<(), BufferError> {
        self.push(&[values.len()], values)
    }

    /// All `capacity` elements in chronological order, oldest first.
    ///
    /// Before the buffer has wrapped, the leading `capacity - len()` entries
    /// are the zero element.
    pub fn get(&self) -> Vec<Vec<f32>> {
        let start = self.oldest_slot();
        (0..self.capacity)
            .map(|i| self.slot((start + i) % self.capacity).to_vec())
            .collect()
    }

    /// Transposed [`get`](Self::get) for rank-1 elements: one row per
    /// component, each `capacity` values long.
    pub fn channels(&self) -> Vec<Vec<f32>> {
        let elements = self.get();
        (0..self.element_len)
            .map(|ch| elements.iter().map(|e| e[ch]).collect())
            .collect()
    }

    /// Number of elements each [`get`](Self::get) returns.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Element shape.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Elements written so far, at most `capacity`.
    pub const fn len(&self) -> usize {
        self.count
    }

    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub const fn is_full(&self) -> bool {
        self.count == self.capacity
    }

    /// Slot of the most recent write, `None` before the first push.
    pub const fn write_cursor(&self) -> Option<usize> {
        self.write_cursor
    }

    /// Slot that holds the oldest element of the chronological readout.
    const fn oldest_slot(&self) -> usize {
        match self.write_cursor {
            Some(c) => (c + 1) % self.capacity,
            None => 0,
        }
    }

    fn slot(&self, index: usize) -> &[f32] {
        let start = index * self.element_len;
        &self.data[start..start + self.element_len]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
