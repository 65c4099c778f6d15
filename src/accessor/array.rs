//! Growable vector accessors.
//!
//! Backing length changes only through the local [`resize`](IntArrayAccessor::resize)
//! API; host-driven writes clamp to the current length and never grow the
//! store. Each read or write is one bounded copy under a short lock.

use parking_lot::RwLock;

use crate::accessor::{bounded_read, bounded_write, Accessor};
use crate::shape::ShapeSet;

/// A growable sequence of 32-bit signed integers.
#[derive(Debug, Default)]
pub struct IntArrayAccessor {
    data: RwLock<Vec<i32>>,
}

impl IntArrayAccessor {
    /// Create a zero-filled array of the given length.
    pub fn new(len: usize) -> Self {
        Self {
            data: RwLock::new(vec![0; len]),
        }
    }

    /// Create an array from existing values.
    pub fn from_values(values: Vec<i32>) -> Self {
        Self {
            data: RwLock::new(values),
        }
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Grow or shrink the backing store; new elements are zero.
    pub fn resize(&self, new_len: usize) {
        self.data.write().resize(new_len, 0);
    }

    /// Snapshot of the current contents.
    pub fn values(&self) -> Vec<i32> {
        self.data.read().clone()
    }
}

impl Accessor for IntArrayAccessor {
    fn shapes(&self) -> ShapeSet {
        ShapeSet::INT_ARRAY
    }

    fn int_count(&self) -> usize {
        self.data.read().len()
    }

    fn read_ints(&self, offset: usize, dest: &mut [i32]) -> usize {
        bounded_read(&self.data.read(), offset, dest)
    }

    fn write_ints(&self, offset: usize, src: &[i32]) {
        bounded_write(&mut self.data.write(), offset, src);
    }
}

/// A growable sequence of 32-bit floats.
#[derive(Debug, Default)]
pub struct FloatArrayAccessor {
    data: RwLock<Vec<f32>>,
}

impl FloatArrayAccessor {
    /// Create a zero-filled array of the given length.
    pub fn new(len: usize) -> Self {
        Self {
            data: RwLock::new(vec![0.0; len]),
        }
    }

    /// Create an array from existing values.
    pub fn from_values(values: Vec<f32>) -> Self {
        Self {
            data: RwLock::new(values),
        }
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Grow or shrink the backing store; new elements are zero.
    pub fn resize(&self, new_len: usize) {
        self.data.write().resize(new_len, 0.0);
    }

    /// Snapshot of the current contents.
    pub fn values(&self) -> Vec<f32> {
        self.data.read().clone()
    }
}

impl Accessor for FloatArrayAccessor {
    fn shapes(&self) -> ShapeSet {
        ShapeSet::FLOAT_ARRAY
    }

    fn float_count(&self) -> usize {
        self.data.read().len()
    }

    fn read_floats(&self, offset: usize, dest: &mut [f32]) -> usize {
        bounded_read(&self.data.read(), offset, dest)
    }

    fn write_floats(&self, offset: usize, src: &[f32]) {
        bounded_write(&mut self.data.write(), offset, src);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
