//! Structured-blob accessor: a fixed-size raw byte image of a plain value.

use std::any::TypeId;

use bytemuck::{Pod, Zeroable};
use parking_lot::RwLock;

use crate::accessor::{bounded_read, bounded_write, Accessor};
use crate::shape::ShapeSet;

/// Exposes an arbitrary plain value as its raw byte image.
///
/// `T` must be [`Pod`]: any bit pattern is a valid value and the byte
/// image is the value. The byte count is fixed at `size_of::<T>()`;
/// writes clamp to it and can never change the size. Writes are a single
/// bounded copy under a lock, so a concurrent reader never observes a
/// torn value.
///
/// The scalar-numeric shapes are served by the scalar accessors, never by
/// a blob; constructing a `StructAccessor` over a bare `i32`/`f32`/`f64`
/// is rejected in debug builds.
#[derive(Debug)]
pub struct StructAccessor<T: Pod + Send + Sync> {
    value: RwLock<T>,
}

impl<T: Pod + Send + Sync> StructAccessor<T> {
    pub fn new(value: T) -> Self {
        debug_assert!(
            TypeId::of::<T>() != TypeId::of::<i32>()
                && TypeId::of::<T>() != TypeId::of::<f32>()
                && TypeId::of::<T>() != TypeId::of::<f64>(),
            "scalar values take a scalar accessor, not a blob"
        );
        Self {
            value: RwLock::new(value),
        }
    }

    /// Copy of the current value.
    pub fn get(&self) -> T {
        *self.value.read()
    }

    /// Replace the whole value.
    pub fn set(&self, value: T) {
        *self.value.write() = value;
    }
}

impl<T: Pod + Send + Sync> Default for StructAccessor<T> {
    fn default() -> Self {
        Self::new(T::zeroed())
    }
}

impl<T: Pod + Send + Sync> Accessor for StructAccessor<T> {
    fn shapes(&self) -> ShapeSet {
        ShapeSet::DATA
    }

    fn byte_count(&self) -> usize {
        std::mem::size_of::<T>()
    }

    fn read_bytes(&self, offset: usize, dest: &mut [u8]) -> usize {
        bounded_read(bytemuck::bytes_of(&*self.value.read()), offset, dest)
    }

    fn write_bytes(&self, offset: usize, src: &[u8]) {
        bounded_write(bytemuck::bytes_of_mut(&mut *self.value.write()), offset, src);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
    #[repr(C)]
    struct Attitude {
        pitch: f32,
        roll: f32,
        heading: f32,
        flags: u32,
    }

    #[test]
    fn test_count_is_fixed_size() {
        let a = StructAccessor::new(Attitude::zeroed());
        assert_eq!(a.byte_count(), std::mem::size_of::<Attitude>());
    }

    #[test]
    fn test_byte_round_trip() {
        let initial = Attitude {
            pitch: 1.0,
            roll: -2.0,
            heading: 90.0,
            flags: 3,
        };
        let a = StructAccessor::new(initial);

        let mut image = vec![0u8; a.byte_count()];
        assert_eq!(a.read_bytes(0, &mut image), image.len());

        let b = StructAccessor::new(Attitude::zeroed());
        b.write_bytes(0, &image);
        assert_eq!(b.get(), initial);
    }

    #[test]
    fn test_partial_reads_and_writes_clamp() {
        let a = StructAccessor::new(Attitude {
            pitch: 1.0,
            roll: 2.0,
            heading: 3.0,
            flags: 0xdead_beef,
        });

        // Read the tail only.
        let mut tail = [0u8; 64];
        let n = a.read_bytes(12, &mut tail);
        assert_eq!(n, 4);
        assert_eq!(u32::from_ne_bytes(tail[..4].try_into().unwrap()), 0xdead_beef);

        // A write past the image is silently dropped.
        a.write_bytes(1000, &[0xff]);
        assert_eq!(a.get().flags, 0xdead_beef);

        // Oversized writes truncate; the size never changes.
        a.write_bytes(0, &vec![0u8; 1024]);
        assert_eq!(a.byte_count(), std::mem::size_of::<Attitude>());
        assert_eq!(a.get(), Attitude::zeroed());
    }

    #[test]
    fn test_out_of_range_offset_reads_nothing() {
        let a = StructAccessor::new(Attitude::zeroed());
        let mut buf = [0u8; 8];
        assert_eq!(a.read_bytes(a.byte_count(), &mut buf), 0);
    }
}
