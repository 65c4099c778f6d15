//! Scalar accessors: one numeric value, visible through widened or
//! narrowed views.
//!
//! An int-backed accessor answers float/double reads with the converted
//! current value; writes through a narrower type truncate toward zero to
//! the native type. Scalar state lives in a single atomic, so a reader
//! can never observe a torn value.

use std::sync::atomic::{AtomicI32, AtomicU32, AtomicU64, Ordering};

use crate::accessor::Accessor;
use crate::shape::ShapeSet;

/// A 32-bit signed integer value, also readable as float and double.
#[derive(Debug, Default)]
pub struct IntAccessor {
    value: AtomicI32,
}

impl IntAccessor {
    pub fn new(value: i32) -> Self {
        Self {
            value: AtomicI32::new(value),
        }
    }

    pub fn get(&self) -> i32 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn set(&self, value: i32) {
        self.value.store(value, Ordering::Relaxed);
    }
}

impl Accessor for IntAccessor {
    fn shapes(&self) -> ShapeSet {
        ShapeSet::INT | ShapeSet::FLOAT | ShapeSet::DOUBLE
    }

    fn read_int(&self) -> i32 {
        self.get()
    }
    fn write_int(&self, value: i32) {
        self.set(value);
    }

    fn read_float(&self) -> f32 {
        self.get() as f32
    }
    // `as` truncates toward zero and saturates at the i32 bounds.
    fn write_float(&self, value: f32) {
        self.set(value as i32);
    }

    fn read_double(&self) -> f64 {
        self.get() as f64
    }
    fn write_double(&self, value: f64) {
        self.set(value as i32);
    }
}

/// A 32-bit float value, also readable as double.
#[derive(Debug, Default)]
pub struct FloatAccessor {
    bits: AtomicU32,
}

impl FloatAccessor {
    pub fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
        }
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub fn set(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl Accessor for FloatAccessor {
    fn shapes(&self) -> ShapeSet {
        ShapeSet::FLOAT | ShapeSet::DOUBLE
    }

    fn read_float(&self) -> f32 {
        self.get()
    }
    fn write_float(&self, value: f32) {
        self.set(value);
    }

    fn read_double(&self) -> f64 {
        self.get() as f64
    }
    fn write_double(&self, value: f64) {
        self.set(value as f32);
    }
}

/// A 64-bit float value, also readable as a narrowed float.
#[derive(Debug, Default)]
pub struct DoubleAccessor {
    bits: AtomicU64,
}

impl DoubleAccessor {
    pub fn new(value: f64) -> Self {
        Self {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl Accessor for DoubleAccessor {
    fn shapes(&self) -> ShapeSet {
        ShapeSet::FLOAT | ShapeSet::DOUBLE
    }

    fn read_float(&self) -> f32 {
        self.get() as f32
    }
    fn write_float(&self, value: f32) {
        self.set(value as f64);
    }

    fn read_double(&self) -> f64 {
        self.get()
    }
    fn write_double(&self, value: f64) {
        self.set(value);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
