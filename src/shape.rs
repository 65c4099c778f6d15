//! Value shapes and capability masks.
//!
//! Every exchangeable value has one or more *shapes*: the three scalar
//! shapes (int, float, double), the two growable vector shapes, and the
//! opaque byte blob. A [`ShapeSet`] is the explicit capability mask a
//! registration declares up front; dispatch entry points are installed
//! only for bits present in the mask.

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Capability mask over the six primitive shapes.
    ///
    /// The bit values are part of the host protocol and must not change.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShapeSet: u32 {
        /// 32-bit signed integer scalar.
        const INT = 1;
        /// 32-bit float scalar.
        const FLOAT = 2;
        /// 64-bit float scalar.
        const DOUBLE = 4;
        /// Growable sequence of 32-bit floats.
        const FLOAT_ARRAY = 8;
        /// Growable sequence of 32-bit signed integers.
        const INT_ARRAY = 16;
        /// Fixed-size raw byte image of a plain value.
        const DATA = 32;
    }
}

impl ShapeSet {
    /// All three scalar bits.
    pub const SCALARS: ShapeSet = ShapeSet::INT.union(ShapeSet::FLOAT).union(ShapeSet::DOUBLE);

    /// Whether the mask contains any scalar-numeric bit.
    pub fn has_scalar(self) -> bool {
        self.intersects(Self::SCALARS)
    }
}

impl Serialize for ShapeSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ShapeSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(ShapeSet::from_bits_retain(u32::deserialize(deserializer)?))
    }
}

/// A single value shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// 32-bit signed integer scalar.
    Int,
    /// 32-bit float scalar.
    Float,
    /// 64-bit float scalar.
    Double,
    /// Growable sequence of 32-bit floats.
    FloatArray,
    /// Growable sequence of 32-bit signed integers.
    IntArray,
    /// Fixed-size raw byte image of a plain value.
    Data,
}

impl Shape {
    /// The mask containing exactly this shape.
    pub fn as_set(self) -> ShapeSet {
        match self {
            Shape::Int => ShapeSet::INT,
            Shape::Float => ShapeSet::FLOAT,
            Shape::Double => ShapeSet::DOUBLE,
            Shape::FloatArray => ShapeSet::FLOAT_ARRAY,
            Shape::IntArray => ShapeSet::INT_ARRAY,
            Shape::Data => ShapeSet::DATA,
        }
    }

    /// Whether this is one of the scalar-numeric shapes.
    pub fn is_scalar(self) -> bool {
        matches!(self, Shape::Int | Shape::Float | Shape::Double)
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Shape::Int => "int",
            Shape::Float => "float",
            Shape::Double => "double",
            Shape::FloatArray => "float_array",
            Shape::IntArray => "int_array",
            Shape::Data => "data",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
