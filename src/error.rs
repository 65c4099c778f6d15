//! Error types for registration and sharing.

use thiserror::Error;

use crate::shape::{Shape, ShapeSet};

/// Errors raised when registering an accessor.
#[derive(Debug, Error)]
pub enum RegisterError {
    /// The accessor name is empty.
    #[error("accessor name must be non-empty")]
    EmptyName,

    /// The accessor name contains an embedded NUL byte.
    #[error("accessor name must not contain NUL bytes: {name:?}")]
    InvalidName { name: String },

    /// The declared capability mask has no bits set.
    #[error("capability mask must declare at least one shape")]
    EmptyCapabilities,

    /// The declared capability mask requests shapes the accessor does not
    /// support.
    #[error("capability mask {requested:?} exceeds accessor shapes {supported:?}")]
    UnsupportedShapes {
        requested: ShapeSet,
        supported: ShapeSet,
    },
}

/// Errors raised when subscribing to a shared value.
#[derive(Debug, Error)]
pub enum ShareError {
    /// The name already exists at the host under an incompatible shape.
    ///
    /// Recoverable: the caller may retry with a different name.
    #[error("shared value {name:?} already exists with shapes {existing:?}, requested {requested}")]
    NameShapeConflict {
        name: String,
        existing: ShapeSet,
        requested: Shape,
    },
}
