//! # databridge
//!
//! Exposes a process's dynamically-typed internal state to an embedding
//! host through a fixed-shape dispatch interface, and lets unrelated
//! parties publish/subscribe to named shared values with change
//! notification.
//!
//! The core is the accessor registration and dispatch engine: a
//! heterogeneous set of readable/writable value shapes (scalar
//! int/float/double, growable int/float vectors, opaque byte blobs)
//! behind one capability contract ([`Accessor`]), bound to a stable
//! opaque token so the host can invoke typed operations without knowing
//! the concrete type ([`Registration`]), with the token lifetime managed
//! safely across register/unregister cycles — including cleanup on
//! abnormal teardown.
//!
//! ```
//! use std::sync::Arc;
//! use databridge::{DataRef, InProcessHost, IntAccessor, Registration};
//!
//! let host = Arc::new(InProcessHost::new());
//! let accessor = Arc::new(IntAccessor::new(42));
//! let registration = Registration::with_default_shapes(
//!     host.clone(),
//!     "demo/int",
//!     true,
//!     accessor.clone(),
//! ).unwrap();
//!
//! let dataref = DataRef::find(host, "demo/int").unwrap();
//! assert_eq!(dataref.as_int(), 42);
//! dataref.set_int(7);
//! assert_eq!(accessor.get(), 7);
//! drop(registration);
//! ```

pub mod accessor;
pub mod dataref;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod registration;
pub mod registry;
pub mod shape;
pub mod shared;

pub use accessor::{
    Accessor, DoubleAccessor, FloatAccessor, FloatArrayAccessor, IntAccessor, IntArrayAccessor,
    StructAccessor,
};
pub use dataref::DataRef;
pub use dispatch::DispatchTable;
pub use error::{RegisterError, ShareError};
pub use host::{Host, HostRef, InProcessHost, NotifyFn};
pub use registration::Registration;
pub use registry::{debug_assert_all_released, live_token_count, Token};
pub use shape::{Shape, ShapeSet};
pub use shared::{Shared, SubscriberId};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
