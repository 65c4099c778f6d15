//! The host boundary.
//!
//! The embedding host is a black box behind a fixed operation set: it
//! stores one dispatch table plus opaque token per registration, resolves
//! names to opaque references, routes reads and writes through the stored
//! entries, and runs the shared-value protocol. [`Host`] is that exact
//! surface; [`InProcessHost`] is the complete single-process
//! implementation.
//!
//! Hosts invoke entry points synchronously and may re-enter from their
//! own execution context. Implementations must not hold internal locks
//! across a dispatch entry or a notification callback.

pub mod in_process;

pub use in_process::InProcessHost;

use std::sync::Arc;

use crate::dispatch::DispatchTable;
use crate::error::ShareError;
use crate::registry::Token;
use crate::shape::{Shape, ShapeSet};
use crate::shared::SubscriberId;

/// Host-assigned opaque reference to a named value. Meaningful only to
/// the host that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostRef(pub(crate) u32);

/// Change-notification callback installed by a shared-value subscriber.
///
/// Carries no payload: it is a trigger, the value itself is read through
/// the normal accessor lookup.
pub type NotifyFn = Arc<dyn Fn() + Send + Sync>;

/// The fixed-shape callback interface the host exposes.
///
/// Write operations take an `origin`: the subscriber on whose behalf the
/// write is made, excluded from the resulting change notification. Writes
/// with no origin notify every subscriber of the name.
pub trait Host: Send + Sync {
    /// Install a dispatch table under a name. The host keeps a copy of
    /// the token's bit pattern but no ownership: the token is only ever
    /// passed back into the table's entries.
    fn register(
        &self,
        name: &str,
        shapes: ShapeSet,
        writable: bool,
        table: DispatchTable,
        token: Token,
    ) -> HostRef;

    /// Remove a registration. After this returns, the host makes no
    /// further calls against the registration's token.
    fn unregister(&self, dataref: HostRef);

    /// Resolve a name to its reference. Absence is `None`, never an error.
    fn find(&self, name: &str) -> Option<HostRef>;

    /// The primitive shapes this reference supports.
    fn shapes(&self, dataref: HostRef) -> ShapeSet;

    /// Whether writes through this reference are accepted.
    fn is_writable(&self, dataref: HostRef) -> bool;

    /// Whether the reference is still backed by a live registration or
    /// shared value.
    fn is_good(&self, dataref: HostRef) -> bool;

    fn read_int(&self, dataref: HostRef) -> i32;
    fn write_int(&self, dataref: HostRef, value: i32, origin: Option<SubscriberId>);
    fn read_float(&self, dataref: HostRef) -> f32;
    fn write_float(&self, dataref: HostRef, value: f32, origin: Option<SubscriberId>);
    fn read_double(&self, dataref: HostRef) -> f64;
    fn write_double(&self, dataref: HostRef, value: f64, origin: Option<SubscriberId>);

    fn int_count(&self, dataref: HostRef) -> usize;
    fn read_ints(&self, dataref: HostRef, offset: usize, dest: &mut [i32]) -> usize;
    fn write_ints(&self, dataref: HostRef, offset: usize, src: &[i32], origin: Option<SubscriberId>);

    fn float_count(&self, dataref: HostRef) -> usize;
    fn read_floats(&self, dataref: HostRef, offset: usize, dest: &mut [f32]) -> usize;
    fn write_floats(
        &self,
        dataref: HostRef,
        offset: usize,
        src: &[f32],
        origin: Option<SubscriberId>,
    );

    fn byte_count(&self, dataref: HostRef) -> usize;
    fn read_bytes(&self, dataref: HostRef, offset: usize, dest: &mut [u8]) -> usize;
    fn write_bytes(&self, dataref: HostRef, offset: usize, src: &[u8], origin: Option<SubscriberId>);

    /// Register interest in a named shared value. The first subscriber
    /// creates the value at the host; later subscribers join it. Fails
    /// only when the name already exists under an incompatible shape.
    fn share(
        &self,
        name: &str,
        shape: Shape,
        subscriber: SubscriberId,
        notify: NotifyFn,
    ) -> Result<(), ShareError>;

    /// Exact mirror of a prior [`share`](Host::share): same name, shape
    /// and subscriber. When the last subscriber leaves a host-owned
    /// shared value, the host retires it. Unknown subscriptions are
    /// ignored.
    fn unshare(&self, name: &str, shape: Shape, subscriber: SubscriberId);
}
