//! Shared named values with change notification.
//!
//! Unrelated parties coordinate through a name: the first
//! [`Shared::try_share`] creates the value at the host, later subscribers
//! join it, and every write by one party raises the notification callback
//! of every other subscriber. Sharing grants existence and notification
//! only — reading and writing go through the standard accessor lookup
//! ([`find_data_ref`](Shared::find_data_ref)).
//!
//! Notification callbacks run synchronously on whatever call delivered
//! the write. A callback must not re-share or release the shared value it
//! was invoked for; that reentrancy is the caller's responsibility to
//! avoid.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::dataref::DataRef;
use crate::error::ShareError;
use crate::host::Host;
use crate::shape::Shape;

static SUBSCRIBER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one shared-value subscription.
///
/// Passed back to the host on teardown so unshare mirrors the share call
/// exactly, and used to exclude a writer from its own notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    fn next() -> Self {
        Self(SUBSCRIBER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Fresh identity for tests that speak the host protocol directly.
    #[cfg(test)]
    pub(crate) fn test_id() -> Self {
        Self::next()
    }
}

/// A live subscription to a named shared value.
///
/// The handle is the sole owner of its host-side subscription: released
/// exactly once by [`release`](Shared::release) or the `Drop` backstop,
/// idempotently. When the last subscriber of a host-owned shared value
/// releases, the host retires the value.
pub struct Shared {
    host: Arc<dyn Host>,
    name: String,
    shape: Shape,
    id: SubscriberId,
    released: bool,
}

impl Shared {
    /// Subscribe to the shared value `name` of the given shape.
    ///
    /// `on_notify` fires whenever any *other* party writes the value; it
    /// carries no payload. Fails only with
    /// [`NameShapeConflict`](ShareError::NameShapeConflict) when the name
    /// already exists under an incompatible shape.
    pub fn try_share(
        host: Arc<dyn Host>,
        name: &str,
        shape: Shape,
        on_notify: impl Fn() + Send + Sync + 'static,
    ) -> Result<Shared, ShareError> {
        let id = SubscriberId::next();
        host.share(name, shape, id, Arc::new(on_notify))?;
        log::debug!("[Shared] subscribed {name:?} shape={shape} id={id:?}");
        Ok(Shared {
            host,
            name: name.to_string(),
            shape,
            id,
            released: false,
        })
    }

    /// The shared value's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shape declared at share time.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Resolve the shared value for direct read/write access.
    ///
    /// The returned [`DataRef`] carries this subscription's identity:
    /// writes through it do not raise this handle's own notification.
    pub fn find_data_ref(&self) -> Option<DataRef> {
        DataRef::find(self.host.clone(), &self.name).map(|d| d.with_origin(self.id))
    }

    /// Un-subscribe. Idempotent: a second call is a no-op, never an
    /// error, and no notification fires from a release.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.host.unshare(&self.name, self.shape, self.id);
        log::debug!("[Shared] released {:?} id={:?}", self.name, self.id);
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Shared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shared")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("id", &self.id)
            .field("released", &self.released)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::InProcessHost;
    use std::sync::atomic::AtomicUsize;

    fn host() -> Arc<InProcessHost> {
        Arc::new(InProcessHost::new())
    }

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let probe = count.clone();
        (count, move || {
            probe.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_write_notifies_every_other_subscriber_once() {
        let host = host();
        let (a_fired, a_notify) = counter();
        let (b_fired, b_notify) = counter();

        let a = Shared::try_share(host.clone(), "demo/shared", Shape::Int, a_notify).unwrap();
        let _b = Shared::try_share(host.clone(), "demo/shared", Shape::Int, b_notify).unwrap();

        let dataref = a.find_data_ref().unwrap();
        dataref.set_int(5);

        assert_eq!(b_fired.load(Ordering::SeqCst), 1);
        assert_eq!(a_fired.load(Ordering::SeqCst), 0);

        // The notification is a trigger only; the value travels through
        // the accessor path.
        assert_eq!(dataref.as_int(), 5);
    }

    #[test]
    fn test_shape_conflict_on_second_share() {
        let host = host();
        let (_, notify) = counter();
        let _first =
            Shared::try_share(host.clone(), "demo/conflicted", Shape::Int, notify).unwrap();

        let (_, notify) = counter();
        let err = Shared::try_share(host.clone(), "demo/conflicted", Shape::FloatArray, notify)
            .unwrap_err();
        assert!(matches!(err, ShareError::NameShapeConflict { .. }));
    }

    #[test]
    fn test_release_is_idempotent_and_silent() {
        let host = host();
        let (fired, notify) = counter();
        let mut shared = Shared::try_share(host.clone(), "demo/quiet", Shape::Int, notify).unwrap();

        shared.release();
        shared.release();
        drop(shared);

        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_last_release_retires_value() {
        let host = host();
        let (_, notify_a) = counter();
        let (_, notify_b) = counter();

        let mut a = Shared::try_share(host.clone(), "demo/refcount", Shape::Double, notify_a)
            .unwrap();
        let mut b = Shared::try_share(host.clone(), "demo/refcount", Shape::Double, notify_b)
            .unwrap();

        a.release();
        // One subscriber left: the value still exists.
        assert!(DataRef::find(host.clone(), "demo/refcount").is_some());

        b.release();
        assert!(DataRef::find(host.clone(), "demo/refcount").is_none());
    }

    #[test]
    fn test_rejoin_after_retirement_starts_fresh() {
        let host = host();
        let (_, notify) = counter();
        let mut first =
            Shared::try_share(host.clone(), "demo/rejoin", Shape::Int, notify).unwrap();
        first.find_data_ref().unwrap().set_int(9);
        first.release();

        let (_, notify) = counter();
        let second = Shared::try_share(host.clone(), "demo/rejoin", Shape::Int, notify).unwrap();
        // Retirement destroyed the old value; the rejoin created a new one.
        assert_eq!(second.find_data_ref().unwrap().as_int(), 0);
    }

    #[test]
    fn test_drop_backstop_releases() {
        let host = host();
        {
            let (_, notify) = counter();
            let _shared =
                Shared::try_share(host.clone(), "demo/dropped-share", Shape::Int, notify).unwrap();
        }
        assert!(DataRef::find(host, "demo/dropped-share").is_none());
    }

    #[test]
    fn test_plain_find_write_notifies_all_subscribers() {
        let host = host();
        let (a_fired, a_notify) = counter();
        let (b_fired, b_notify) = counter();
        let _a = Shared::try_share(host.clone(), "demo/anon-write", Shape::Int, a_notify).unwrap();
        let _b = Shared::try_share(host.clone(), "demo/anon-write", Shape::Int, b_notify).unwrap();

        // A writer with no subscription identity notifies everyone.
        let dataref = DataRef::find(host.clone(), "demo/anon-write").unwrap();
        dataref.set_int(1);

        assert_eq!(a_fired.load(Ordering::SeqCst), 1);
        assert_eq!(b_fired.load(Ordering::SeqCst), 1);
    }
}
