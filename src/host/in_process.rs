//! Complete in-process host.
//!
//! `InProcessHost` plays the host role for a single process: it owns the
//! name index, the dispatch table stored per registration, and the
//! backing storage plus subscriber lists of host-owned shared values.
//! Reads and writes against a registered reference route through the
//! stored entry points with the registration's token; an absent entry is
//! "operation unsupported" and answers the neutral default without being
//! invoked.
//!
//! Lock discipline: internal state is guarded by one `RwLock`, and every
//! dispatch entry and notification callback is invoked only after the
//! lock is released — a callback may re-enter the host freely.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::accessor::bounded_read;
use crate::dispatch::DispatchTable;
use crate::error::ShareError;
use crate::host::{Host, HostRef, NotifyFn};
use crate::registry::Token;
use crate::shape::{Shape, ShapeSet};
use crate::shared::SubscriberId;

/// Host-owned backing of a shared value, one variant per shape.
///
/// Vector and blob backings grow to cover a write's extent: the
/// publishers define a shared value's size, there is no accessor whose
/// fixed store could be grown.
enum SharedStorage {
    Int(i32),
    Float(f32),
    Double(f64),
    IntArray(Vec<i32>),
    FloatArray(Vec<f32>),
    Data(Vec<u8>),
}

impl SharedStorage {
    fn new(shape: Shape) -> Self {
        match shape {
            Shape::Int => SharedStorage::Int(0),
            Shape::Float => SharedStorage::Float(0.0),
            Shape::Double => SharedStorage::Double(0.0),
            Shape::IntArray => SharedStorage::IntArray(Vec::new()),
            Shape::FloatArray => SharedStorage::FloatArray(Vec::new()),
            Shape::Data => SharedStorage::Data(Vec::new()),
        }
    }
}

fn grow_write<T: Copy + Default>(backing: &mut Vec<T>, offset: usize, src: &[T]) {
    let need = offset + src.len();
    if backing.len() < need {
        backing.resize(need, T::default());
    }
    backing[offset..offset + src.len()].copy_from_slice(src);
}

struct SubscriberEntry {
    id: SubscriberId,
    notify: NotifyFn,
}

enum SlotKind {
    /// A dispatch table installed by a [`Registration`](crate::registration::Registration).
    Registered {
        shapes: ShapeSet,
        writable: bool,
        table: DispatchTable,
        token: Token,
    },
    /// A host-owned shared value.
    Shared { shape: Shape, storage: SharedStorage },
}

struct HostSlot {
    name: String,
    kind: SlotKind,
    subscribers: Vec<SubscriberEntry>,
    retired: bool,
}

#[derive(Default)]
struct HostState {
    /// Reference slots; indices are never reused, a retired slot stays
    /// retired so a stale reference can never alias a newer value.
    slots: Vec<HostSlot>,
    /// Live name index. Only maps to non-retired slots.
    by_name: HashMap<String, u32>,
}

impl HostState {
    fn slot(&self, dataref: HostRef) -> Option<&HostSlot> {
        self.slots.get(dataref.0 as usize).filter(|s| !s.retired)
    }
}

/// The single-process [`Host`] implementation.
#[derive(Default)]
pub struct InProcessHost {
    state: RwLock<HostState>,
}

impl InProcessHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot a live registration's dispatch route.
    fn table_of(&self, dataref: HostRef) -> Option<(DispatchTable, Token)> {
        let state = self.state.read();
        match &state.slot(dataref)?.kind {
            SlotKind::Registered { table, token, .. } => Some((*table, *token)),
            SlotKind::Shared { .. } => None,
        }
    }

    /// Read from a live shared value's storage.
    fn read_shared<T>(
        &self,
        dataref: HostRef,
        default: T,
        read: impl FnOnce(&SharedStorage) -> T,
    ) -> T {
        let state = self.state.read();
        match state.slot(dataref).map(|s| &s.kind) {
            Some(SlotKind::Shared { storage, .. }) => read(storage),
            _ => default,
        }
    }

    /// Mutate a live shared value's storage; `write` reports whether the
    /// shape matched and the write was applied.
    fn write_shared(
        &self,
        dataref: HostRef,
        write: impl FnOnce(&mut SharedStorage) -> bool,
    ) -> bool {
        let mut state = self.state.write();
        let Some(slot) = state.slots.get_mut(dataref.0 as usize) else {
            return false;
        };
        if slot.retired {
            return false;
        }
        match &mut slot.kind {
            SlotKind::Shared { storage, .. } => write(storage),
            SlotKind::Registered { .. } => false,
        }
    }

    /// Fire the change notification of every subscriber except `origin`,
    /// outside any internal lock.
    fn notify(&self, dataref: HostRef, origin: Option<SubscriberId>) {
        let pending: Vec<NotifyFn> = {
            let state = self.state.read();
            match state.slots.get(dataref.0 as usize) {
                Some(slot) => slot
                    .subscribers
                    .iter()
                    .filter(|e| Some(e.id) != origin)
                    .map(|e| e.notify.clone())
                    .collect(),
                None => Vec::new(),
            }
        };
        for notify in pending {
            notify();
        }
    }
}

impl Host for InProcessHost {
    fn register(
        &self,
        name: &str,
        shapes: ShapeSet,
        writable: bool,
        table: DispatchTable,
        token: Token,
    ) -> HostRef {
        let mut state = self.state.write();
        let index = state.slots.len() as u32;
        state.slots.push(HostSlot {
            name: name.to_string(),
            kind: SlotKind::Registered {
                shapes,
                writable,
                table,
                token,
            },
            subscribers: Vec::new(),
            retired: false,
        });
        if let Some(old) = state.by_name.insert(name.to_string(), index) {
            log::warn!("[InProcessHost] name {name:?} remapped from slot {old} to {index}");
        }
        HostRef(index)
    }

    fn unregister(&self, dataref: HostRef) {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let Some(slot) = state.slots.get_mut(dataref.0 as usize) else {
            log::warn!("[InProcessHost] unregister of unknown reference {dataref:?}");
            return;
        };
        if slot.retired {
            log::warn!("[InProcessHost] unregister of retired reference {dataref:?}");
            return;
        }
        slot.retired = true;
        let name = slot.name.clone();
        if state.by_name.get(&name) == Some(&dataref.0) {
            state.by_name.remove(&name);
        }
        log::debug!("[InProcessHost] unregistered {name:?}");
    }

    fn find(&self, name: &str) -> Option<HostRef> {
        let state = self.state.read();
        state.by_name.get(name).map(|&index| HostRef(index))
    }

    fn shapes(&self, dataref: HostRef) -> ShapeSet {
        let state = self.state.read();
        match state.slot(dataref).map(|s| &s.kind) {
            Some(SlotKind::Registered { shapes, .. }) => *shapes,
            Some(SlotKind::Shared { shape, .. }) => shape.as_set(),
            None => ShapeSet::empty(),
        }
    }

    fn is_writable(&self, dataref: HostRef) -> bool {
        let state = self.state.read();
        match state.slot(dataref).map(|s| &s.kind) {
            Some(SlotKind::Registered { writable, .. }) => *writable,
            // Shared values accept writes from every party.
            Some(SlotKind::Shared { .. }) => true,
            None => false,
        }
    }

    fn is_good(&self, dataref: HostRef) -> bool {
        self.state.read().slot(dataref).is_some()
    }

    // -----------------------------------------------------------------------
    // Scalar routing
    // -----------------------------------------------------------------------

    fn read_int(&self, dataref: HostRef) -> i32 {
        if let Some((table, token)) = self.table_of(dataref) {
            return table.read_int.map_or(0, |entry| entry(token));
        }
        self.read_shared(dataref, 0, |storage| match storage {
            SharedStorage::Int(value) => *value,
            _ => 0,
        })
    }

    fn write_int(&self, dataref: HostRef, value: i32, origin: Option<SubscriberId>) {
        let wrote = if let Some((table, token)) = self.table_of(dataref) {
            table.write_int.map(|entry| entry(token, value)).is_some()
        } else {
            self.write_shared(dataref, |storage| match storage {
                SharedStorage::Int(slot) => {
                    *slot = value;
                    true
                }
                _ => false,
            })
        };
        if wrote {
            self.notify(dataref, origin);
        }
    }

    fn read_float(&self, dataref: HostRef) -> f32 {
        if let Some((table, token)) = self.table_of(dataref) {
            return table.read_float.map_or(0.0, |entry| entry(token));
        }
        self.read_shared(dataref, 0.0, |storage| match storage {
            SharedStorage::Float(value) => *value,
            _ => 0.0,
        })
    }

    fn write_float(&self, dataref: HostRef, value: f32, origin: Option<SubscriberId>) {
        let wrote = if let Some((table, token)) = self.table_of(dataref) {
            table.write_float.map(|entry| entry(token, value)).is_some()
        } else {
            self.write_shared(dataref, |storage| match storage {
                SharedStorage::Float(slot) => {
                    *slot = value;
                    true
                }
                _ => false,
            })
        };
        if wrote {
            self.notify(dataref, origin);
        }
    }

    fn read_double(&self, dataref: HostRef) -> f64 {
        if let Some((table, token)) = self.table_of(dataref) {
            return table.read_double.map_or(0.0, |entry| entry(token));
        }
        self.read_shared(dataref, 0.0, |storage| match storage {
            SharedStorage::Double(value) => *value,
            _ => 0.0,
        })
    }

    fn write_double(&self, dataref: HostRef, value: f64, origin: Option<SubscriberId>) {
        let wrote = if let Some((table, token)) = self.table_of(dataref) {
            table.write_double.map(|entry| entry(token, value)).is_some()
        } else {
            self.write_shared(dataref, |storage| match storage {
                SharedStorage::Double(slot) => {
                    *slot = value;
                    true
                }
                _ => false,
            })
        };
        if wrote {
            self.notify(dataref, origin);
        }
    }

    // -----------------------------------------------------------------------
    // Vector routing — count queries use the sentinel entry form
    // -----------------------------------------------------------------------

    fn int_count(&self, dataref: HostRef) -> usize {
        if let Some((table, token)) = self.table_of(dataref) {
            return table.read_ints.map_or(0, |entry| entry(token, None, 0));
        }
        self.read_shared(dataref, 0, |storage| match storage {
            SharedStorage::IntArray(values) => values.len(),
            _ => 0,
        })
    }

    fn read_ints(&self, dataref: HostRef, offset: usize, dest: &mut [i32]) -> usize {
        if let Some((table, token)) = self.table_of(dataref) {
            return table.read_ints.map_or(0, |entry| entry(token, Some(dest), offset));
        }
        self.read_shared(dataref, 0, |storage| match storage {
            SharedStorage::IntArray(values) => bounded_read(values, offset, dest),
            _ => 0,
        })
    }

    fn write_ints(
        &self,
        dataref: HostRef,
        offset: usize,
        src: &[i32],
        origin: Option<SubscriberId>,
    ) {
        let wrote = if let Some((table, token)) = self.table_of(dataref) {
            table.write_ints.map(|entry| entry(token, src, offset)).is_some()
        } else {
            self.write_shared(dataref, |storage| match storage {
                SharedStorage::IntArray(values) => {
                    grow_write(values, offset, src);
                    true
                }
                _ => false,
            })
        };
        if wrote {
            self.notify(dataref, origin);
        }
    }

    fn float_count(&self, dataref: HostRef) -> usize {
        if let Some((table, token)) = self.table_of(dataref) {
            return table.read_floats.map_or(0, |entry| entry(token, None, 0));
        }
        self.read_shared(dataref, 0, |storage| match storage {
            SharedStorage::FloatArray(values) => values.len(),
            _ => 0,
        })
    }

    fn read_floats(&self, dataref: HostRef, offset: usize, dest: &mut [f32]) -> usize {
        if let Some((table, token)) = self.table_of(dataref) {
            return table
                .read_floats
                .map_or(0, |entry| entry(token, Some(dest), offset));
        }
        self.read_shared(dataref, 0, |storage| match storage {
            SharedStorage::FloatArray(values) => bounded_read(values, offset, dest),
            _ => 0,
        })
    }

    fn write_floats(
        &self,
        dataref: HostRef,
        offset: usize,
        src: &[f32],
        origin: Option<SubscriberId>,
    ) {
        let wrote = if let Some((table, token)) = self.table_of(dataref) {
            table
                .write_floats
                .map(|entry| entry(token, src, offset))
                .is_some()
        } else {
            self.write_shared(dataref, |storage| match storage {
                SharedStorage::FloatArray(values) => {
                    grow_write(values, offset, src);
                    true
                }
                _ => false,
            })
        };
        if wrote {
            self.notify(dataref, origin);
        }
    }

    fn byte_count(&self, dataref: HostRef) -> usize {
        if let Some((table, token)) = self.table_of(dataref) {
            return table.read_bytes.map_or(0, |entry| entry(token, None, 0));
        }
        self.read_shared(dataref, 0, |storage| match storage {
            SharedStorage::Data(bytes) => bytes.len(),
            _ => 0,
        })
    }

    fn read_bytes(&self, dataref: HostRef, offset: usize, dest: &mut [u8]) -> usize {
        if let Some((table, token)) = self.table_of(dataref) {
            return table
                .read_bytes
                .map_or(0, |entry| entry(token, Some(dest), offset));
        }
        self.read_shared(dataref, 0, |storage| match storage {
            SharedStorage::Data(bytes) => bounded_read(bytes, offset, dest),
            _ => 0,
        })
    }

    fn write_bytes(
        &self,
        dataref: HostRef,
        offset: usize,
        src: &[u8],
        origin: Option<SubscriberId>,
    ) {
        let wrote = if let Some((table, token)) = self.table_of(dataref) {
            table
                .write_bytes
                .map(|entry| entry(token, src, offset))
                .is_some()
        } else {
            self.write_shared(dataref, |storage| match storage {
                SharedStorage::Data(bytes) => {
                    grow_write(bytes, offset, src);
                    true
                }
                _ => false,
            })
        };
        if wrote {
            self.notify(dataref, origin);
        }
    }

    // -----------------------------------------------------------------------
    // Shared-value protocol
    // -----------------------------------------------------------------------

    fn share(
        &self,
        name: &str,
        shape: Shape,
        subscriber: SubscriberId,
        notify: NotifyFn,
    ) -> Result<(), ShareError> {
        let mut guard = self.state.write();
        let state = &mut *guard;

        if let Some(&index) = state.by_name.get(name) {
            let slot = &mut state.slots[index as usize];
            let existing = match &slot.kind {
                SlotKind::Registered { shapes, .. } => *shapes,
                SlotKind::Shared { shape, .. } => shape.as_set(),
            };
            if !existing.contains(shape.as_set()) {
                return Err(ShareError::NameShapeConflict {
                    name: name.to_string(),
                    existing,
                    requested: shape,
                });
            }
            slot.subscribers.push(SubscriberEntry {
                id: subscriber,
                notify,
            });
            log::debug!(
                "[InProcessHost] {subscriber:?} joined {name:?} ({} subscriber(s))",
                slot.subscribers.len()
            );
            return Ok(());
        }

        // First subscriber creates the value.
        let index = state.slots.len() as u32;
        state.slots.push(HostSlot {
            name: name.to_string(),
            kind: SlotKind::Shared {
                shape,
                storage: SharedStorage::new(shape),
            },
            subscribers: vec![SubscriberEntry {
                id: subscriber,
                notify,
            }],
            retired: false,
        });
        state.by_name.insert(name.to_string(), index);
        log::debug!("[InProcessHost] created shared value {name:?} shape={shape}");
        Ok(())
    }

    fn unshare(&self, name: &str, shape: Shape, subscriber: SubscriberId) {
        let mut guard = self.state.write();
        let state = &mut *guard;

        if let Some(&index) = state.by_name.get(name) {
            let slot = &mut state.slots[index as usize];
            let before = slot.subscribers.len();
            slot.subscribers.retain(|e| e.id != subscriber);
            if slot.subscribers.len() == before {
                log::warn!("[InProcessHost] unshare of unknown subscription {subscriber:?} on {name:?}");
                return;
            }
            if let SlotKind::Shared { shape: declared, .. } = &slot.kind {
                if *declared != shape {
                    log::warn!(
                        "[InProcessHost] unshare shape {shape} does not mirror declared {declared} on {name:?}"
                    );
                }
                // Last subscriber out retires the host-owned value.
                if slot.subscribers.is_empty() {
                    slot.retired = true;
                    state.by_name.remove(name);
                    log::debug!("[InProcessHost] retired shared value {name:?}");
                }
            }
            return;
        }

        // The named entry may have been unregistered out from under its
        // subscribers; drop the subscription wherever it lives.
        for slot in &mut state.slots {
            if let Some(position) = slot.subscribers.iter().position(|e| e.id == subscriber) {
                slot.subscribers.remove(position);
                return;
            }
        }
        log::warn!("[InProcessHost] unshare of unknown subscription {subscriber:?} on {name:?}");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::{IntAccessor, IntArrayAccessor};
    use crate::registration::Registration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn host() -> Arc<InProcessHost> {
        Arc::new(InProcessHost::new())
    }

    #[test]
    fn test_dispatch_scenario_int() {
        let host = host();
        let accessor = Arc::new(IntAccessor::new(0));
        let reg = Registration::with_default_shapes(
            host.clone(),
            "demo/int",
            true,
            accessor.clone(),
        )
        .unwrap();

        // Local write is visible through the dispatch read entry.
        accessor.set(42);
        let dataref = host.find("demo/int").unwrap();
        assert_eq!(host.read_int(dataref), 42);

        // Dispatch write lands in the live instance.
        host.write_int(dataref, 7, None);
        assert_eq!(host.read_int(dataref), 7);
        assert_eq!(accessor.get(), 7);

        drop(reg);
        assert!(host.find("demo/int").is_none());
    }

    #[test]
    fn test_absent_write_entry_is_unsupported() {
        let host = host();
        let accessor = Arc::new(IntAccessor::new(3));
        let _reg = Registration::with_default_shapes(
            host.clone(),
            "demo/read-only",
            false,
            accessor.clone(),
        )
        .unwrap();

        let dataref = host.find("demo/read-only").unwrap();
        assert!(!host.is_writable(dataref));
        host.write_int(dataref, 99, None);
        assert_eq!(accessor.get(), 3);
    }

    #[test]
    fn test_mask_gates_entries() {
        let host = host();
        // Int-backed accessor exported only through its float view.
        let _reg = Registration::new(
            host.clone(),
            "demo/float-only",
            ShapeSet::FLOAT,
            true,
            Arc::new(IntAccessor::new(21)),
        )
        .unwrap();

        let dataref = host.find("demo/float-only").unwrap();
        assert_eq!(host.shapes(dataref), ShapeSet::FLOAT);
        assert_eq!(host.read_float(dataref), 21.0);
        // The int entry was never installed.
        assert_eq!(host.read_int(dataref), 0);
    }

    #[test]
    fn test_count_query_and_zero_length_read() {
        let host = host();
        let _reg = Registration::with_default_shapes(
            host.clone(),
            "demo/ints",
            true,
            Arc::new(IntArrayAccessor::from_values(vec![4, 5, 6])),
        )
        .unwrap();

        let dataref = host.find("demo/ints").unwrap();
        assert_eq!(host.int_count(dataref), 3);
        // A zero-length real read is not a count query.
        assert_eq!(host.read_ints(dataref, 0, &mut []), 0);
    }

    #[test]
    fn test_stale_host_ref_reads_neutral() {
        let host = host();
        let mut reg = Registration::with_default_shapes(
            host.clone(),
            "demo/gone",
            true,
            Arc::new(IntAccessor::new(8)),
        )
        .unwrap();
        let dataref = host.find("demo/gone").unwrap();
        reg.dispose();

        assert!(!host.is_good(dataref));
        assert_eq!(host.shapes(dataref), ShapeSet::empty());
        assert_eq!(host.read_int(dataref), 0);
        host.write_int(dataref, 1, None);
        assert_eq!(host.read_int(dataref), 0);
    }

    #[test]
    fn test_shared_vector_storage_grows_on_write() {
        let host = host();
        let id = {
            // Create via the protocol directly; subscriber identity is
            // only needed for teardown symmetry here.
            let id = crate::shared::SubscriberId::test_id();
            host.share("demo/shared-ints", Shape::IntArray, id, Arc::new(|| {}))
                .unwrap();
            id
        };

        let dataref = host.find("demo/shared-ints").unwrap();
        assert_eq!(host.int_count(dataref), 0);

        host.write_ints(dataref, 2, &[7, 8], None);
        assert_eq!(host.int_count(dataref), 4);

        let mut buf = [0i32; 4];
        assert_eq!(host.read_ints(dataref, 0, &mut buf), 4);
        assert_eq!(buf, [0, 0, 7, 8]);

        host.unshare("demo/shared-ints", Shape::IntArray, id);
        assert!(host.find("demo/shared-ints").is_none());
    }

    #[test]
    fn test_share_joins_registered_name() {
        let host = host();
        let accessor = Arc::new(IntAccessor::new(0));
        let _reg = Registration::with_default_shapes(
            host.clone(),
            "demo/joined",
            true,
            accessor.clone(),
        )
        .unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        let probe = fired.clone();
        let id = crate::shared::SubscriberId::test_id();
        host.share(
            "demo/joined",
            Shape::Int,
            id,
            Arc::new(move || {
                probe.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

        // A host-routed write to the registered value notifies the joiner.
        let dataref = host.find("demo/joined").unwrap();
        host.write_int(dataref, 5, None);
        assert_eq!(accessor.get(), 5);
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // Conflicting shape against the registered mask is refused.
        let err = host
            .share(
                "demo/joined",
                Shape::Data,
                crate::shared::SubscriberId::test_id(),
                Arc::new(|| {}),
            )
            .unwrap_err();
        assert!(matches!(err, ShareError::NameShapeConflict { .. }));

        host.unshare("demo/joined", Shape::Int, id);
    }

    #[test]
    fn test_unshare_unknown_is_a_no_op() {
        let host = host();
        host.unshare(
            "demo/never-shared",
            Shape::Int,
            crate::shared::SubscriberId::test_id(),
        );
    }

    #[test]
    fn test_shared_scalar_answers_only_its_shape() {
        let host = host();
        let id = crate::shared::SubscriberId::test_id();
        host.share("demo/typed", Shape::Int, id, Arc::new(|| {})).unwrap();

        let dataref = host.find("demo/typed").unwrap();
        host.write_int(dataref, 12, None);
        assert_eq!(host.read_int(dataref), 12);
        assert_eq!(host.read_float(dataref), 0.0);
        assert_eq!(host.byte_count(dataref), 0);

        host.unshare("demo/typed", Shape::Int, id);
    }

    #[test]
    fn test_reregistered_name_maps_to_newest() {
        let host = host();
        let first_accessor = Arc::new(IntAccessor::new(1));
        let first = Registration::with_default_shapes(
            host.clone(),
            "demo/remapped",
            true,
            first_accessor,
        )
        .unwrap();

        let second_accessor = Arc::new(IntAccessor::new(2));
        let _second = Registration::with_default_shapes(
            host.clone(),
            "demo/remapped",
            true,
            second_accessor,
        )
        .unwrap();

        let dataref = host.find("demo/remapped").unwrap();
        assert_eq!(host.read_int(dataref), 2);

        // The older registration still tears down cleanly.
        drop(first);
        assert_eq!(host.read_int(host.find("demo/remapped").unwrap()), 2);
    }
}
