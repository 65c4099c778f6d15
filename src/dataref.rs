//! Lookup-side access to named values.
//!
//! A [`DataRef`] wraps the host-assigned opaque reference for a name and
//! offers typed reads and writes over whatever shapes the reference
//! supports. It makes no claim about who owns the value: it may be backed
//! by a local registration, another party's registration, or a host-owned
//! shared value. Query [`shapes`](DataRef::shapes) and
//! [`is_writable`](DataRef::is_writable) before relying on an operation;
//! unsupported operations answer with the shape's neutral default.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use bytes::{Bytes, BytesMut};

use crate::host::{Host, HostRef};
use crate::shape::ShapeSet;
use crate::shared::SubscriberId;

/// A handle to a named value resolved at the host.
#[derive(Clone)]
pub struct DataRef {
    host: Arc<dyn Host>,
    dataref: HostRef,
    /// Subscriber on whose behalf writes are made; excluded from its own
    /// change notifications.
    origin: Option<SubscriberId>,
}

impl DataRef {
    pub(crate) fn new(host: Arc<dyn Host>, dataref: HostRef) -> Self {
        Self {
            host,
            dataref,
            origin: None,
        }
    }

    pub(crate) fn with_origin(mut self, origin: SubscriberId) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Resolve `name` at the host. Absence is `None`, never an error.
    pub fn find(host: Arc<dyn Host>, name: &str) -> Option<DataRef> {
        host.find(name).map(|dataref| DataRef::new(host, dataref))
    }

    /// The primitive shapes this reference supports.
    pub fn shapes(&self) -> ShapeSet {
        self.host.shapes(self.dataref)
    }

    /// Whether writes through this reference are accepted.
    pub fn is_writable(&self) -> bool {
        self.host.is_writable(self.dataref)
    }

    /// Whether the reference is still backed by a live registration or
    /// shared value.
    pub fn is_good(&self) -> bool {
        self.host.is_good(self.dataref)
    }

    // -----------------------------------------------------------------------
    // Scalar access
    // -----------------------------------------------------------------------

    pub fn as_int(&self) -> i32 {
        self.host.read_int(self.dataref)
    }

    pub fn set_int(&self, value: i32) {
        self.host.write_int(self.dataref, value, self.origin);
    }

    pub fn as_float(&self) -> f32 {
        self.host.read_float(self.dataref)
    }

    pub fn set_float(&self, value: f32) {
        self.host.write_float(self.dataref, value, self.origin);
    }

    pub fn as_double(&self) -> f64 {
        self.host.read_double(self.dataref)
    }

    pub fn set_double(&self, value: f64) {
        self.host.write_double(self.dataref, value, self.origin);
    }

    // -----------------------------------------------------------------------
    // Vector access — bounded copies, short counts are normal
    // -----------------------------------------------------------------------

    /// Current element count of the int-vector shape.
    pub fn int_count(&self) -> usize {
        self.host.int_count(self.dataref)
    }

    /// Copy up to `dest.len()` elements starting at `offset`; returns the
    /// number copied.
    pub fn read_ints(&self, offset: usize, dest: &mut [i32]) -> usize {
        self.host.read_ints(self.dataref, offset, dest)
    }

    pub fn write_ints(&self, offset: usize, src: &[i32]) {
        self.host.write_ints(self.dataref, offset, src, self.origin);
    }

    /// Current element count of the float-vector shape.
    pub fn float_count(&self) -> usize {
        self.host.float_count(self.dataref)
    }

    pub fn read_floats(&self, offset: usize, dest: &mut [f32]) -> usize {
        self.host.read_floats(self.dataref, offset, dest)
    }

    pub fn write_floats(&self, offset: usize, src: &[f32]) {
        self.host.write_floats(self.dataref, offset, src, self.origin);
    }

    /// Current byte count of the blob shape.
    pub fn byte_count(&self) -> usize {
        self.host.byte_count(self.dataref)
    }

    pub fn read_bytes(&self, offset: usize, dest: &mut [u8]) -> usize {
        self.host.read_bytes(self.dataref, offset, dest)
    }

    pub fn write_bytes(&self, offset: usize, src: &[u8]) {
        self.host.write_bytes(self.dataref, offset, src, self.origin);
    }

    // -----------------------------------------------------------------------
    // Blob conveniences
    // -----------------------------------------------------------------------

    /// Owned snapshot of the full blob payload.
    pub fn bytes(&self) -> Bytes {
        let count = self.byte_count();
        let mut buf = BytesMut::zeroed(count);
        let n = self.read_bytes(0, &mut buf);
        buf.truncate(n);
        buf.freeze()
    }

    /// Typed view over the blob shape: read the byte image as a `T`.
    ///
    /// `None` when the blob's current byte count does not match
    /// `size_of::<T>()` exactly.
    pub fn as_struct<T: Pod>(&self) -> Option<T> {
        if self.byte_count() != std::mem::size_of::<T>() {
            return None;
        }
        let mut value = T::zeroed();
        let n = self.read_bytes(0, bytemuck::bytes_of_mut(&mut value));
        (n == std::mem::size_of::<T>()).then_some(value)
    }

    /// Write a `T`'s byte image into the blob shape. Clamped like any
    /// other bounded write.
    pub fn set_struct<T: Pod>(&self, value: &T) {
        self.write_bytes(0, bytemuck::bytes_of(value));
    }
}

impl std::fmt::Debug for DataRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataRef")
            .field("dataref", &self.dataref)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::{FloatArrayAccessor, IntAccessor, StructAccessor};
    use crate::host::InProcessHost;
    use crate::registration::Registration;
    use crate::shape::ShapeSet;

    fn host() -> Arc<InProcessHost> {
        Arc::new(InProcessHost::new())
    }

    #[test]
    fn test_find_absent_name_is_none() {
        let host = host();
        assert!(DataRef::find(host, "demo/never-registered").is_none());
    }

    #[test]
    fn test_scalar_round_trip_through_lookup() {
        let host = host();
        let _reg = Registration::with_default_shapes(
            host.clone(),
            "demo/int",
            true,
            Arc::new(IntAccessor::new(42)),
        )
        .unwrap();

        let dataref = DataRef::find(host, "demo/int").unwrap();
        assert_eq!(dataref.as_int(), 42);
        assert_eq!(dataref.as_double(), 42.0);
        dataref.set_int(7);
        assert_eq!(dataref.as_int(), 7);
    }

    #[test]
    fn test_capability_queries() {
        let host = host();
        let reg = Registration::with_default_shapes(
            host.clone(),
            "demo/floats",
            false,
            Arc::new(FloatArrayAccessor::new(4)),
        )
        .unwrap();

        let dataref = reg.data_ref();
        assert_eq!(dataref.shapes(), ShapeSet::FLOAT_ARRAY);
        assert!(!dataref.is_writable());
        assert!(dataref.is_good());
    }

    #[test]
    fn test_float_array_offset_read() {
        let host = host();
        let _reg = Registration::with_default_shapes(
            host.clone(),
            "demo/float-array",
            true,
            Arc::new(FloatArrayAccessor::from_values(vec![1.0, 2.0, 3.0, 4.0])),
        )
        .unwrap();

        let dataref = DataRef::find(host, "demo/float-array").unwrap();
        assert_eq!(dataref.float_count(), 4);

        let mut buf = [0.0f32; 4];
        let n = dataref.read_floats(2, &mut buf);
        assert_eq!(n, 2);
        assert_eq!(&buf[..2], &[3.0, 4.0]);
    }

    #[test]
    fn test_struct_view_round_trip() {
        #[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
        #[repr(C)]
        struct Gear {
            deployed: u32,
            ratio: f32,
        }

        let host = host();
        let _reg = Registration::with_default_shapes(
            host.clone(),
            "demo/gear",
            true,
            Arc::new(StructAccessor::new(Gear {
                deployed: 1,
                ratio: 0.5,
            })),
        )
        .unwrap();

        let dataref = DataRef::find(host, "demo/gear").unwrap();
        assert_eq!(dataref.byte_count(), std::mem::size_of::<Gear>());
        assert_eq!(
            dataref.as_struct::<Gear>(),
            Some(Gear {
                deployed: 1,
                ratio: 0.5
            })
        );

        dataref.set_struct(&Gear {
            deployed: 0,
            ratio: 1.0,
        });
        assert_eq!(
            dataref.as_struct::<Gear>(),
            Some(Gear {
                deployed: 0,
                ratio: 1.0
            })
        );

        let snapshot = dataref.bytes();
        assert_eq!(snapshot.len(), std::mem::size_of::<Gear>());

        // Size mismatch reads as absent, not as garbage.
        assert!(dataref.as_struct::<u16>().is_none());
    }

    #[test]
    fn test_disposed_registration_goes_stale() {
        let host = host();
        let mut reg = Registration::with_default_shapes(
            host.clone(),
            "demo/stale",
            true,
            Arc::new(IntAccessor::new(5)),
        )
        .unwrap();
        let dataref = reg.data_ref();
        assert!(dataref.is_good());

        reg.dispose();
        assert!(!dataref.is_good());
        assert_eq!(dataref.as_int(), 0);
        assert!(DataRef::find(host, "demo/stale").is_none());
    }
}
