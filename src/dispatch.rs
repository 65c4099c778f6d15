//! Fixed-shape dispatch entry points.
//!
//! The host never sees an accessor type: per registration it stores one
//! [`DispatchTable`] — a read/write function pair per scalar shape and a
//! count-or-read/write pair per vector shape — plus the opaque token it
//! passes back on every call. Each entry resolves the token through the
//! [token registry](crate::registry) and forwards to the matching
//! capability method.
//!
//! Entries are installed per capability bit: the read entry for every bit
//! set in the mask, the write entry only when the registration is
//! writable, everything else absent. The host must treat an absent entry
//! as "operation unsupported" and not invoke it.
//!
//! On the vector and blob entries the host signals a count query by
//! passing `None` in place of a destination buffer; this is distinct from
//! a zero-length real read, which copies nothing and returns 0. Entries
//! never block and perform no fallible allocation; a stale token resolves
//! to nothing and yields the shape's neutral default.

use crate::registry::{self, Token};
use crate::shape::ShapeSet;

pub type ReadIntFn = fn(Token) -> i32;
pub type WriteIntFn = fn(Token, i32);
pub type ReadFloatFn = fn(Token) -> f32;
pub type WriteFloatFn = fn(Token, f32);
pub type ReadDoubleFn = fn(Token) -> f64;
pub type WriteDoubleFn = fn(Token, f64);

/// Count-or-read entry: `None` destination answers the element count.
pub type ReadIntArrayFn = fn(Token, Option<&mut [i32]>, usize) -> usize;
pub type WriteIntArrayFn = fn(Token, &[i32], usize);
pub type ReadFloatArrayFn = fn(Token, Option<&mut [f32]>, usize) -> usize;
pub type WriteFloatArrayFn = fn(Token, &[f32], usize);
pub type ReadDataFn = fn(Token, Option<&mut [u8]>, usize) -> usize;
pub type WriteDataFn = fn(Token, &[u8], usize);

/// The fixed set of entry points the host calls for one registration.
///
/// `None` means the operation is unsupported for this registration.
#[derive(Clone, Copy, Default)]
pub struct DispatchTable {
    pub read_int: Option<ReadIntFn>,
    pub write_int: Option<WriteIntFn>,
    pub read_float: Option<ReadFloatFn>,
    pub write_float: Option<WriteFloatFn>,
    pub read_double: Option<ReadDoubleFn>,
    pub write_double: Option<WriteDoubleFn>,
    pub read_ints: Option<ReadIntArrayFn>,
    pub write_ints: Option<WriteIntArrayFn>,
    pub read_floats: Option<ReadFloatArrayFn>,
    pub write_floats: Option<WriteFloatArrayFn>,
    pub read_bytes: Option<ReadDataFn>,
    pub write_bytes: Option<WriteDataFn>,
}

impl DispatchTable {
    /// Build the table for a capability mask: read entries for every bit
    /// set, write entries only when `writable`.
    pub fn new(mask: ShapeSet, writable: bool) -> Self {
        let mut table = DispatchTable::default();
        if mask.contains(ShapeSet::INT) {
            table.read_int = Some(read_int);
            table.write_int = writable.then_some(write_int as WriteIntFn);
        }
        if mask.contains(ShapeSet::FLOAT) {
            table.read_float = Some(read_float);
            table.write_float = writable.then_some(write_float as WriteFloatFn);
        }
        if mask.contains(ShapeSet::DOUBLE) {
            table.read_double = Some(read_double);
            table.write_double = writable.then_some(write_double as WriteDoubleFn);
        }
        if mask.contains(ShapeSet::INT_ARRAY) {
            table.read_ints = Some(read_ints);
            table.write_ints = writable.then_some(write_ints as WriteIntArrayFn);
        }
        if mask.contains(ShapeSet::FLOAT_ARRAY) {
            table.read_floats = Some(read_floats);
            table.write_floats = writable.then_some(write_floats as WriteFloatArrayFn);
        }
        if mask.contains(ShapeSet::DATA) {
            table.read_bytes = Some(read_bytes);
            table.write_bytes = writable.then_some(write_bytes as WriteDataFn);
        }
        table
    }
}

impl std::fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entry = |o: bool| if o { "installed" } else { "-" };
        f.debug_struct("DispatchTable")
            .field("read_int", &entry(self.read_int.is_some()))
            .field("write_int", &entry(self.write_int.is_some()))
            .field("read_float", &entry(self.read_float.is_some()))
            .field("write_float", &entry(self.write_float.is_some()))
            .field("read_double", &entry(self.read_double.is_some()))
            .field("write_double", &entry(self.write_double.is_some()))
            .field("read_ints", &entry(self.read_ints.is_some()))
            .field("write_ints", &entry(self.write_ints.is_some()))
            .field("read_floats", &entry(self.read_floats.is_some()))
            .field("write_floats", &entry(self.write_floats.is_some()))
            .field("read_bytes", &entry(self.read_bytes.is_some()))
            .field("write_bytes", &entry(self.write_bytes.is_some()))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Entry points — uniform across shapes: resolve token, forward, default.
// ---------------------------------------------------------------------------

fn read_int(token: Token) -> i32 {
    registry::resolve(token).map_or(0, |a| a.read_int())
}

fn write_int(token: Token, value: i32) {
    if let Some(a) = registry::resolve(token) {
        a.write_int(value);
    }
}

fn read_float(token: Token) -> f32 {
    registry::resolve(token).map_or(0.0, |a| a.read_float())
}

fn write_float(token: Token, value: f32) {
    if let Some(a) = registry::resolve(token) {
        a.write_float(value);
    }
}

fn read_double(token: Token) -> f64 {
    registry::resolve(token).map_or(0.0, |a| a.read_double())
}

fn write_double(token: Token, value: f64) {
    if let Some(a) = registry::resolve(token) {
        a.write_double(value);
    }
}

fn read_ints(token: Token, dest: Option<&mut [i32]>, offset: usize) -> usize {
    let Some(a) = registry::resolve(token) else {
        return 0;
    };
    match dest {
        None => a.int_count(),
        Some(dest) => a.read_ints(offset, dest),
    }
}

fn write_ints(token: Token, src: &[i32], offset: usize) {
    if let Some(a) = registry::resolve(token) {
        a.write_ints(offset, src);
    }
}

fn read_floats(token: Token, dest: Option<&mut [f32]>, offset: usize) -> usize {
    let Some(a) = registry::resolve(token) else {
        return 0;
    };
    match dest {
        None => a.float_count(),
        Some(dest) => a.read_floats(offset, dest),
    }
}

fn write_floats(token: Token, src: &[f32], offset: usize) {
    if let Some(a) = registry::resolve(token) {
        a.write_floats(offset, src);
    }
}

fn read_bytes(token: Token, dest: Option<&mut [u8]>, offset: usize) -> usize {
    let Some(a) = registry::resolve(token) else {
        return 0;
    };
    match dest {
        None => a.byte_count(),
        Some(dest) => a.read_bytes(offset, dest),
    }
}

fn write_bytes(token: Token, src: &[u8], offset: usize) {
    if let Some(a) = registry::resolve(token) {
        a.write_bytes(offset, src);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
