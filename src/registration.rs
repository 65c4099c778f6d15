//! Accessor registration and lifetime.
//!
//! A [`Registration`] binds one accessor instance to the host: it
//! allocates the opaque token, builds the dispatch table for the declared
//! capability mask, installs both at the host, and owns the token's
//! validity window. Disposal is unconditional and idempotent — the host
//! unregister always completes before the token is released, so no
//! dispatch call can observe a freed token — and `Drop` performs the same
//! release as a backstop for owners that never call
//! [`dispose`](Registration::dispose) explicitly.

use std::sync::Arc;

use crate::accessor::Accessor;
use crate::dataref::DataRef;
use crate::dispatch::DispatchTable;
use crate::error::RegisterError;
use crate::host::{Host, HostRef};
use crate::registry::{self, Token};
use crate::shape::ShapeSet;

/// A live accessor registration; the sole lifetime authority for its
/// token.
///
/// Exactly one accessor instance per registration. Registering the same
/// instance again requires a new `Registration`.
pub struct Registration {
    host: Arc<dyn Host>,
    name: String,
    dataref: HostRef,
    /// `Some` while the token is valid; taken exactly once on disposal.
    token: Option<Token>,
}

impl Registration {
    /// Register `accessor` under `name` with an explicit capability mask.
    ///
    /// Preconditions: `name` is non-empty with no embedded NUL, `mask` is
    /// a non-empty subset of the accessor's declared shapes. Read entry
    /// points are installed for every bit in `mask`; write entry points
    /// only when `writable`.
    pub fn new(
        host: Arc<dyn Host>,
        name: &str,
        mask: ShapeSet,
        writable: bool,
        accessor: Arc<dyn Accessor>,
    ) -> Result<Self, RegisterError> {
        if name.is_empty() {
            return Err(RegisterError::EmptyName);
        }
        if name.contains('\0') {
            return Err(RegisterError::InvalidName {
                name: name.to_string(),
            });
        }
        if mask.is_empty() {
            return Err(RegisterError::EmptyCapabilities);
        }
        let supported = accessor.shapes();
        if !supported.contains(mask) {
            return Err(RegisterError::UnsupportedShapes {
                requested: mask,
                supported,
            });
        }

        let token = registry::allocate(accessor);
        let table = DispatchTable::new(mask, writable);
        let dataref = host.register(name, mask, writable, table, token);
        log::debug!("[Registration] installed {name:?} mask={mask:?} writable={writable}");

        Ok(Self {
            host,
            name: name.to_string(),
            dataref,
            token: Some(token),
        })
    }

    /// Register `accessor` under its full declared shape set.
    pub fn with_default_shapes(
        host: Arc<dyn Host>,
        name: &str,
        writable: bool,
        accessor: Arc<dyn Accessor>,
    ) -> Result<Self, RegisterError> {
        let mask = accessor.shapes();
        Self::new(host, name, mask, writable, accessor)
    }

    /// The registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The host-assigned reference, usable for lookups.
    pub fn data_ref(&self) -> DataRef {
        DataRef::new(self.host.clone(), self.dataref)
    }

    /// Unregister at the host and release the token.
    ///
    /// Idempotent: the host-side unregister and the token release happen
    /// at most once across any number of calls, including the `Drop`
    /// backstop. Unregistration completes before the token is released.
    pub fn dispose(&mut self) {
        if let Some(token) = self.token.take() {
            self.host.unregister(self.dataref);
            registry::release(token);
            log::debug!("[Registration] disposed {:?}", self.name);
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("dataref", &self.dataref)
            .field("disposed", &self.token.is_none())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
