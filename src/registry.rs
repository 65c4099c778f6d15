//! Process-global token registry.
//!
//! The opaque token the host holds for each registration is an index into
//! this slot arena plus a generation counter. Resolution is a bounds- and
//! generation-checked lookup: a token whose slot has since been released
//! (and its generation bumped) resolves to nothing, so a stale host
//! callback degrades to the shape's neutral default instead of touching
//! freed state.
//!
//! The owning [`Registration`](crate::registration::Registration) is the
//! sole lifetime authority for a token: allocated on register, released
//! exactly once on dispose, never valid afterwards. Slot indices are
//! recycled only together with a fresh generation.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::accessor::Accessor;

/// Opaque token correlating a host-held reference to one accessor
/// instance. The bit pattern is meaningless outside this registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(u64);

impl Token {
    fn new(index: u32, generation: u32) -> Self {
        Token(((generation as u64) << 32) | index as u64)
    }

    fn index(self) -> u32 {
        self.0 as u32
    }

    fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// The raw bit pattern, as handed across the host boundary.
    pub fn bits(self) -> u64 {
        self.0
    }
}

struct TokenSlot {
    generation: u32,
    accessor: Option<Arc<dyn Accessor>>,
}

struct TokenTable {
    slots: Vec<TokenSlot>,
    free: Vec<u32>,
}

impl TokenTable {
    const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

static TOKENS: RwLock<TokenTable> = RwLock::new(TokenTable::new());

/// Bind an accessor instance to a fresh token.
pub(crate) fn allocate(accessor: Arc<dyn Accessor>) -> Token {
    let mut table = TOKENS.write();
    if let Some(index) = table.free.pop() {
        let slot = &mut table.slots[index as usize];
        slot.accessor = Some(accessor);
        Token::new(index, slot.generation)
    } else {
        let index = table.slots.len() as u32;
        table.slots.push(TokenSlot {
            generation: 0,
            accessor: Some(accessor),
        });
        Token::new(index, 0)
    }
}

/// Resolve a token back to its accessor instance.
///
/// Returns `None` for released or never-issued tokens; the caller answers
/// with the neutral default.
pub(crate) fn resolve(token: Token) -> Option<Arc<dyn Accessor>> {
    let table = TOKENS.read();
    let slot = table.slots.get(token.index() as usize)?;
    if slot.generation != token.generation() {
        return None;
    }
    slot.accessor.clone()
}

/// Release a token. The slot's generation is bumped so the released token
/// can never resolve again, even after the index is recycled.
///
/// Returns whether the token was live.
pub(crate) fn release(token: Token) -> bool {
    let mut table = TOKENS.write();
    let index = token.index();
    let Some(slot) = table.slots.get_mut(index as usize) else {
        return false;
    };
    if slot.generation != token.generation() || slot.accessor.is_none() {
        return false;
    }
    slot.accessor = None;
    slot.generation = slot.generation.wrapping_add(1);
    table.free.push(index);
    true
}

/// Number of tokens currently issued and not yet released.
pub fn live_token_count() -> usize {
    let table = TOKENS.read();
    table.slots.iter().filter(|s| s.accessor.is_some()).count()
}

/// Debug-build leak guard: asserts every issued token has been released.
///
/// Call at orderly shutdown, after all registrations should have been
/// disposed. Release is deterministic ownership, not garbage collection;
/// this only catches owners that never ran.
pub fn debug_assert_all_released() {
    if cfg!(debug_assertions) {
        let live = live_token_count();
        debug_assert!(live == 0, "{live} accessor token(s) never released");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
