//! Identifiers for variables and heap objects.
//!
//! The original engine this was distilled from represented `points_to` as a
//! bare string (`"&x"`, a heap id, or empty). That collapses three distinct
//! reference kinds into one type and invites bugs where a variable reference
//! is mistaken for a heap reference. `Ref` keeps them apart.

use serde::Serialize;

/// Identifies a heap object, unique for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct HeapId(pub u64);

/// Identifies a variable in the single simulated `main` frame.
///
/// Stable for the lifetime of the variable: reassigning a variable's value
/// does not change its `VarId`, only redeclaring it under the same name does
/// (the declaration statements always allocate a fresh id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VarId(pub u64);

/// What a pointer variable or pointer-typed heap field refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Ref {
    Heap(HeapId),
    Var(VarId),
}

impl Ref {
    /// Renders the reference the way the front end expects `pointsTo` to
    /// look: a heap id as a plain string, a variable reference as `&name`-free
    /// opaque id. Both are just string handles to the UI; only the engine's
    /// own lookups need the discriminant.
    #[must_use]
    pub fn as_id_string(&self) -> String {
        match self {
            Self::Heap(id) => id.0.to_string(),
            Self::Var(id) => id.0.to_string(),
        }
    }
}

/// Monotonic id allocator. Separate counters for variables and heap objects
/// so that clearing one namespace (e.g. on loop re-entry) never collides with
/// the other.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next_var: u64,
    next_heap: u64,
}

impl IdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_var: 1,
            next_heap: 1,
        }
    }

    pub fn alloc_var(&mut self) -> VarId {
        let id = VarId(self.next_var);
        self.next_var += 1;
        id
    }

    pub fn alloc_heap(&mut self) -> HeapId {
        let id = HeapId(self.next_heap);
        self.next_heap += 1;
        id
    }
}
