//! The variable map: source name to [`Variable`], insertion-order preserved.
//!
//! Backed by `indexmap::IndexMap` rather than `HashMap` wherever iteration
//! order is observable -- here, deterministic variable rendering order.

use indexmap::IndexMap;

use crate::variable::Variable;

/// Mapping from source name to `Variable`, unique within the single
/// simulated `main` frame.
#[derive(Debug, Clone, Default)]
pub struct VariableMap {
    vars: IndexMap<String, Variable>,
}

impl VariableMap {
    #[must_use]
    pub fn new() -> Self {
        Self { vars: IndexMap::new() }
    }

    pub fn insert(&mut self, var: Variable) {
        self.vars.insert(var.name.clone(), var);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.vars.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.vars.get_mut(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Deep-copies every variable in insertion order, for a state snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Variable> {
        self.vars.values().cloned().collect()
    }
}
