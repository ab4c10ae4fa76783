//! A single trace session.
//!
//! The engine itself is stateless between requests; a `Session` is the
//! owning unit the façade (CLI/server) keeps alive across `step-forward`/
//! `step-backward`/`get-state` calls.

use std::time::SystemTime;

use crate::state::State;

/// One `start_session` call's worth of precomputed trace plus a cursor.
#[derive(Debug, Clone)]
pub struct Session {
    pub source: String,
    pub states: Vec<State>,
    pub current_step: usize,
    pub created_at: SystemTime,
}

impl Session {
    /// `states` must be non-empty; [`crate::driver::trace`] guarantees
    /// this by always falling back to a synthetic start state.
    #[must_use]
    pub fn new(source: String, states: Vec<State>) -> Self {
        debug_assert!(!states.is_empty(), "a trace must emit at least the synthetic start state");
        Self { source, states, current_step: 0, created_at: SystemTime::now() }
    }

    #[must_use]
    pub fn total_steps(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn current(&self) -> &State {
        &self.states[self.current_step]
    }

    #[must_use]
    pub fn get(&self, step: usize) -> Option<&State> {
        self.states.get(step)
    }

    /// Advances `current_step`, clamped to `[0, total_steps - 1]`. Returns
    /// whether the cursor actually moved.
    pub fn step_forward(&mut self) -> bool {
        let last = self.total_steps() - 1;
        if self.current_step < last {
            self.current_step += 1;
            true
        } else {
            false
        }
    }

    /// Retreats `current_step`, clamped to `0`. Returns whether the cursor
    /// actually moved.
    pub fn step_backward(&mut self) -> bool {
        if self.current_step > 0 {
            self.current_step -= 1;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn at_start(&self) -> bool {
        self.current_step == 0
    }

    #[must_use]
    pub fn at_end(&self) -> bool {
        self.current_step + 1 == self.total_steps()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(n: usize) -> Session {
        let states = (0..n)
            .map(|i| State::capture(i, i as u32 + 1, String::new(), None, &crate::env::VariableMap::new(), &crate::heap::Heap::new()))
            .collect();
        Session::new("int main(){}".to_owned(), states)
    }

    #[test]
    fn step_forward_clamps_at_end() {
        let mut session = fixture(3);
        assert!(session.step_forward());
        assert!(session.step_forward());
        assert!(session.at_end());
        assert!(!session.step_forward());
        assert_eq!(session.current_step, 2);
    }

    #[test]
    fn step_backward_clamps_at_start() {
        let mut session = fixture(3);
        assert!(session.at_start());
        assert!(!session.step_backward());
        assert_eq!(session.current_step, 0);
    }

    #[test]
    fn single_state_session_is_both_start_and_end() {
        let session = fixture(1);
        assert!(session.at_start());
        assert!(session.at_end());
    }
}
