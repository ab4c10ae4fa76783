//! Crate-level behavioral tests for cross-cutting invariants of the trace
//! driver, exercised against the public driver API rather than any one
//! module's internals.

use trace_engine::{EngineLimits, driver};

const SUM_PROGRAM: &str = "int main(){ int x=10; int y=20; int sum=x+y; return 0; }";
const LOOP_PROGRAM: &str = "int main(){ int arr[5]={1,2,3,4,5}; for(int i=0;i<5;i++){ arr[i]=arr[i]*2; } }";

#[test]
fn p1_step_indices_are_sequential_and_total_matches_length() {
    let states = driver::trace(SUM_PROGRAM, EngineLimits::default());
    for (k, state) in states.iter().enumerate() {
        assert_eq!(state.step_index, k);
    }
    assert_eq!(states.len(), states.last().unwrap().step_index + 1);
}

#[test]
fn p3_a_second_trace_does_not_perturb_the_first() {
    let first = driver::trace(LOOP_PROGRAM, EngineLimits::default());
    let first_clone = first.clone();
    // Running another trace (even over the same source, touching fresh
    // scratch state internally) must not retroactively change anything
    // already captured in `first` -- each State is an independent deep copy.
    let _second = driver::trace(SUM_PROGRAM, EngineLimits::default());
    for (a, b) in first.iter().zip(first_clone.iter()) {
        assert_eq!(a.variables.len(), b.variables.len());
        assert_eq!(a.action, b.action);
    }
}

#[test]
fn p5_loop_iteration_counts_stay_within_bounds() {
    let source = "int main(){ int arr[60]; for(int i=0;i<1000;i++){ int noop=i; } }";
    let states = driver::trace(source, EngineLimits::default());
    // A 1000-iteration-looking loop is clamped to 50 iterations; the
    // array decl itself is malformed (`arr[60]` with no initializer) and is
    // expected to be ignored by the array-decl shape, leaving only the loop
    // body's `noop` assignments -- at most 50 of them.
    let noop_states = states.iter().filter(|s| s.action.as_deref().map(|a| a.contains("noop")).unwrap_or(false));
    assert!(noop_states.count() <= 50);
}

#[test]
fn s6_shaped_program_is_unrelated_to_driver_which_never_compiles() {
    // The driver itself never invokes a compiler -- `int x = ;` is not valid
    // C++ but the driver still produces *some* trace (possibly degenerate),
    // since native validation is session_manager's job, not the driver's.
    let states = driver::trace("int main(){ int x = ; }", EngineLimits::default());
    assert!(!states.is_empty());
}
