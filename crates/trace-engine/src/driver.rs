//! The trace driver: orchestrates the three-pass algorithm (suppressed-
//! emission prepopulation, loop discovery, full replay-with-emission).
//!
//! Pass A's suppressed-emission prepopulation runs against its own scratch
//! state rather than feeding Pass C directly: Pass C always replays from
//! `main` over a fresh variable map and heap, so by the time its own
//! traversal reaches a loop header it has already re-derived whatever Pass A
//! previewed. Pass A exists as a mode flag on the same
//! [`crate::loops::run_block`] code path, not a separate implementation --
//! it is kept here as a distinct, named pass so the three-pass structure
//! stays visible in the code, even though its output is not threaded
//! forward.

use std::collections::HashMap;

use crate::{
    env::VariableMap,
    heap::Heap,
    ids::IdAllocator,
    loops::{self, EngineLimits, ExecCtx},
    state::State,
};

/// Runs the full three-pass algorithm over `source`, returning the ordered
/// list of emitted states. Never fails -- an unrecognized or empty `main`
/// body still yields the synthetic "Program start" state (section 4.4).
#[must_use]
pub fn trace(source: &str, limits: EngineLimits) -> Vec<State> {
    let lines = loops::reflow_source(source);
    let Some(body) = loops::find_main_body(&lines) else {
        return vec![State::synthetic_start()];
    };

    let first_loop_idx =
        (body.start..body.end).find(|&i| loops::is_for_header(&lines[i]) || loops::is_while_header(&lines[i]));
    let prologue_end = first_loop_idx.unwrap_or(body.end);

    run_pass_a(&lines, body.start..prologue_end, limits);

    let discovered = loops::discover_loops(&lines, body.clone());

    let states = run_pass_c(&lines, body, &discovered, limits);

    if states.is_empty() { vec![State::synthetic_start()] } else { states }
}

fn run_pass_a(lines: &[String], prologue: std::ops::Range<usize>, limits: EngineLimits) {
    let mut vars = VariableMap::new();
    let mut heap = Heap::new();
    let mut ids = IdAllocator::new();
    let mut states = Vec::new();
    let no_loops = HashMap::new();
    let mut ctx = ExecCtx {
        lines,
        loops: &no_loops,
        vars: &mut vars,
        heap: &mut heap,
        ids: &mut ids,
        emit: false,
        states: &mut states,
        limits,
    };
    loops::run_block(&mut ctx, prologue, &HashMap::new());
}

fn run_pass_c(
    lines: &[String],
    body: std::ops::Range<usize>,
    discovered: &HashMap<usize, loops::LoopInfo>,
    limits: EngineLimits,
) -> Vec<State> {
    let mut vars = VariableMap::new();
    let mut heap = Heap::new();
    let mut ids = IdAllocator::new();
    let mut states = Vec::new();
    let mut ctx = ExecCtx {
        lines,
        loops: discovered,
        vars: &mut vars,
        heap: &mut heap,
        ids: &mut ids,
        emit: true,
        states: &mut states,
        limits,
    };
    loops::run_block(&mut ctx, body, &HashMap::new());
    states
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values_of<'a>(states: &'a [State], name: &str) -> Vec<&'a crate::value::Value> {
        states
            .iter()
            .filter_map(|s| s.variables.iter().find(|v| v.name == name))
            .filter_map(|v| v.as_scalar())
            .collect()
    }

    #[test]
    fn s1_primitives_and_sum() {
        let states = trace("int main(){ int x=10; int y=20; int sum=x+y; return 0; }", EngineLimits::default());
        assert_eq!(states.len(), 3);
        let last = states.last().unwrap();
        assert_eq!(last.variables.len(), 3);
        assert_eq!(last.variables[2].name, "sum");
        assert_eq!(last.variables[2].as_scalar(), Some(&crate::value::Value::Int(30)));
        assert_eq!(states[0].action.as_deref(), Some("Created x = 10"));
    }

    #[test]
    fn s2_array_and_literal_bounded_loop() {
        let source = "int main(){ int arr[5]={1,2,3,4,5}; for(int i=0;i<5;i++){ arr[i]=arr[i]*2; } }";
        let states = trace(source, EngineLimits::default());
        assert_eq!(states.len(), 6);
        let last = states.last().unwrap();
        let arr = last.variables.iter().find(|v| v.name == "arr").unwrap().as_array().unwrap();
        assert_eq!(arr, &[
            crate::value::Value::Int(2),
            crate::value::Value::Int(4),
            crate::value::Value::Int(6),
            crate::value::Value::Int(8),
            crate::value::Value::Int(10),
        ]);
    }

    #[test]
    fn s3_variable_bounded_loop() {
        let source = "int main(){ int n=4; int arr[4]={0,0,0,0}; for(int i=0;i<n;i++){ arr[i]=i; } }";
        let states = trace(source, EngineLimits::default());
        let last = states.last().unwrap();
        let arr = last.variables.iter().find(|v| v.name == "arr").unwrap().as_array().unwrap();
        assert_eq!(arr, &[
            crate::value::Value::Int(0),
            crate::value::Value::Int(1),
            crate::value::Value::Int(2),
            crate::value::Value::Int(3),
        ]);
    }

    #[test]
    fn s4_linked_list_of_three_nodes() {
        let source = "struct Node{int data; Node* next;}; int main(){ Node* head=new Node(); head->data=10; Node* second=new Node(); second->data=20; head->next=second; Node* third=new Node(); third->data=30; second->next=third; third->next=nullptr; }";
        let states = trace(source, EngineLimits::default());
        let last = states.last().unwrap();
        assert_eq!(last.heap.len(), 3);
        let third = &last.heap[2];
        assert_eq!(third.field("next").unwrap().value, crate::value::Value::Null);
        let head = last.variables.iter().find(|v| v.name == "head").unwrap();
        assert!(matches!(head.points_to, Some(crate::ids::Ref::Heap(crate::ids::HeapId(1)))));
    }

    #[test]
    fn s5_conditional_inside_loop() {
        let source = "int main(){ int count=0; for(int i=0;i<6;i++){ if(i%2==0){ count=count+1; } } }";
        let states = trace(source, EngineLimits::default());
        let count_values = values_of(&states, "count");
        assert_eq!(count_values.last(), Some(&&crate::value::Value::Int(3)));
        // One decl + three qualifying iterations (i = 0, 2, 4).
        assert_eq!(states.len(), 4);
    }

    #[test]
    fn empty_program_emits_synthetic_start() {
        let states = trace("int main(){ }", EngineLimits::default());
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].action.as_deref(), Some("Program start"));
    }
}
