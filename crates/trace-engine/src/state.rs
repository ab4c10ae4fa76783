//! Program state snapshots.
//!
//! A `State` is a deep-copied observation of the variable map and heap at
//! one point in the trace. Because [`Variable`] and [`HeapObject`] contain
//! no shared/reference-counted storage, an ordinary `.clone()` on the
//! snapshot is already a true deep copy -- no explicit deep-copy
//! machinery is needed beyond calling [`VariableMap::snapshot`] and
//! [`Heap::objects`].

use serde_json::json;

use crate::{
    env::VariableMap,
    heap::{Heap, HeapObject, heap_object_to_json},
    variable::Variable,
};

/// A single simulated call frame. The engine only ever models `main`
/// (no multi-function call graphs), so `stack_frames`
/// always has exactly one entry, but the shape keeps the wire schema
/// future-proof the way the JSON contract describes it.
#[derive(Debug, Clone)]
pub struct StackFrame {
    pub frame_id: u32,
    pub function_name: String,
    pub line: u32,
    pub variables: Vec<Variable>,
}

impl StackFrame {
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "id": self.frame_id,
            "functionName": self.function_name,
            "line": self.line,
            "variables": self.variables.iter().map(Variable::to_json).collect::<Vec<_>>(),
        })
    }
}

/// One step of a trace: `{ step_index, current_line, source_line_text,
/// action_description?, variables_snapshot, stack_frames, heap_snapshot }`.
#[derive(Debug, Clone)]
pub struct State {
    pub step_index: usize,
    pub current_line: u32,
    pub source_line_text: String,
    pub action: Option<String>,
    pub variables: Vec<Variable>,
    pub stack_frames: Vec<StackFrame>,
    pub heap: Vec<HeapObject>,
}

impl State {
    /// Captures a deep-copied snapshot of `vars`/`heap` at the given step.
    #[must_use]
    pub fn capture(
        step_index: usize,
        current_line: u32,
        source_line_text: String,
        action: Option<String>,
        vars: &VariableMap,
        heap: &Heap,
    ) -> Self {
        let snapshot = vars.snapshot();
        Self {
            step_index,
            current_line,
            source_line_text,
            action,
            stack_frames: vec![StackFrame {
                frame_id: 1,
                function_name: "main".to_owned(),
                line: current_line,
                variables: snapshot.clone(),
            }],
            variables: snapshot,
            heap: heap.objects().to_vec(),
        }
    }

    /// The synthetic state emitted when a trace produces zero snapshots
    /// (labelled "Program start").
    #[must_use]
    pub fn synthetic_start() -> Self {
        Self {
            step_index: 0,
            current_line: 1,
            source_line_text: String::new(),
            action: Some("Program start".to_owned()),
            variables: Vec::new(),
            stack_frames: vec![StackFrame {
                frame_id: 1,
                function_name: "main".to_owned(),
                line: 1,
                variables: Vec::new(),
            }],
            heap: Vec::new(),
        }
    }

    /// Renders the bit-exact `State` JSON schema from the wire schema
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "step": self.step_index,
            "currentLine": self.current_line,
            "sourceCode": self.source_line_text,
            "action": self.action,
            "variables": self.variables.iter().map(Variable::to_json).collect::<Vec<_>>(),
            "stackFrames": self.stack_frames.iter().map(StackFrame::to_json).collect::<Vec<_>>(),
            "heap": self.heap.iter().map(heap_object_to_json).collect::<Vec<_>>(),
        })
    }
}
