//! The loop & branch simulator.
//!
//! Owns three things: reflowing raw source text into logical statement
//! lines, brace-matching discovery of `for`/`while`/`if` blocks, and the
//! recursive block executor that walks a range of logical lines, expanding
//! loops and honouring `if` skips as it goes.

use std::collections::HashMap;
use std::ops::Range;

use crate::{
    cond::eval_condition,
    env::VariableMap,
    expr::eval_expr,
    heap::Heap,
    ids::IdAllocator,
    state::State,
    statement::{self, parse_ident, parse_parens, skip_ws},
    value::Value,
    variable::{VarValue, Variable},
};

/// Caps the number of states a single trace may emit, independent of the
/// per-loop `[0, 50]` clamp -- a nested-loop program could otherwise still
/// emit an enormous trace.
#[derive(Debug, Clone, Copy)]
pub struct EngineLimits {
    pub max_total_emitted_states: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_total_emitted_states: 5000,
        }
    }
}

// ============================================================================
// Source reflow
// ============================================================================

/// Reflows raw source text into logical statement lines: splits on `;`,
/// `{`, and `}` wherever they occur outside parentheses, so that brace and
/// loop-header discovery does not depend on which physical line a
/// programmer happened to put them on (the worked examples
/// compress an entire `main` body onto a single physical line).
#[must_use]
pub fn reflow_source(source: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut buf = String::new();
    let mut depth = 0i32;
    for c in source.chars() {
        match c {
            '(' => {
                depth += 1;
                buf.push(c);
            }
            ')' => {
                depth -= 1;
                buf.push(c);
            }
            ';' if depth == 0 => {
                buf.push(c);
                push_line(&mut lines, &buf);
                buf.clear();
            }
            '{' | '}' if depth == 0 => {
                if buf.trim().is_empty() {
                    push_line(&mut lines, &c.to_string());
                } else {
                    buf.push(c);
                    push_line(&mut lines, &buf);
                }
                buf.clear();
            }
            _ => buf.push(c),
        }
    }
    push_line(&mut lines, &buf);
    lines
}

fn push_line(lines: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        lines.push(trimmed.to_owned());
    }
}

/// Finds the line holding the matching closing brace for a control header
/// at `header_idx`, whose line already ends with an attached `{`
/// (guaranteed by [`reflow_source`]). Returns the index of the `}` line.
#[must_use]
pub fn find_block(lines: &[String], header_idx: usize) -> Option<usize> {
    let mut depth = 1i32;
    for (offset, line) in lines.iter().enumerate().skip(header_idx + 1) {
        if line.ends_with('{') {
            depth += 1;
        } else if line.trim() == "}" {
            depth -= 1;
            if depth == 0 {
                return Some(offset);
            }
        }
    }
    None
}

/// Finds the `int main(...) {` header line and returns the half-open range
/// of *interior* line indices (excluding the header and the closing brace).
#[must_use]
pub fn find_main_body(lines: &[String]) -> Option<Range<usize>> {
    let header_idx = lines.iter().position(|l| l.contains("main(") && l.ends_with('{'))?;
    let end_idx = find_block(lines, header_idx)?;
    Some(header_idx + 1..end_idx)
}

fn control_header_kind<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let t = line.trim_start();
    let rest = t.strip_prefix(keyword)?;
    let rest = skip_ws(rest);
    if rest.starts_with('(') { Some(rest) } else { None }
}

#[must_use]
pub fn is_for_header(line: &str) -> bool {
    control_header_kind(line, "for").is_some()
}

#[must_use]
pub fn is_while_header(line: &str) -> bool {
    control_header_kind(line, "while").is_some()
}

#[must_use]
pub fn is_if_header(line: &str) -> bool {
    control_header_kind(line, "if").is_some()
}

fn if_condition_text(line: &str) -> Option<String> {
    let rest = control_header_kind(line, "if")?;
    let (inner, _) = parse_parens(rest)?;
    Some(inner.to_owned())
}

// ============================================================================
// Loop headers
// ============================================================================

#[derive(Debug, Clone)]
pub enum Step {
    Inc,
    Dec,
    AddK(i64),
    SubK(i64),
}

#[derive(Debug, Clone)]
pub enum LoopKind {
    For {
        var: String,
        start_text: String,
        op: String,
        end_text: String,
        step: Step,
    },
    While,
}

#[derive(Debug, Clone)]
pub struct LoopInfo {
    pub end_line: usize,
    pub kind: LoopKind,
}

/// Scans the given range for every `for`/`while` header and records its
/// discovered block, keyed by header line index.
#[must_use]
pub fn discover_loops(lines: &[String], range: Range<usize>) -> HashMap<usize, LoopInfo> {
    let mut loops = HashMap::new();
    for idx in range {
        let Some(line) = lines.get(idx) else { continue };
        if is_for_header(line) {
            if let (Some(end_line), Some(kind)) = (find_block(lines, idx), parse_for_header(line)) {
                loops.insert(idx, LoopInfo { end_line, kind });
            }
        } else if is_while_header(line) {
            if let Some(end_line) = find_block(lines, idx) {
                loops.insert(idx, LoopInfo { end_line, kind: LoopKind::While });
            }
        }
    }
    loops
}

/// `for (T? v = S ; v OP E ; v++|v--|v+=k|v-=k)`
fn parse_for_header(line: &str) -> Option<LoopKind> {
    let stripped = line.trim_end_matches('{').trim();
    let rest = stripped.strip_prefix("for")?;
    let (inner, _) = parse_parens(rest)?;
    let parts: Vec<&str> = inner.splitn(3, ';').map(str::trim).collect();
    if parts.len() != 3 {
        return None;
    }
    let (var, start_text) = parse_for_init(parts[0])?;
    let (cond_var, op, end_text) = parse_for_cond(parts[1])?;
    if cond_var != var {
        return None;
    }
    let step = parse_for_update(parts[2], &var)?;
    Some(LoopKind::For { var, start_text, op, end_text, step })
}

fn parse_for_init(text: &str) -> Option<(String, String)> {
    let (first, rest) = parse_ident(text)?;
    if statement::is_type_keyword(first) {
        let (name, rest) = parse_ident(rest)?;
        let rest = skip_ws(rest).strip_prefix('=')?;
        Some((name.to_owned(), rest.trim().to_owned()))
    } else {
        let rest = skip_ws(rest).strip_prefix('=')?;
        Some((first.to_owned(), rest.trim().to_owned()))
    }
}

fn parse_for_cond(text: &str) -> Option<(String, String, String)> {
    let (name, rest) = parse_ident(text)?;
    let rest = skip_ws(rest);
    for op in ["<=", ">=", "!=", "<", ">"] {
        if let Some(r) = rest.strip_prefix(op) {
            return Some((name.to_owned(), op.to_owned(), r.trim().to_owned()));
        }
    }
    None
}

fn parse_for_update(text: &str, var: &str) -> Option<Step> {
    let t = text.trim();
    if t == format!("{var}++") || t == format!("++{var}") {
        return Some(Step::Inc);
    }
    if t == format!("{var}--") || t == format!("--{var}") {
        return Some(Step::Dec);
    }
    let rest = t.strip_prefix(var)?.trim();
    if let Some(k) = rest.strip_prefix("+=") {
        return Some(Step::AddK(k.trim().parse().ok()?));
    }
    if let Some(k) = rest.strip_prefix("-=") {
        return Some(Step::SubK(k.trim().parse().ok()?));
    }
    None
}

/// Iteration count for a discovered loop header, clamped to `[0, 50]`
/// regardless of how far apart the bounds are.
#[must_use]
pub fn iteration_count(op: &str, start: i64, end: i64) -> usize {
    let raw = match op {
        "<" => end - start,
        "<=" => end - start + 1,
        ">" => start - end,
        ">=" => start - end + 1,
        "!=" => (end - start).abs(),
        _ => 0,
    };
    raw.clamp(0, 50) as usize
}

fn apply_step(current: i64, step: &Step) -> i64 {
    match step {
        Step::Inc => current + 1,
        Step::Dec => current - 1,
        Step::AddK(k) => current + k,
        Step::SubK(k) => current - k,
    }
}

/// Replaces `[var]` and standalone word-boundary occurrences of every
/// active induction variable with its current value, as the first step of
/// executing one loop-body iteration.
fn apply_substitutions(line: &str, active: &HashMap<String, i64>) -> String {
    let mut out = line.to_owned();
    for (var, value) in active {
        out = substitute_word(&out, var, &value.to_string());
    }
    out
}

fn substitute_word(text: &str, word: &str, replacement: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let wchars: Vec<char> = word.chars().collect();
    let mut result = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i..].starts_with(wchars.as_slice()) {
            let before_ok = i == 0 || !is_ident_char(chars[i - 1]);
            let after_idx = i + wchars.len();
            let after_ok = after_idx >= chars.len() || !is_ident_char(chars[after_idx]);
            if before_ok && after_ok {
                result.push_str(replacement);
                i = after_idx;
                continue;
            }
        }
        result.push(chars[i]);
        i += 1;
    }
    result
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// ============================================================================
// Recursive block executor
// ============================================================================

/// Everything the recursive walk needs that isn't the line range itself.
pub struct ExecCtx<'a> {
    pub lines: &'a [String],
    pub loops: &'a HashMap<usize, LoopInfo>,
    pub vars: &'a mut VariableMap,
    pub heap: &'a mut Heap,
    pub ids: &'a mut IdAllocator,
    pub emit: bool,
    pub states: &'a mut Vec<State>,
    pub limits: EngineLimits,
}

/// Walks `range`, expanding any loop headers found in `ctx.loops` and
/// honouring `if` skips, dispatching every other line to the statement
/// executor. `active` holds the induction-variable substitutions currently
/// in scope (possibly from enclosing loops). Returns `false` once the
/// emitted-state budget is exhausted, signalling callers to stop recursing.
pub fn run_block(ctx: &mut ExecCtx<'_>, range: Range<usize>, active: &HashMap<String, i64>) -> bool {
    let mut i = range.start;
    while i < range.end {
        if ctx.emit && ctx.states.len() >= ctx.limits.max_total_emitted_states {
            return false;
        }
        if let Some(info) = ctx.loops.get(&i).cloned() {
            if !run_loop(ctx, i, &info, active) {
                return false;
            }
            i = info.end_line + 1;
            continue;
        }

        let raw = &ctx.lines[i];
        let substituted = apply_substitutions(raw, active);
        if is_if_header(&substituted) {
            let Some(block_end) = find_block(ctx.lines, i) else {
                i += 1;
                continue;
            };
            let cond_text = if_condition_text(&substituted).unwrap_or_default();
            if eval_condition(&cond_text, ctx.vars) && !run_block(ctx, i + 1..block_end, active) {
                return false;
            }
            i = block_end + 1;
            continue;
        }

        let result = statement::execute_statement(&substituted, ctx.vars, ctx.heap, ctx.ids);
        if result.changed && ctx.emit {
            let line_no = (i + 1) as u32;
            let state = State::capture(ctx.states.len(), line_no, substituted.clone(), result.action, ctx.vars, ctx.heap);
            ctx.states.push(state);
        }
        i += 1;
    }
    true
}

fn run_loop(ctx: &mut ExecCtx<'_>, header_idx: usize, info: &LoopInfo, active: &HashMap<String, i64>) -> bool {
    match &info.kind {
        LoopKind::For { var, start_text, op, end_text, step } => {
            let start_val = eval_expr(&apply_substitutions(start_text, active), ctx.vars).as_number().to_i64_trunc();
            let end_val = eval_expr(&apply_substitutions(end_text, active), ctx.vars).as_number().to_i64_trunc();
            let count = iteration_count(op, start_val, end_val);
            let var_id = ctx.ids.alloc_var();
            ctx.vars.insert(Variable::primitive(var_id, var.clone(), "int", Value::Int(start_val)));
            let mut current = start_val;
            for _ in 0..count {
                if let Some(v) = ctx.vars.get_mut(var) {
                    v.value = VarValue::Scalar(Value::Int(current));
                }
                let mut inner_active = active.clone();
                inner_active.insert(var.clone(), current);
                if !run_block(ctx, header_idx + 1..info.end_line, &inner_active) {
                    return false;
                }
                current = apply_step(current, step);
            }
            true
        }
        LoopKind::While => {
            // Hard-coded 10 iterations regardless of any loop condition
            // text -- the header carries no condition to evaluate by
            // design here (documented open question: termination is
            // decoupled from program semantics).
            for _ in 0..10 {
                if !run_block(ctx, header_idx + 1..info.end_line, active) {
                    return false;
                }
            }
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflow_splits_a_single_physical_line_into_statements() {
        let lines = reflow_source("int main(){ int x=10; int y=20; return 0; }");
        assert_eq!(lines, vec!["int main(){", "int x=10;", "int y=20;", "return 0;", "}"]);
    }

    #[test]
    fn reflow_keeps_for_header_semicolons_intact() {
        let lines = reflow_source("for(int i=0;i<5;i++){ arr[i]=i; }");
        assert_eq!(lines[0], "for(int i=0;i<5;i++){");
        assert_eq!(lines[1], "arr[i]=i;");
        assert_eq!(lines[2], "}");
    }

    #[test]
    fn find_block_matches_nested_braces() {
        let lines = reflow_source("int main(){ if(1){ int x=1; } int y=2; }");
        let main_header = lines.iter().position(|l| l.contains("main(")).unwrap();
        let end = find_block(&lines, main_header).unwrap();
        assert_eq!(lines[end], "}");
        assert_eq!(end, lines.len() - 1);
    }

    #[test]
    fn iteration_count_clamps_to_fifty() {
        assert_eq!(iteration_count("<", 0, 1000), 50);
        assert_eq!(iteration_count("<", 5, 2), 0);
    }

    #[test]
    fn substitution_respects_word_boundaries() {
        let mut active = HashMap::new();
        active.insert("i".to_owned(), 3i64);
        let out = apply_substitutions("arr[i] = i * size;", &active);
        assert_eq!(out, "arr[3] = 3 * size;");
    }
}
