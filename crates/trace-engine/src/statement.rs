//! The line parser / statement recognizer.
//!
//! A fixed catalogue of statement shapes, tried in priority order against
//! each source line. Hand-written recursive matching rather than a regex
//! crate: the grammar is small, fixed, and total (it must never fail to
//! produce *some* answer), which a short sequence of manual parses expresses
//! more plainly than a table of compiled patterns would.

use crate::{
    env::VariableMap,
    expr::eval_expr,
    heap::Heap,
    ids::{HeapId, IdAllocator, Ref},
    value::{Value, VisualKind},
    variable::{VarValue, Variable},
};

const TYPE_KEYWORDS: [&str; 7] = ["int", "float", "double", "char", "bool", "long", "short"];

/// The result of attempting to execute one source line.
#[derive(Debug, Clone, Default)]
pub struct StatementResult {
    pub changed: bool,
    pub action: Option<String>,
}

impl StatementResult {
    fn changed(action: impl Into<String>) -> Self {
        Self {
            changed: true,
            action: Some(action.into()),
        }
    }

    fn unchanged() -> Self {
        Self::default()
    }
}

/// Strips an end-of-line `//` comment and a trailing `;`, per section 4.3's
/// preamble ("after stripping end-of-line comments and trailing semicolons").
#[must_use]
pub fn strip_line(raw: &str) -> String {
    let without_comment = match raw.find("//") {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    without_comment.trim().trim_end_matches(';').trim().to_owned()
}

/// Tries every statement shape in priority order and applies the first
/// match. Returns `changed: false` if nothing in the catalogue recognizes
/// the line (structural lines -- braces, `for`/`while`/`if` headers,
/// comments, `return`, `cout`/`cin`, function signatures -- are handled
/// elsewhere and always fall through here unmatched).
pub fn execute_statement(line: &str, vars: &mut VariableMap, heap: &mut Heap, ids: &mut IdAllocator) -> StatementResult {
    let line = strip_line(line);
    if line.is_empty() {
        return StatementResult::unchanged();
    }

    try_primitive_decl(&line, vars, ids)
        .or_else(|| try_array_decl(&line, vars, ids))
        .or_else(|| try_array_element_assign(&line, vars))
        .or_else(|| try_pointer_new(&line, vars, heap, ids))
        .or_else(|| try_pointer_address_of(&line, vars, ids))
        .or_else(|| try_pointer_null(&line, vars, ids))
        .or_else(|| try_member_assign(&line, vars, heap))
        .or_else(|| try_pointer_reassign_from_field(&line, vars, heap))
        .or_else(|| try_plain_reassign(&line, vars))
        .or_else(|| try_incr_decr(&line, vars))
        .or_else(|| try_compound_assign(&line, vars))
        .or_else(|| try_swap(&line, vars))
        .unwrap_or_else(StatementResult::unchanged)
}

// ============================================================================
// Tiny hand-written scanning helpers
// ============================================================================

pub(crate) fn skip_ws(s: &str) -> &str {
    s.trim_start()
}

fn eat_lit<'a>(s: &'a str, lit: &str) -> Option<&'a str> {
    let s = skip_ws(s);
    s.strip_prefix(lit)
}

pub(crate) fn parse_ident(s: &str) -> Option<(&str, &str)> {
    let s = skip_ws(s);
    let end = s
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_alphanumeric() || *c == '_')
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    let (ident, rest) = s.split_at(end);
    if ident.is_empty() || ident.chars().next().unwrap().is_ascii_digit() {
        None
    } else {
        Some((ident, rest))
    }
}

fn parse_int_literal(s: &str) -> Option<(i64, &str)> {
    let s = skip_ws(s);
    let (neg, s) = s.strip_prefix('-').map_or((false, s), |rest| (true, rest));
    let end = s.char_indices().take_while(|(_, c)| c.is_ascii_digit()).map(|(i, c)| i + c.len_utf8()).last()?;
    let (digits, rest) = s.split_at(end);
    let value: i64 = digits.parse().ok()?;
    Some((if neg { -value } else { value }, rest))
}

/// Finds the arguments inside a balanced `( ... )` starting at the front of
/// `s` (after optional leading whitespace), returning the inner text and the
/// remainder after the closing paren.
pub(crate) fn parse_parens(s: &str) -> Option<(&str, &str)> {
    let s = skip_ws(s);
    let s = s.strip_prefix('(')?;
    let mut depth = 1i32;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&s[..i], &s[i + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits a comma-separated list at the top level (ignoring commas nested
/// inside parentheses or brackets).
fn split_top_level_commas(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = s[start..].trim();
    if !tail.is_empty() || !parts.is_empty() {
        parts.push(tail);
    }
    parts
}

pub(crate) fn is_type_keyword(word: &str) -> bool {
    TYPE_KEYWORDS.contains(&word)
}

// ============================================================================
// Shape 1: `T name = expr;`
// ============================================================================

fn try_primitive_decl(line: &str, vars: &mut VariableMap, ids: &mut IdAllocator) -> Option<StatementResult> {
    let (type_word, rest) = parse_ident(line)?;
    if !is_type_keyword(type_word) {
        return None;
    }
    let (name, rest) = parse_ident(rest)?;
    let rest = skip_ws(rest);
    // Array decl (`name[...`) and pointer decl (`* name`) are handled by
    // their own shapes; bail here so they get a chance.
    if rest.starts_with('[') || line[type_word.len()..].trim_start().starts_with('*') {
        return None;
    }
    let rest = rest.strip_prefix('=')?;
    let expr_text = rest.trim();
    let value = eval_expr(expr_text, vars);
    let var_id = ids.alloc_var();
    let display = value.to_string();
    vars.insert(Variable::primitive(var_id, name, type_word, value));
    Some(StatementResult::changed(format!("Created {name} = {display}")))
}

// ============================================================================
// Shape 2: `T name[N?] = {v1,v2,...};`
// ============================================================================

fn try_array_decl(line: &str, vars: &mut VariableMap, ids: &mut IdAllocator) -> Option<StatementResult> {
    let (type_word, rest) = parse_ident(line)?;
    if !is_type_keyword(type_word) {
        return None;
    }
    let (name, rest) = parse_ident(rest)?;
    let rest = skip_ws(rest);
    let rest = rest.strip_prefix('[')?;
    let close = rest.find(']')?;
    let rest = &rest[close + 1..];
    let rest = skip_ws(rest).strip_prefix('=')?;
    let rest = skip_ws(rest).strip_prefix('{')?;
    let close_brace = rest.rfind('}')?;
    let inner = &rest[..close_brace];
    let values: Vec<Value> = split_top_level_commas(inner)
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(|part| eval_expr(part, vars))
        .collect();
    let rendered = values.iter().map(Value::to_string).collect::<Vec<_>>().join(", ");
    let var_id = ids.alloc_var();
    vars.insert(Variable::array(var_id, name, type_word, values));
    Some(StatementResult::changed(format!("Created {name} = [{rendered}]")))
}

// ============================================================================
// Shape 3: `name[k] = expr;` (k literal int)
// ============================================================================

fn try_array_element_assign(line: &str, vars: &mut VariableMap) -> Option<StatementResult> {
    let (name, rest) = parse_ident(line)?;
    let rest = skip_ws(rest).strip_prefix('[')?;
    let (index, rest) = parse_int_literal(rest)?;
    let rest = skip_ws(rest).strip_prefix(']')?;
    let rest = skip_ws(rest).strip_prefix('=')?;
    let expr_text = rest.trim();
    let value = eval_expr(expr_text, vars);
    let var = vars.get_mut(name)?;
    let items = var.as_array_mut()?;
    if index < 0 || index as usize >= items.len() {
        // Out-of-range writes are dropped, not resized.
        return Some(StatementResult::unchanged());
    }
    items[index as usize] = value.clone();
    Some(StatementResult::changed(format!("Updated {name}[{index}] = {value}")))
}

// ============================================================================
// Shape 4: `T* name = new U();`
// ============================================================================

/// Parses a pointer declaration prefix common to shapes 4-6: an optional
/// type word, a `*` (possibly touching either side), then a name, then `=`.
/// Accepts `Node* head =`, `Node *head =`, `Node * head =`.
fn parse_pointer_decl_prefix(line: &str) -> Option<(&str, &str)> {
    let (_type_word, rest) = parse_ident(line)?;
    let rest = skip_ws(rest).strip_prefix('*')?;
    let (name, rest) = parse_ident(rest)?;
    let rest = skip_ws(rest).strip_prefix('=')?;
    Some((name, rest.trim()))
}

fn try_pointer_new(line: &str, vars: &mut VariableMap, heap: &mut Heap, ids: &mut IdAllocator) -> Option<StatementResult> {
    let (name, rest) = parse_pointer_decl_prefix(line)?;
    let rest = eat_lit(rest, "new")?;
    let (type_word, rest) = parse_ident(rest)?;
    let (_args, rest) = parse_parens(rest)?;
    if !rest.trim().is_empty() {
        return None;
    }
    let heap_id = ids.alloc_heap();
    heap.allocate(type_word, heap_id);
    let var_id = ids.alloc_var();
    vars.insert(Variable::pointer(var_id, name, format!("{type_word}*"), Some(Ref::Heap(heap_id))));
    Some(StatementResult::changed(format!("Created {name} -> new {type_word}()")))
}

// ============================================================================
// Shape 5: `T* name = &var;`
// ============================================================================

fn try_pointer_address_of(line: &str, vars: &mut VariableMap, ids: &mut IdAllocator) -> Option<StatementResult> {
    let (name, rest) = parse_pointer_decl_prefix(line)?;
    let rest = rest.strip_prefix('&')?;
    let (target_name, rest) = parse_ident(rest)?;
    if !rest.trim().is_empty() {
        return None;
    }
    let target = vars.get(target_name)?;
    let target_id = target.id;
    let var_id = ids.alloc_var();
    vars.insert(Variable::pointer(var_id, name, "ptr", Some(Ref::Var(target_id))));
    Some(StatementResult::changed(format!("Created {name} -> &{target_name}")))
}

// ============================================================================
// Shape 6: `T* name = nullptr|NULL;`
// ============================================================================

fn try_pointer_null(line: &str, vars: &mut VariableMap, ids: &mut IdAllocator) -> Option<StatementResult> {
    let (name, rest) = parse_pointer_decl_prefix(line)?;
    if rest != "nullptr" && rest != "NULL" {
        return None;
    }
    let var_id = ids.alloc_var();
    vars.insert(Variable::pointer(var_id, name, "ptr", None));
    Some(StatementResult::changed(format!("Created {name} = nullptr")))
}

// ============================================================================
// Shape 7: `ptr->field = expr;`
// ============================================================================

fn try_member_assign(line: &str, vars: &mut VariableMap, heap: &mut Heap) -> Option<StatementResult> {
    let (ptr_name, rest) = parse_ident(line)?;
    let rest = skip_ws(rest).strip_prefix("->")?;
    let (field_name, rest) = parse_ident(rest)?;
    let rest = skip_ws(rest).strip_prefix('=')?;
    let expr_text = rest.trim();

    let Some(Ref::Heap(heap_id)) = vars.get(ptr_name).and_then(|v| v.points_to) else {
        return None;
    };
    let value = eval_expr(expr_text, vars);
    let is_link_field = matches!(field_name, "next" | "prev") || matches!(value, Value::Null);
    let (visual_kind, points_to) = if is_link_field {
        // The rvalue is itself a pointer variable (or `nullptr`): copy its
        // `points_to` so the field links heap object to heap object.
        let points_to = match &value {
            Value::Null => None,
            _ => vars.get(expr_text.trim()).and_then(|v| v.points_to),
        };
        (VisualKind::Pointer, points_to)
    } else {
        (VisualKind::Primitive, None)
    };

    let obj = heap.get_mut(heap_id)?;
    obj.set_field(field_name, value.clone(), visual_kind, points_to);
    Some(StatementResult::changed(format!("Set {ptr_name}->{field_name} = {value}")))
}

// ============================================================================
// Shape 8: `name = src->field;`
// ============================================================================

fn try_pointer_reassign_from_field(line: &str, vars: &mut VariableMap, heap: &Heap) -> Option<StatementResult> {
    let (name, rest) = parse_ident(line)?;
    let rest = skip_ws(rest).strip_prefix('=')?;
    let (src_name, rest) = parse_ident(rest)?;
    let rest = skip_ws(rest).strip_prefix("->")?;
    let (field_name, rest) = parse_ident(rest)?;
    if !rest.trim().is_empty() {
        return None;
    }
    // Documented quirk (design notes, open question 3): this shape fires
    // whenever the text matches, even if `name` was not declared a pointer.
    if !vars.contains(name) {
        return None;
    }
    let resolved = vars
        .get(src_name)
        .and_then(|v| v.points_to)
        .and_then(|r| match r {
            Ref::Heap(hid) => heap.get(hid),
            Ref::Var(_) => None,
        })
        .and_then(|obj| obj.field(field_name))
        .and_then(|field| field.points_to);
    let var = vars.get_mut(name)?;
    var.set_points_to(resolved);
    Some(StatementResult::changed(format!("Set {name} = {src_name}->{field_name}")))
}

// ============================================================================
// Shape 9: `name = expr;`
// ============================================================================

fn try_plain_reassign(line: &str, vars: &mut VariableMap) -> Option<StatementResult> {
    let (name, rest) = parse_ident(line)?;
    let rest = skip_ws(rest).strip_prefix('=')?;
    // Only a bare `=`, not `==`.
    if rest.starts_with('=') {
        return None;
    }
    let expr_text = rest.trim();
    if !vars.contains(name) {
        return None;
    }
    let value = eval_expr(expr_text, vars);
    let var = vars.get_mut(name)?;
    if var.as_array().is_some() {
        return None;
    }
    var.value = VarValue::Scalar(value.clone());
    Some(StatementResult::changed(format!("{name} changed to {value}")))
}

// ============================================================================
// Shape 10: `++name` / `name++` / `--name` / `name--`
// ============================================================================

fn try_incr_decr(line: &str, vars: &mut VariableMap) -> Option<StatementResult> {
    let (name, delta) = if let Some(rest) = line.strip_prefix("++") {
        (rest.trim(), 1)
    } else if let Some(rest) = line.strip_prefix("--") {
        (rest.trim(), -1)
    } else if let Some(stem) = line.strip_suffix("++") {
        (stem.trim(), 1)
    } else if let Some(stem) = line.strip_suffix("--") {
        (stem.trim(), -1)
    } else {
        return None;
    };
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') || name.is_empty() {
        return None;
    }
    let var = vars.get_mut(name)?;
    let current = var.as_scalar()?.as_number().to_i64_trunc();
    let updated = current + delta;
    var.value = VarValue::Scalar(Value::Int(updated));
    Some(StatementResult::changed(format!("{name} changed to {updated}")))
}

// ============================================================================
// Shape 11: `name op= expr;` (op in {+,-,*,/})
// ============================================================================

fn try_compound_assign(line: &str, vars: &mut VariableMap) -> Option<StatementResult> {
    let (name, rest) = parse_ident(line)?;
    let rest = skip_ws(rest);
    let (op, rest) = ["+=", "-=", "*=", "/="].iter().find_map(|op| rest.strip_prefix(op).map(|r| (*op, r)))?;
    let expr_text = rest.trim();
    let rhs = eval_expr(expr_text, vars).as_number().to_i64_trunc();
    let var = vars.get_mut(name)?;
    let current = var.as_scalar()?.as_number().to_i64_trunc();
    let updated = match op {
        "+=" => current + rhs,
        "-=" => current - rhs,
        "*=" => current * rhs,
        "/=" => if rhs == 0 { 0 } else { current / rhs },
        _ => unreachable!(),
    };
    var.value = VarValue::Scalar(Value::Int(updated));
    Some(StatementResult::changed(format!("{name} changed to {updated}")))
}

// ============================================================================
// Shape 12: `swap(a[i], a[j]);`
// ============================================================================

fn try_swap(line: &str, vars: &mut VariableMap) -> Option<StatementResult> {
    let rest = eat_lit(line, "swap")?;
    let (inner, trailing) = parse_parens(rest)?;
    if !trailing.trim().is_empty() {
        return None;
    }
    let parts = split_top_level_commas(inner);
    if parts.len() != 2 {
        return None;
    }
    let (name_a, idx_a) = parse_index_expr(parts[0])?;
    let (name_b, idx_b) = parse_index_expr(parts[1])?;
    if name_a != name_b {
        return None;
    }
    let items = vars.get_mut(name_a)?.as_array_mut()?;
    if idx_a < 0 || idx_b < 0 || idx_a as usize >= items.len() || idx_b as usize >= items.len() {
        return Some(StatementResult::unchanged());
    }
    items.swap(idx_a as usize, idx_b as usize);
    Some(StatementResult::changed(format!("Swapped {name_a}[{idx_a}] and {name_a}[{idx_b}]")))
}

fn parse_index_expr(text: &str) -> Option<(&str, i64)> {
    let (name, rest) = parse_ident(text)?;
    let rest = skip_ws(rest).strip_prefix('[')?;
    let (index, rest) = parse_int_literal(rest)?;
    let rest = skip_ws(rest).strip_prefix(']')?;
    if !rest.trim().is_empty() {
        return None;
    }
    Some((name, index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> (VariableMap, Heap, IdAllocator) {
        (VariableMap::new(), Heap::new(), IdAllocator::new())
    }

    #[test]
    fn primitive_decl_reports_created_action() {
        let (mut vars, _heap, mut ids) = fresh();
        let res = execute_statement("int x = 10;", &mut vars, &mut Heap::new(), &mut ids);
        assert!(res.changed);
        assert_eq!(res.action.as_deref(), Some("Created x = 10"));
        assert_eq!(vars.get("x").unwrap().as_scalar(), Some(&Value::Int(10)));
    }

    #[test]
    fn array_decl_creates_fixed_length_array() {
        let (mut vars, mut heap, mut ids) = fresh();
        let res = execute_statement("int arr[5] = {1,2,3,4,5};", &mut vars, &mut heap, &mut ids);
        assert!(res.changed);
        assert_eq!(vars.get("arr").unwrap().as_array().unwrap().len(), 5);
    }

    #[test]
    fn array_element_out_of_range_is_dropped_not_resized() {
        let (mut vars, mut heap, mut ids) = fresh();
        execute_statement("int arr[2] = {1,2};", &mut vars, &mut heap, &mut ids);
        let res = execute_statement("arr[9] = 100;", &mut vars, &mut heap, &mut ids);
        assert!(!res.changed);
        assert_eq!(vars.get("arr").unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn pointer_new_allocates_heap_object() {
        let (mut vars, mut heap, mut ids) = fresh();
        let res = execute_statement("Node* head = new Node();", &mut vars, &mut heap, &mut ids);
        assert!(res.changed);
        assert_eq!(heap.objects().len(), 1);
        assert!(matches!(vars.get("head").unwrap().points_to, Some(Ref::Heap(HeapId(1)))));
    }

    #[test]
    fn member_assign_marks_next_as_pointer() {
        let (mut vars, mut heap, mut ids) = fresh();
        execute_statement("Node* head = new Node();", &mut vars, &mut heap, &mut ids);
        execute_statement("Node* second = new Node();", &mut vars, &mut heap, &mut ids);
        execute_statement("head->data = 10;", &mut vars, &mut heap, &mut ids);
        let res = execute_statement("head->next = second;", &mut vars, &mut heap, &mut ids);
        assert!(res.changed);
        let obj = heap.get(HeapId(1)).unwrap();
        assert_eq!(obj.field("next").unwrap().visual_kind, VisualKind::Pointer);
    }

    #[test]
    fn increment_and_compound_assign() {
        let (mut vars, mut heap, mut ids) = fresh();
        execute_statement("int x = 5;", &mut vars, &mut heap, &mut ids);
        execute_statement("x++;", &mut vars, &mut heap, &mut ids);
        assert_eq!(vars.get("x").unwrap().as_scalar(), Some(&Value::Int(6)));
        execute_statement("x += 10;", &mut vars, &mut heap, &mut ids);
        assert_eq!(vars.get("x").unwrap().as_scalar(), Some(&Value::Int(16)));
        execute_statement("x /= 0;", &mut vars, &mut heap, &mut ids);
        assert_eq!(vars.get("x").unwrap().as_scalar(), Some(&Value::Int(0)));
    }

    #[test]
    fn swap_exchanges_array_elements() {
        let (mut vars, mut heap, mut ids) = fresh();
        execute_statement("int arr[3] = {1,2,3};", &mut vars, &mut heap, &mut ids);
        execute_statement("swap(arr[0], arr[2]);", &mut vars, &mut heap, &mut ids);
        let items = vars.get("arr").unwrap().as_array().unwrap();
        assert_eq!(items[0], Value::Int(3));
        assert_eq!(items[2], Value::Int(1));
    }
}
