//! The condition evaluator.
//!
//! Conditions are matched against a small, ordered catalogue of comparison
//! shapes -- optionally prefixed with a modulo check -- before falling back
//! to the expression evaluator's truthiness.

use crate::{env::VariableMap, expr::eval_expr, value::Num};

/// Evaluates a boolean condition string.
///
/// Recognized shapes, tried in order:
/// 1. `lhs % m == 0` / `lhs % m != 0` (and the reverse `0 == lhs % m`)
/// 2. `lhs OP rhs` where `OP` is one of `==`, `!=`, `<=`, `>=`, `<`, `>`
/// 3. fallback: truthiness of the whole string evaluated as an expression.
#[must_use]
pub fn eval_condition(text: &str, vars: &VariableMap) -> bool {
    let trimmed = text.trim();

    if let Some(result) = eval_modulo_comparison(trimmed, vars) {
        return result;
    }

    if let Some(result) = eval_binary_comparison(trimmed, vars) {
        return result;
    }

    eval_expr(trimmed, vars).is_truthy()
}

/// Recognizes `lhs % m OP 0` or `0 OP lhs % m` for `OP` in `{==, !=}`.
fn eval_modulo_comparison(text: &str, vars: &VariableMap) -> Option<bool> {
    for op in ["==", "!="] {
        if let Some((lhs, rhs)) = split_once_operator(text, op) {
            let lhs_is_modulo = lhs.contains('%');
            let rhs_is_modulo = rhs.contains('%');
            if lhs_is_modulo && rhs.trim() == "0" {
                let value = eval_expr(lhs.trim(), vars).as_number().to_i64_trunc();
                return Some(if op == "==" { value == 0 } else { value != 0 });
            }
            if rhs_is_modulo && lhs.trim() == "0" {
                let value = eval_expr(rhs.trim(), vars).as_number().to_i64_trunc();
                return Some(if op == "==" { value == 0 } else { value != 0 });
            }
        }
    }
    None
}

/// Recognizes `lhs OP rhs` for the six comparison operators, longest first
/// so `==` is not mistaken for two `=` tokens and `<=`/`>=` are not mistaken
/// for `<`/`>`.
fn eval_binary_comparison(text: &str, vars: &VariableMap) -> Option<bool> {
    const OPERATORS: [&str; 6] = ["==", "!=", "<=", ">=", "<", ">"];
    for op in OPERATORS {
        if let Some((lhs, rhs)) = split_once_operator(text, op) {
            let lhs_val = eval_expr(lhs.trim(), vars).as_number();
            let rhs_val = eval_expr(rhs.trim(), vars).as_number();
            return Some(compare(lhs_val, op, rhs_val));
        }
    }
    None
}

fn compare(lhs: Num, op: &str, rhs: Num) -> bool {
    use std::cmp::Ordering::{Equal, Greater, Less};
    let ord = lhs.compare(rhs);
    match op {
        "==" => ord == Equal,
        "!=" => ord != Equal,
        "<" => ord == Less,
        ">" => ord == Greater,
        "<=" => ord != Greater,
        ">=" => ord != Less,
        _ => false,
    }
}

/// Splits `text` on the first top-level occurrence of `op`, ignoring matches
/// inside parentheses. Returns `None` if `op` does not appear outside of
/// parentheses.
fn split_once_operator<'a>(text: &'a str, op: &str) -> Option<(&'a str, &'a str)> {
    let bytes = text.as_bytes();
    let op_bytes = op.as_bytes();
    let mut depth = 0i32;
    let mut i = 0;
    while i + op_bytes.len() <= bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => depth -= 1,
            _ => {}
        }
        if depth == 0 && &bytes[i..i + op_bytes.len()] == op_bytes {
            // Avoid splitting `<=`/`>=`/`==`/`!=` on their shorter prefixes
            // when scanning for `<`/`>` alone.
            if op == "<" && bytes.get(i + 1) == Some(&b'=') {
                i += 1;
                continue;
            }
            if op == ">" && bytes.get(i + 1) == Some(&b'=') {
                i += 1;
                continue;
            }
            return Some((&text[..i], &text[i + op_bytes.len()..]));
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> VariableMap {
        VariableMap::new()
    }

    #[test]
    fn simple_equality() {
        assert!(eval_condition("3 == 3", &empty()));
        assert!(!eval_condition("3 == 4", &empty()));
    }

    #[test]
    fn less_equal_and_greater_equal() {
        assert!(eval_condition("3 <= 3", &empty()));
        assert!(eval_condition("4 >= 3", &empty()));
        assert!(!eval_condition("3 < 3", &empty()));
    }

    #[test]
    fn modulo_check_even() {
        assert!(eval_condition("4 % 2 == 0", &empty()));
        assert!(!eval_condition("5 % 2 == 0", &empty()));
    }

    #[test]
    fn fallback_truthiness() {
        assert!(eval_condition("5", &empty()));
        assert!(!eval_condition("0", &empty()));
    }
}
