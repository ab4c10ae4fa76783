//! The expression evaluator.
//!
//! A small recursive-descent parser over precedence levels
//! `ternary > addsub > muldiv > unary > primary`, plus the special forms
//! `sizeof`, `&x`, `*p`, array indexing, and a handful of builtin functions.
//! Hand-written descent, not a parser-combinator or external grammar crate --
//! the grammar is small and fixed, so it doesn't need one.
//!
//! The evaluator is total: it never panics and never returns an error.
//! Unrecognized or malformed input degrades to `Value::Int(0)` in a numeric
//! context, or to the raw source text as a string when the characters are
//! not "numeric-looking".

use crate::{env::VariableMap, ids::Ref, value::{Num, Value}};

/// Evaluates an expression against the current variable map.
///
/// Total: never fails. See module docs for the fallback contract.
#[must_use]
pub fn eval_expr(text: &str, vars: &VariableMap) -> Value {
    let tokens = lex(text);
    let mut parser = Parser {
        tokens,
        pos: 0,
        vars,
    };
    match parser.parse_expr() {
        Some(value) if parser.pos >= parser.tokens.len() => value,
        _ => fallback(text),
    }
}

/// The fallback for input the grammar could not fully consume: zero if the
/// text only contains characters that "look numeric" (digits, decimal point,
/// sign), otherwise the raw trimmed text as a string.
fn fallback(text: &str) -> Value {
    let trimmed = text.trim();
    let looks_numeric = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || " _+-*/().".contains(c));
    if looks_numeric {
        Value::Int(0)
    } else {
        Value::Str(trimmed.to_owned())
    }
}

// ============================================================================
// Lexer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    IntLit(i64),
    FloatLit(f64),
    CharLit(char),
    StrLit(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Question,
    Colon,
    Comma,
    Amp,
}

fn lex(text: &str) -> Vec<Tok> {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    let mut tokens = Vec::new();
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c.is_ascii_digit() {
            let (tok, next) = lex_number(&chars, i);
            tokens.push(tok);
            i = next;
            continue;
        }
        if c == '\'' {
            let (tok, next) = lex_char(&chars, i);
            tokens.push(tok);
            i = next;
            continue;
        }
        if c == '"' {
            let (tok, next) = lex_string(&chars, i);
            tokens.push(tok);
            i = next;
            continue;
        }
        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Tok::Ident(chars[start..i].iter().collect()));
            continue;
        }
        let tok = match c {
            '+' => Some(Tok::Plus),
            '-' => Some(Tok::Minus),
            '*' => Some(Tok::Star),
            '/' => Some(Tok::Slash),
            '%' => Some(Tok::Percent),
            '(' => Some(Tok::LParen),
            ')' => Some(Tok::RParen),
            '[' => Some(Tok::LBracket),
            ']' => Some(Tok::RBracket),
            '?' => Some(Tok::Question),
            ':' => Some(Tok::Colon),
            ',' => Some(Tok::Comma),
            '&' => Some(Tok::Amp),
            _ => None,
        };
        if let Some(tok) = tok {
            tokens.push(tok);
        }
        i += 1;
    }
    tokens
}

fn lex_number(chars: &[char], start: usize) -> (Tok, usize) {
    let mut i = start;
    if chars[i] == '0' && i + 1 < chars.len() && (chars[i + 1] == 'x' || chars[i + 1] == 'X') {
        i += 2;
        let hex_start = i;
        while i < chars.len() && chars[i].is_ascii_hexdigit() {
            i += 1;
        }
        let hex: String = chars[hex_start..i].iter().collect();
        let value = i64::from_str_radix(&hex, 16).unwrap_or(0);
        return (Tok::IntLit(value), i);
    }
    let int_start = i;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    let mut is_float = false;
    if i < chars.len() && chars[i] == '.' {
        is_float = true;
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
    }
    // Trailing float/long suffixes (`1.5f`, `10L`) are accepted and ignored.
    if i < chars.len() && matches!(chars[i], 'f' | 'F' | 'L' | 'l') {
        i += 1;
    }
    let lexeme: String = chars[int_start..i].iter().filter(|c| !matches!(c, 'f' | 'F' | 'L' | 'l')).collect();
    if is_float {
        (Tok::FloatLit(lexeme.parse().unwrap_or(0.0)), i)
    } else {
        (Tok::IntLit(lexeme.parse().unwrap_or(0)), i)
    }
}

fn lex_char(chars: &[char], start: usize) -> (Tok, usize) {
    let mut i = start + 1;
    let ch = if i < chars.len() && chars[i] == '\\' && i + 1 < chars.len() {
        let escaped = unescape(chars[i + 1]);
        i += 2;
        escaped
    } else if i < chars.len() {
        let c = chars[i];
        i += 1;
        c
    } else {
        '\0'
    };
    if i < chars.len() && chars[i] == '\'' {
        i += 1;
    }
    (Tok::CharLit(ch), i)
}

fn lex_string(chars: &[char], start: usize) -> (Tok, usize) {
    let mut i = start + 1;
    let mut out = String::new();
    while i < chars.len() && chars[i] != '"' {
        if chars[i] == '\\' && i + 1 < chars.len() {
            out.push(unescape(chars[i + 1]));
            i += 2;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    if i < chars.len() {
        i += 1; // closing quote
    }
    (Tok::StrLit(out), i)
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        '0' => '\0',
        other => other,
    }
}

// ============================================================================
// Parser
// ============================================================================

struct Parser<'a> {
    tokens: Vec<Tok>,
    pos: usize,
    vars: &'a VariableMap,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, expected: &Tok) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// `expr := ternary`
    fn parse_expr(&mut self) -> Option<Value> {
        self.parse_ternary()
    }

    /// `ternary := addsub ('?' expr ':' expr)?`
    fn parse_ternary(&mut self) -> Option<Value> {
        let cond = self.parse_addsub()?;
        if self.eat(&Tok::Question) {
            let then_val = self.parse_expr()?;
            if !self.eat(&Tok::Colon) {
                return None;
            }
            let else_val = self.parse_expr()?;
            Some(if cond.is_truthy() { then_val } else { else_val })
        } else {
            Some(cond)
        }
    }

    /// `addsub := muldiv (('+'|'-') muldiv)*`
    fn parse_addsub(&mut self) -> Option<Value> {
        let mut acc = self.parse_muldiv()?.as_number();
        loop {
            match self.peek() {
                Some(Tok::Plus) => {
                    self.advance();
                    let rhs = self.parse_muldiv()?.as_number();
                    acc = acc.add(rhs);
                }
                Some(Tok::Minus) => {
                    self.advance();
                    let rhs = self.parse_muldiv()?.as_number();
                    acc = acc.sub(rhs);
                }
                _ => break,
            }
        }
        Some(acc.into_value())
    }

    /// `muldiv := unary (('*'|'/'|'%') unary)*`
    fn parse_muldiv(&mut self) -> Option<Value> {
        let mut acc = self.parse_unary()?.as_number();
        loop {
            match self.peek() {
                Some(Tok::Star) => {
                    self.advance();
                    let rhs = self.parse_unary()?.as_number();
                    acc = acc.mul(rhs);
                }
                Some(Tok::Slash) => {
                    self.advance();
                    let rhs = self.parse_unary()?.as_number();
                    acc = acc.div(rhs);
                }
                Some(Tok::Percent) => {
                    self.advance();
                    let rhs = self.parse_unary()?.as_number();
                    acc = acc.rem(rhs);
                }
                _ => break,
            }
        }
        Some(acc.into_value())
    }

    /// `unary := ('+'|'-')? primary`
    fn parse_unary(&mut self) -> Option<Value> {
        if self.eat(&Tok::Minus) {
            let val = self.parse_primary()?.as_number();
            return Some(val.neg().into_value());
        }
        self.eat(&Tok::Plus);
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Option<Value> {
        match self.advance()? {
            Tok::IntLit(i) => Some(Value::Int(i)),
            Tok::FloatLit(f) => Some(Value::Float(f)),
            Tok::CharLit(c) => Some(Value::Char(c)),
            Tok::StrLit(s) => Some(Value::Str(s)),
            Tok::LParen => {
                let inner = self.parse_expr()?;
                if self.eat(&Tok::RParen) { Some(inner) } else { None }
            }
            Tok::Amp => {
                let Some(Tok::Ident(name)) = self.advance() else { return None };
                Some(Value::Addr(format!("&{name}")))
            }
            Tok::Star => {
                let Some(Tok::Ident(name)) = self.advance() else { return None };
                Some(deref_pointer(self.vars, &name))
            }
            Tok::Ident(name) => self.parse_ident_trailer(name),
            _ => None,
        }
    }

    fn parse_ident_trailer(&mut self, name: String) -> Option<Value> {
        match name.as_str() {
            "true" => return Some(Value::Bool(true)),
            "false" => return Some(Value::Bool(false)),
            "nullptr" | "NULL" => return Some(Value::Null),
            "sizeof" => return self.parse_sizeof(),
            _ => {}
        }
        if self.eat(&Tok::LParen) {
            let args = self.parse_args()?;
            return Some(call_builtin(&name, &args));
        }
        if self.eat(&Tok::LBracket) {
            let index = self.parse_expr()?.as_number().to_i64_trunc();
            if !self.eat(&Tok::RBracket) {
                return None;
            }
            return Some(index_array(self.vars, &name, index));
        }
        Some(lookup_ident(self.vars, &name))
    }

    fn parse_args(&mut self) -> Option<Vec<Value>> {
        let mut args = Vec::new();
        if self.eat(&Tok::RParen) {
            return Some(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if self.eat(&Tok::Comma) {
                continue;
            }
            if self.eat(&Tok::RParen) {
                break;
            }
            return None;
        }
        Some(args)
    }

    /// `'sizeof' '(' (ident | type) ')' ('/' 'sizeof' '(' ident '[' NUM? ']' ')')?`
    fn parse_sizeof(&mut self) -> Option<Value> {
        if !self.eat(&Tok::LParen) {
            return None;
        }
        let Some(Tok::Ident(name)) = self.advance() else { return None };
        if !self.eat(&Tok::RParen) {
            return None;
        }
        let arr_len = self.vars.get(&name).and_then(|v| v.as_array()).map(<[Value]>::len);
        let single_size = arr_len.map_or_else(|| type_size(&name), |len| (len * 4) as i64);

        // Combined form: sizeof(arr)/sizeof(arr[0]) -> element count directly.
        let is_sizeof_divisor =
            matches!(self.peek(), Some(Tok::Slash)) && matches!(self.tokens.get(self.pos + 1), Some(Tok::Ident(s)) if s == "sizeof");
        if is_sizeof_divisor {
            self.pos += 2; // consume '/' and 'sizeof'
            self.eat(&Tok::LParen);
            self.advance(); // element variable name, unused
            if self.eat(&Tok::LBracket) {
                if matches!(self.peek(), Some(Tok::IntLit(_))) {
                    self.advance();
                }
                self.eat(&Tok::RBracket);
            }
            self.eat(&Tok::RParen);
            if let Some(len) = arr_len {
                return Some(Value::Int(len as i64));
            }
        }
        Some(Value::Int(single_size))
    }
}

fn type_size(type_name: &str) -> i64 {
    match type_name {
        "char" | "bool" => 1,
        "short" => 2,
        "long" | "double" => 8,
        _ => 4, // int, float, unknown types
    }
}

fn lookup_ident(vars: &VariableMap, name: &str) -> Value {
    match vars.get(name) {
        Some(var) => var.as_scalar().cloned().unwrap_or(Value::Int(0)),
        None => Value::Int(0),
    }
}

fn index_array(vars: &VariableMap, name: &str, index: i64) -> Value {
    let Some(var) = vars.get(name) else { return Value::Int(0) };
    let Some(items) = var.as_array() else { return Value::Int(0) };
    if index < 0 {
        return Value::Int(0);
    }
    items.get(index as usize).cloned().unwrap_or(Value::Int(0))
}

fn deref_pointer(vars: &VariableMap, name: &str) -> Value {
    match vars.get(name).and_then(|v| v.points_to) {
        Some(target) => Value::Addr(target.as_id_string()),
        None => Value::Int(0),
    }
}

/// Builtin functions. Unknown function names return their first argument,
/// or `0` if called with no arguments.
fn call_builtin(name: &str, args: &[Value]) -> Value {
    let nums: Vec<Num> = args.iter().map(Value::as_number).collect();
    match name {
        "abs" if !nums.is_empty() => match nums[0] {
            Num::Int(i) => Value::Int(i.abs()),
            Num::Float(f) => Value::Float(f.abs()),
        },
        "min" if nums.len() >= 2 => {
            let m = nums.iter().copied().reduce(|a, b| if a.compare(b).is_le() { a } else { b }).unwrap();
            m.into_value()
        }
        "max" if nums.len() >= 2 => {
            let m = nums.iter().copied().reduce(|a, b| if a.compare(b).is_ge() { a } else { b }).unwrap();
            m.into_value()
        }
        "sqrt" if !nums.is_empty() => Value::Float(nums[0].to_f64().max(0.0).sqrt()),
        "pow" if nums.len() >= 2 => Value::Float(nums[0].to_f64().powf(nums[1].to_f64())),
        _ => args.first().cloned().unwrap_or(Value::Int(0)),
    }
}

/// Resolves a pointer variable's `points_to` as a `Ref` for statement
/// execution (used by the line parser, not by expression evaluation proper).
#[must_use]
pub fn resolve_pointer(vars: &VariableMap, name: &str) -> Option<Ref> {
    vars.get(name).and_then(|v| v.points_to)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_vars() -> VariableMap {
        VariableMap::new()
    }

    #[test]
    fn precedence_multiplies_before_adding() {
        assert_eq!(eval_expr("2+3*4", &empty_vars()), Value::Int(14));
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(eval_expr("(2+3)*4", &empty_vars()), Value::Int(20));
    }

    #[test]
    fn modulo_and_truncating_division() {
        assert_eq!(eval_expr("10%3", &empty_vars()), Value::Int(1));
        assert_eq!(eval_expr("7/2", &empty_vars()), Value::Int(3));
    }

    #[test]
    fn negative_truncating_division() {
        assert_eq!(eval_expr("-7/2", &empty_vars()), Value::Int(-3));
    }

    #[test]
    fn ternary_picks_the_right_branch() {
        assert_eq!(eval_expr("1 ? 10 : 20", &empty_vars()), Value::Int(10));
        assert_eq!(eval_expr("0 ? 10 : 20", &empty_vars()), Value::Int(20));
    }

    #[test]
    fn unknown_identifier_is_zero() {
        assert_eq!(eval_expr("unknown_var", &empty_vars()), Value::Int(0));
    }

    #[test]
    fn division_by_zero_is_zero() {
        assert_eq!(eval_expr("5/0", &empty_vars()), Value::Int(0));
    }

    #[test]
    fn sizeof_primitive_types() {
        assert_eq!(eval_expr("sizeof(int)", &empty_vars()), Value::Int(4));
        assert_eq!(eval_expr("sizeof(char)", &empty_vars()), Value::Int(1));
        assert_eq!(eval_expr("sizeof(double)", &empty_vars()), Value::Int(8));
    }

    #[test]
    fn address_of_returns_address_token() {
        assert_eq!(eval_expr("&x", &empty_vars()), Value::Addr("&x".to_owned()));
    }

    #[test]
    fn builtin_min_max_abs() {
        assert_eq!(eval_expr("min(3,5)", &empty_vars()), Value::Int(3));
        assert_eq!(eval_expr("max(3,5)", &empty_vars()), Value::Int(5));
        assert_eq!(eval_expr("abs(-7)", &empty_vars()), Value::Int(7));
    }

    #[test]
    fn non_numeric_garbage_falls_back_to_raw_text() {
        assert_eq!(eval_expr("head->next", &empty_vars()), Value::Str("head->next".to_owned()));
    }
}
