//! Evaluator for the expression subset used by templates and assertions.
//!
//! Supported forms:
//!
//! - literals: `null`, `true`, `false`, integers, decimals and
//!   `'single quoted'` strings;
//! - `$name` binding references, `@` for the current node, or a bare field
//!   name relative to the current node, each optionally followed by
//!   `.field`, `[index]` or `['key']` segments;
//! - a single `==` or `!=` comparison between two operands.
//!
//! A `$name` that is not bound is an error. A path that does not resolve
//! yields `null`.

use serde_json::{Number, Value};

use crate::bindings::Bindings;
use crate::error::ExpressionError;

/// One step of a path into a JSON value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object member access.
    Field(String),
    /// Array element access.
    Index(usize),
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Literal(Value),
    Binding { name: String, path: Vec<Segment> },
    Current(Vec<Segment>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Equal,
    NotEqual,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Operand(Operand),
    Compare {
        lhs: Operand,
        op: Comparison,
        rhs: Operand,
    },
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    text: String,
    node: Node,
}

impl Expression {
    /// Parse `text`.
    ///
    /// # Errors
    ///
    /// Returns [`ExpressionError::Syntax`] when `text` is not in the
    /// supported subset.
    pub fn parse(text: &str) -> Result<Self, ExpressionError> {
        let node = Parser::new(text).parse()?;
        Ok(Self {
            text: String::from(text.trim()),
            node,
        })
    }

    /// The trimmed source text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Evaluate against `current` and `bindings`.
    ///
    /// # Errors
    ///
    /// Returns [`ExpressionError::UndefinedBinding`] when a referenced
    /// `$name` is not bound.
    pub fn eval(&self, current: &Value, bindings: &Bindings) -> Result<Value, ExpressionError> {
        match &self.node {
            Node::Operand(operand) => resolve(operand, current, bindings),
            Node::Compare { lhs, op, rhs } => {
                let left = resolve(lhs, current, bindings)?;
                let right = resolve(rhs, current, bindings)?;
                let equal = values_equal(&left, &right);
                Ok(Value::Bool(match op {
                    Comparison::Equal => equal,
                    Comparison::NotEqual => !equal,
                }))
            }
        }
    }
}

/// Parse and evaluate `text` in one step.
///
/// # Errors
///
/// Returns an [`ExpressionError`] when parsing or evaluation fails.
pub fn evaluate(text: &str, current: &Value, bindings: &Bindings) -> Result<Value, ExpressionError> {
    Expression::parse(text)?.eval(current, bindings)
}

/// Follow `path` from `root`, yielding `None` when a segment is missing.
#[must_use]
pub fn lookup<'a>(root: &'a Value, path: &[Segment]) -> Option<&'a Value> {
    path.iter().try_fold(root, |value, segment| match segment {
        Segment::Field(field) => value.get(field.as_str()),
        Segment::Index(index) => value.get(*index),
    })
}

/// Equality with integer and decimal forms of a number treated as equal.
#[must_use]
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(lhs), Value::Number(rhs)) if lhs.is_f64() || rhs.is_f64() => {
            match (lhs.as_f64(), rhs.as_f64()) {
                (Some(a), Some(b)) => a.total_cmp(&b).is_eq(),
                _ => false,
            }
        }
        _ => left == right,
    }
}

fn resolve(
    operand: &Operand,
    current: &Value,
    bindings: &Bindings,
) -> Result<Value, ExpressionError> {
    match operand {
        Operand::Literal(value) => Ok(value.clone()),
        Operand::Current(path) => Ok(lookup(current, path).cloned().unwrap_or(Value::Null)),
        Operand::Binding { name, path } => {
            let binding = bindings
                .get(name)
                .ok_or_else(|| ExpressionError::UndefinedBinding { name: name.clone() })?;
            Ok(lookup(binding.value(), path).cloned().unwrap_or(Value::Null))
        }
    }
}

struct Parser<'a> {
    text: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<Node, ExpressionError> {
        let lhs = self.operand()?;
        self.skip_whitespace();
        let Some(op) = self.comparison() else {
            return self.finish(Node::Operand(lhs));
        };
        let rhs = self.operand()?;
        self.finish(Node::Compare { lhs, op, rhs })
    }

    fn finish(&mut self, node: Node) -> Result<Node, ExpressionError> {
        self.skip_whitespace();
        if let Some(extra) = self.peek() {
            return Err(self.error(&format!("unexpected '{extra}'")));
        }
        Ok(node)
    }

    fn comparison(&mut self) -> Option<Comparison> {
        let op = match (self.peek(), self.peek_at(1)) {
            (Some('='), Some('=')) => Comparison::Equal,
            (Some('!'), Some('=')) => Comparison::NotEqual,
            _ => return None,
        };
        self.pos += 2;
        Some(op)
    }

    fn operand(&mut self) -> Result<Operand, ExpressionError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(self.error("expected an operand")),
            Some('\'') => self.string().map(|text| Operand::Literal(Value::String(text))),
            Some('$') => {
                self.pos += 1;
                let ident = self
                    .identifier()
                    .ok_or_else(|| self.error("expected a binding name after '$'"))?;
                Ok(Operand::Binding {
                    name: format!("${ident}"),
                    path: self.segments()?,
                })
            }
            Some('@') => {
                self.pos += 1;
                Ok(Operand::Current(self.segments()?))
            }
            Some(c) if c.is_ascii_digit() || c == '-' => self.number().map(Operand::Literal),
            Some(c) if is_identifier_start(c) => {
                let ident = self.identifier().unwrap_or_default();
                let path = self.segments()?;
                if path.is_empty() {
                    match ident.as_str() {
                        "null" => return Ok(Operand::Literal(Value::Null)),
                        "true" => return Ok(Operand::Literal(Value::Bool(true))),
                        "false" => return Ok(Operand::Literal(Value::Bool(false))),
                        _ => {}
                    }
                }
                let mut full = vec![Segment::Field(ident)];
                full.extend(path);
                Ok(Operand::Current(full))
            }
            Some(other) => Err(self.error(&format!("unexpected '{other}'"))),
        }
    }

    fn segments(&mut self) -> Result<Vec<Segment>, ExpressionError> {
        let mut path = Vec::new();
        loop {
            match self.peek() {
                Some('.') => {
                    self.pos += 1;
                    let field = self
                        .identifier()
                        .ok_or_else(|| self.error("expected a field name after '.'"))?;
                    path.push(Segment::Field(field));
                }
                Some('[') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    let segment = if self.peek() == Some('\'') {
                        Segment::Field(self.string()?)
                    } else {
                        let digits = self.take_while(|c| c.is_ascii_digit());
                        let index = digits
                            .parse()
                            .map_err(|_| self.error("expected an array index"))?;
                        Segment::Index(index)
                    };
                    self.skip_whitespace();
                    if self.peek() != Some(']') {
                        return Err(self.error("expected ']'"));
                    }
                    self.pos += 1;
                    path.push(segment);
                }
                _ => return Ok(path),
            }
        }
    }

    fn string(&mut self) -> Result<String, ExpressionError> {
        self.pos += 1;
        let mut text = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated string literal")),
                Some('\'') => {
                    self.pos += 1;
                    return Ok(text);
                }
                Some('\\') => {
                    let escaped = self
                        .peek_at(1)
                        .ok_or_else(|| self.error("unterminated string literal"))?;
                    text.push(escaped);
                    self.pos += 2;
                }
                Some(c) => {
                    text.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn number(&mut self) -> Result<Value, ExpressionError> {
        let raw = self.take_while(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'));
        if let Ok(integer) = raw.parse::<i64>() {
            return Ok(Value::Number(Number::from(integer)));
        }
        raw.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| self.error(&format!("invalid number '{raw}'")))
    }

    fn identifier(&mut self) -> Option<String> {
        if !self.peek().is_some_and(is_identifier_start) {
            return None;
        }
        Some(self.take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-')))
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> String {
        let mut taken = String::new();
        while let Some(c) = self.peek().filter(|c| predicate(*c)) {
            taken.push(c);
            self.pos += 1;
        }
        taken
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn error(&self, reason: &str) -> ExpressionError {
        ExpressionError::Syntax {
            expression: String::from(self.text),
            reason: String::from(reason),
        }
    }
}

const fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}
