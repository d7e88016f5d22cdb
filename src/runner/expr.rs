//! Expression evaluation
//!
//! A small, side-effect free expression language used by conditions and by
//! `{{ }}` placeholders: literals, names, attribute and index access, filters,
//! comparisons, arithmetic and boolean connectives. There are no function
//! calls and no assignments.

use crate::error::{is_undefined, TemplateError, TemplateResult};
use crate::runner::scope::Namespace;
use serde_yaml::{Mapping, Value};
use std::cmp::Ordering;
use std::env;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Pipe,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
}

fn tokenize(source: &str) -> TemplateResult<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let is_float =
                    i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit();
                if is_float {
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let token = if is_float {
                    text.parse().map(Token::Float).ok()
                } else {
                    text.parse().map(Token::Int).ok()
                };
                tokens.push(token.ok_or_else(|| {
                    TemplateError::InvalidSyntax(format!("bad number '{}'", text))
                })?);
            }
            '\'' | '"' => {
                let quote = c;
                let mut text = String::new();
                i += 1;
                loop {
                    let Some(&ch) = chars.get(i) else {
                        return Err(TemplateError::InvalidSyntax(format!(
                            "unterminated string in {:?}",
                            source
                        )));
                    };
                    i += 1;
                    match ch {
                        '\\' => {
                            let escaped = chars.get(i).copied().unwrap_or('\\');
                            i += 1;
                            text.push(match escaped {
                                'n' => '\n',
                                't' => '\t',
                                other => other,
                            });
                        }
                        ch if ch == quote => break,
                        ch => text.push(ch),
                    }
                }
                tokens.push(Token::Str(text));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            _ => {
                let next = chars.get(i + 1).copied();
                let (token, width) = match (c, next) {
                    ('=', Some('=')) => (Token::Eq, 2),
                    ('!', Some('=')) => (Token::Ne, 2),
                    ('<', Some('=')) => (Token::Le, 2),
                    ('>', Some('=')) => (Token::Ge, 2),
                    ('<', _) => (Token::Lt, 1),
                    ('>', _) => (Token::Gt, 1),
                    ('(', _) => (Token::LParen, 1),
                    (')', _) => (Token::RParen, 1),
                    ('[', _) => (Token::LBracket, 1),
                    (']', _) => (Token::RBracket, 1),
                    (',', _) => (Token::Comma, 1),
                    ('.', _) => (Token::Dot, 1),
                    ('|', _) => (Token::Pipe, 1),
                    ('+', _) => (Token::Plus, 1),
                    ('-', _) => (Token::Minus, 1),
                    ('*', _) => (Token::Star, 1),
                    ('/', _) => (Token::Slash, 1),
                    ('%', _) => (Token::Percent, 1),
                    _ => {
                        return Err(TemplateError::InvalidSyntax(format!(
                            "unexpected character '{}' in {:?}",
                            c, source
                        )))
                    }
                };
                tokens.push(token);
                i += width;
            }
        }
    }

    Ok(tokens)
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// Parsed expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    List(Vec<Expr>),
    Name(String),
    Attr(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Filter {
        target: Box<Expr>,
        name: String,
        args: Vec<Expr>,
    },
    Test {
        target: Box<Expr>,
        name: String,
        negated: bool,
    },
    Not(Box<Expr>),
    Neg(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare(Box<Expr>, CmpOp, Box<Expr>),
    Arith(Box<Expr>, ArithOp, Box<Expr>),
}

/// Parse an expression
pub fn parse(source: &str) -> TemplateResult<Expr> {
    let mut parser = Parser {
        tokens: tokenize(source)?,
        pos: 0,
        source,
    };
    let expr = parser.or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(parser.unexpected(Some(token.clone()))),
    }
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'a str,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_keyword(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(w)) if w == word)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn unexpected(&self, token: Option<Token>) -> TemplateError {
        match token {
            Some(token) => TemplateError::InvalidSyntax(format!(
                "unexpected {:?} in {:?}",
                token, self.source
            )),
            None => TemplateError::InvalidSyntax(format!("unexpected end of {:?}", self.source)),
        }
    }

    fn expect(&mut self, expected: Token) -> TemplateResult<()> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            other => Err(self.unexpected(other)),
        }
    }

    fn ident(&mut self) -> TemplateResult<String> {
        match self.next() {
            Some(Token::Ident(name)) => Ok(name),
            other => Err(self.unexpected(other)),
        }
    }

    fn or(&mut self) -> TemplateResult<Expr> {
        let mut left = self.and()?;
        while self.peek_keyword("or") {
            self.pos += 1;
            left = Expr::Or(Box::new(left), Box::new(self.and()?));
        }
        Ok(left)
    }

    fn and(&mut self) -> TemplateResult<Expr> {
        let mut left = self.not()?;
        while self.peek_keyword("and") {
            self.pos += 1;
            left = Expr::And(Box::new(left), Box::new(self.not()?));
        }
        Ok(left)
    }

    fn not(&mut self) -> TemplateResult<Expr> {
        if self.peek_keyword("not") {
            self.pos += 1;
            return Ok(Expr::Not(Box::new(self.not()?)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> TemplateResult<Expr> {
        let mut left = self.additive()?;

        loop {
            let op = match self.peek().cloned() {
                Some(Token::Eq) => CmpOp::Eq,
                Some(Token::Ne) => CmpOp::Ne,
                Some(Token::Lt) => CmpOp::Lt,
                Some(Token::Le) => CmpOp::Le,
                Some(Token::Gt) => CmpOp::Gt,
                Some(Token::Ge) => CmpOp::Ge,
                Some(Token::Ident(ref w)) if w == "in" => CmpOp::In,
                Some(Token::Ident(ref w)) if w == "not" => {
                    self.pos += 1;
                    if !self.peek_keyword("in") {
                        return Err(self.unexpected(self.peek().cloned()));
                    }
                    CmpOp::NotIn
                }
                Some(Token::Ident(ref w)) if w == "is" => {
                    self.pos += 1;
                    let negated = self.peek_keyword("not");
                    if negated {
                        self.pos += 1;
                    }
                    let name = self.ident()?;
                    left = Expr::Test {
                        target: Box::new(left),
                        name,
                        negated,
                    };
                    continue;
                }
                _ => break,
            };
            self.pos += 1;
            let right = self.additive()?;
            left = Expr::Compare(Box::new(left), op, Box::new(right));
        }

        Ok(left)
    }

    fn additive(&mut self) -> TemplateResult<Expr> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => ArithOp::Add,
                Some(Token::Minus) => ArithOp::Sub,
                _ => break,
            };
            self.pos += 1;
            left = Expr::Arith(Box::new(left), op, Box::new(self.multiplicative()?));
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> TemplateResult<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => ArithOp::Mul,
                Some(Token::Slash) => ArithOp::Div,
                Some(Token::Percent) => ArithOp::Rem,
                _ => break,
            };
            self.pos += 1;
            left = Expr::Arith(Box::new(left), op, Box::new(self.unary()?));
        }
        Ok(left)
    }

    fn unary(&mut self) -> TemplateResult<Expr> {
        if self.peek() == Some(&Token::Minus) {
            self.pos += 1;
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> TemplateResult<Expr> {
        let mut expr = self.primary()?;

        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.pos += 1;
                    let name = match self.next() {
                        Some(Token::Ident(name)) => name,
                        Some(Token::Int(n)) => n.to_string(),
                        other => return Err(self.unexpected(other)),
                    };
                    expr = Expr::Attr(Box::new(expr), name);
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let index = self.or()?;
                    self.expect(Token::RBracket)?;
                    expr = Expr::Index(Box::new(expr), Box::new(index));
                }
                Some(Token::Pipe) => {
                    self.pos += 1;
                    let name = self.ident()?;
                    let args = if self.peek() == Some(&Token::LParen) {
                        self.pos += 1;
                        self.list_items(Token::RParen)?
                    } else {
                        Vec::new()
                    };
                    expr = Expr::Filter {
                        target: Box::new(expr),
                        name,
                        args,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn list_items(&mut self, close: Token) -> TemplateResult<Vec<Expr>> {
        let mut items = Vec::new();
        if self.peek() == Some(&close) {
            self.pos += 1;
            return Ok(items);
        }
        loop {
            items.push(self.or()?);
            match self.next() {
                Some(Token::Comma) if self.peek() == Some(&close) => {
                    self.pos += 1;
                    return Ok(items);
                }
                Some(Token::Comma) => continue,
                Some(token) if token == close => return Ok(items),
                other => return Err(self.unexpected(other)),
            }
        }
    }

    fn primary(&mut self) -> TemplateResult<Expr> {
        match self.next() {
            Some(Token::Int(n)) => Ok(Expr::Literal(Value::Number(n.into()))),
            Some(Token::Float(f)) => Ok(Expr::Literal(Value::Number(f.into()))),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Token::Ident(name)) => Ok(match name.as_str() {
                "true" | "True" => Expr::Literal(Value::Bool(true)),
                "false" | "False" => Expr::Literal(Value::Bool(false)),
                "none" | "None" | "null" => Expr::Literal(Value::Null),
                _ => Expr::Name(name),
            }),
            Some(Token::LParen) => {
                let expr = self.or()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Some(Token::LBracket) => Ok(Expr::List(self.list_items(Token::RBracket)?)),
            other => Err(self.unexpected(other)),
        }
    }
}

/// Evaluates parsed expressions against a namespace
pub struct Evaluator<'a> {
    ns: &'a dyn Namespace,
}

impl<'a> Evaluator<'a> {
    pub fn new(ns: &'a dyn Namespace) -> Self {
        Evaluator { ns }
    }

    pub fn eval(&self, expr: &Expr) -> TemplateResult<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<TemplateResult<Vec<_>>>()
                .map(Value::Sequence),
            Expr::Name(name) => self.lookup(name),
            Expr::Attr(target, name) => {
                let value = self.eval(target)?;
                member(&value, &Value::String(name.clone()))
                    .ok_or_else(|| TemplateError::UndefinedVariable(name.clone()))
            }
            Expr::Index(target, index) => {
                let value = self.eval(target)?;
                let index = self.eval(index)?;
                member(&value, &index).ok_or_else(|| {
                    TemplateError::UndefinedVariable(format!("[{}]", render_value(&index)))
                })
            }
            Expr::Filter { target, name, args } => self.filter(target, name, args),
            Expr::Test {
                target,
                name,
                negated,
            } => {
                let result = match name.as_str() {
                    "defined" => self.is_defined(target)?,
                    "undefined" => !self.is_defined(target)?,
                    "none" => self.eval(target)? == Value::Null,
                    other => {
                        return Err(TemplateError::InvalidSyntax(format!(
                            "unknown test '{}'",
                            other
                        )))
                    }
                };
                Ok(Value::Bool(result != *negated))
            }
            Expr::Not(inner) => Ok(Value::Bool(!is_truthy(&self.eval(inner)?))),
            Expr::Neg(inner) => match number(&self.eval(inner)?) {
                Some(Num::Int(n)) => Ok(Value::Number((-n).into())),
                Some(Num::Float(f)) => Ok(Value::Number((-f).into())),
                None => Err(TemplateError::Type("cannot negate a non-number".to_string())),
            },
            Expr::And(left, right) => {
                let left = self.eval(left)?;
                if is_truthy(&left) {
                    self.eval(right)
                } else {
                    Ok(left)
                }
            }
            Expr::Or(left, right) => {
                let left = self.eval(left)?;
                if is_truthy(&left) {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }
            Expr::Compare(left, op, right) => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                compare(&left, *op, &right).map(Value::Bool)
            }
            Expr::Arith(left, op, right) => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                arith(&left, *op, &right)
            }
        }
    }

    fn lookup(&self, name: &str) -> TemplateResult<Value> {
        if let Some(value) = self.ns.lookup(name) {
            return Ok(value);
        }
        if name == "env" {
            return Ok(environment());
        }
        Err(TemplateError::UndefinedVariable(name.to_string()))
    }

    fn is_defined(&self, expr: &Expr) -> TemplateResult<bool> {
        match self.eval(expr) {
            Ok(_) => Ok(true),
            Err(e) if is_undefined(&e) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn filter(&self, target: &Expr, name: &str, args: &[Expr]) -> TemplateResult<Value> {
        if name == "default" || name == "d" {
            return match self.eval(target) {
                Ok(value) => Ok(value),
                Err(e) if is_undefined(&e) => match args.first() {
                    Some(fallback) => self.eval(fallback),
                    None => Ok(Value::String(String::new())),
                },
                Err(e) => Err(e),
            };
        }

        let value = self.eval(target)?;
        let text = || render_value(&value);

        Ok(match name {
            "basename" => Value::String(
                Path::new(&text())
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            ),
            "dirname" => Value::String(
                Path::new(&text())
                    .parent()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            ),
            "abspath" => Value::String(absolute_path(&text()).to_string_lossy().into_owned()),
            "expanduser" => Value::String(expand_home(&text()).to_string_lossy().into_owned()),
            "lower" => Value::String(text().to_lowercase()),
            "upper" => Value::String(text().to_uppercase()),
            "trim" => Value::String(text().trim().to_string()),
            "string" => Value::String(text()),
            "int" => match &value {
                Value::Bool(b) => Value::Number(i64::from(*b).into()),
                other => match number(other).or_else(|| numeric_text(other)) {
                    Some(Num::Int(n)) => Value::Number(n.into()),
                    Some(Num::Float(f)) => Value::Number((f.trunc() as i64).into()),
                    None => {
                        return Err(TemplateError::Type(format!(
                            "cannot convert '{}' to int",
                            text()
                        )))
                    }
                },
            },
            "length" => {
                let len = match &value {
                    Value::Sequence(items) => items.len(),
                    Value::Mapping(map) => map.len(),
                    other => render_value(other).chars().count(),
                };
                Value::Number((len as u64).into())
            }
            other => return Err(TemplateError::UnknownFilter(other.to_string())),
        })
    }
}

/// Parse and evaluate an expression in one step
pub fn evaluate(source: &str, ns: &dyn Namespace) -> TemplateResult<Value> {
    Evaluator::new(ns).eval(&parse(source)?)
}

/// Truthiness of a value
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Sequence(items) => !items.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Tagged(tagged) => is_truthy(&tagged.value),
    }
}

/// Text form of a value as placeholders render it
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        _ => render_flow(value),
    }
}

fn render_flow(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Sequence(items) => {
            let items: Vec<String> = items.iter().map(render_flow).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Mapping(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", render_flow(k), render_flow(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
        Value::Tagged(tagged) => render_flow(&tagged.value),
    }
}

fn environment() -> Value {
    Value::Mapping(
        env::vars_os()
            .filter_map(|(k, v)| {
                Some((
                    Value::String(k.into_string().ok()?),
                    Value::String(v.into_string().ok()?),
                ))
            })
            .collect::<Mapping>(),
    )
}

fn member(value: &Value, key: &Value) -> Option<Value> {
    match (value, key) {
        (Value::Mapping(map), key) => map.get(key).cloned().or_else(|| {
            // `a.1` and `a['1']` both reach a numeric or textual key
            let text = render_value(key);
            map.iter()
                .find(|(k, _)| render_value(k) == text)
                .map(|(_, v)| v.clone())
        }),
        (Value::Sequence(items), key) => {
            let index = position(integer(key)?, items.len())?;
            items.get(index).cloned()
        }
        (Value::String(s), key) => {
            let chars: Vec<char> = s.chars().collect();
            let index = position(integer(key)?, chars.len())?;
            chars.get(index).map(|c| Value::String(c.to_string()))
        }
        (Value::Tagged(tagged), key) => member(&tagged.value, key),
        _ => None,
    }
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn position(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let index = if index < 0 { len + index } else { index };
    usize::try_from(index).ok()
}

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(n) => n as f64,
            Num::Float(f) => f,
        }
    }
}

fn number(value: &Value) -> Option<Num> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Num::Int)
            .or_else(|| n.as_f64().map(Num::Float)),
        _ => None,
    }
}

fn numeric_text(value: &Value) -> Option<Num> {
    let text = value.as_str()?.trim();
    text.parse()
        .map(Num::Int)
        .ok()
        .or_else(|| text.parse().map(Num::Float).ok())
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (number(left), number(right)) {
        (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

fn order(left: &Value, right: &Value) -> TemplateResult<Ordering> {
    let pair = match (number(left), number(right)) {
        (Some(a), Some(b)) => Some((a, b)),
        (Some(a), None) => numeric_text(right).map(|b| (a, b)),
        (None, Some(b)) => numeric_text(left).map(|a| (a, b)),
        (None, None) => None,
    };
    if let Some((a, b)) = pair {
        return a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .ok_or_else(|| TemplateError::Type("cannot order NaN".to_string()));
    }

    match (left, right) {
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
        _ => Err(TemplateError::Type(format!(
            "cannot order '{}' and '{}'",
            render_flow(left),
            render_flow(right)
        ))),
    }
}

fn contains(container: &Value, item: &Value) -> TemplateResult<bool> {
    match container {
        Value::Sequence(items) => Ok(items.iter().any(|v| values_equal(v, item))),
        Value::Mapping(map) => Ok(map.contains_key(item)),
        Value::String(s) => match item {
            Value::String(needle) => Ok(s.contains(needle.as_str())),
            other => Err(TemplateError::Type(format!(
                "'in <string>' requires a string, not '{}'",
                render_flow(other)
            ))),
        },
        other => Err(TemplateError::Type(format!(
            "'{}' is not a container",
            render_flow(other)
        ))),
    }
}

fn compare(left: &Value, op: CmpOp, right: &Value) -> TemplateResult<bool> {
    Ok(match op {
        CmpOp::Eq => values_equal(left, right),
        CmpOp::Ne => !values_equal(left, right),
        CmpOp::Lt => order(left, right)? == Ordering::Less,
        CmpOp::Le => order(left, right)? != Ordering::Greater,
        CmpOp::Gt => order(left, right)? == Ordering::Greater,
        CmpOp::Ge => order(left, right)? != Ordering::Less,
        CmpOp::In => contains(right, left)?,
        CmpOp::NotIn => !contains(right, left)?,
    })
}

fn arith(left: &Value, op: ArithOp, right: &Value) -> TemplateResult<Value> {
    if op == ArithOp::Add {
        match (left, right) {
            (Value::String(a), Value::String(b)) => return Ok(Value::String(format!("{}{}", a, b))),
            (Value::Sequence(a), Value::Sequence(b)) => {
                return Ok(Value::Sequence(a.iter().chain(b).cloned().collect()))
            }
            _ => {}
        }
    }

    let (Some(a), Some(b)) = (number(left), number(right)) else {
        return Err(TemplateError::Type(format!(
            "unsupported operands '{}' and '{}'",
            render_flow(left),
            render_flow(right)
        )));
    };

    let result = match (op, a, b) {
        (ArithOp::Div, _, _) | (ArithOp::Rem, _, _) if b.as_f64() == 0.0 => {
            return Err(TemplateError::Type("division by zero".to_string()))
        }
        (ArithOp::Div, a, b) => Num::Float(a.as_f64() / b.as_f64()),
        (ArithOp::Add, Num::Int(a), Num::Int(b)) => a.checked_add(b).map_or(Num::Float(a as f64 + b as f64), Num::Int),
        (ArithOp::Sub, Num::Int(a), Num::Int(b)) => a.checked_sub(b).map_or(Num::Float(a as f64 - b as f64), Num::Int),
        (ArithOp::Mul, Num::Int(a), Num::Int(b)) => a.checked_mul(b).map_or(Num::Float(a as f64 * b as f64), Num::Int),
        (ArithOp::Rem, Num::Int(a), Num::Int(b)) => Num::Int(a.rem_euclid(b)),
        (ArithOp::Add, a, b) => Num::Float(a.as_f64() + b.as_f64()),
        (ArithOp::Sub, a, b) => Num::Float(a.as_f64() - b.as_f64()),
        (ArithOp::Mul, a, b) => Num::Float(a.as_f64() * b.as_f64()),
        (ArithOp::Rem, a, b) => Num::Float(a.as_f64().rem_euclid(b.as_f64())),
    };

    Ok(match result {
        Num::Int(n) => Value::Number(n.into()),
        Num::Float(f) => Value::Number(f.into()),
    })
}

/// Make a path absolute against the current directory, resolving `.` and `..`
pub fn absolute_path(path: &str) -> PathBuf {
    let path = Path::new(path);
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("/"))
            .join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    let home = || directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
    match path.strip_prefix('~') {
        Some("") => home().unwrap_or_else(|| PathBuf::from(path)),
        Some(rest) if rest.starts_with('/') => match home() {
            Some(home) => home.join(rest.trim_start_matches('/')),
            None => PathBuf::from(path),
        },
        _ => PathBuf::from(path),
    }
}
