//! Boolean conditions for Iterate, the repeat containers and Conditional
//!
//! An expression is evaluated in two steps: `${name}` placeholders are
//! resolved against the context, then the text is parsed as a boolean
//! expression whose bare identifiers name context variables.
//!
//! ```text
//! expr    := and (("or" | "||") and)*
//! and     := not (("and" | "&&") not)*
//! not     := ("not" | "!") not | cmp
//! cmp     := operand (op operand)?
//! op      := < <= > >= = == != | lt le gt ge eq ne
//! operand := number | 'string' | "string" | true | false | identifier | "(" expr ")"
//! number  := -?digits(.digits)?([eE][+-]?digits)?
//! ```
//!
//! Strings that parse as finite numbers compare numerically.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;
use std::sync::Arc;

use serde_json::Value;

use crate::common::{Error, Result};
use crate::context::TestContext;

type Predicate = Arc<dyn Fn(&TestContext) -> bool + Send + Sync>;

/// A boolean test evaluated against the context
#[derive(Clone)]
pub enum Condition {
    /// Expression text, e.g. `i lt 3` or `${status} = 'done'`
    Expression(String),
    /// Caller-supplied predicate
    Predicate(Predicate),
}

impl Condition {
    pub fn expression(expr: impl Into<String>) -> Self {
        Self::Expression(expr.into())
    }

    pub fn predicate(f: impl Fn(&TestContext) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(f))
    }

    /// Evaluate the condition
    ///
    /// Every failure is reported as [`Error::Condition`].
    pub fn evaluate(&self, context: &TestContext) -> Result<bool> {
        match self {
            Self::Expression(expr) => evaluate_expression(expr, context),
            Self::Predicate(f) => Ok(f(context)),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expression(expr) => f.debug_tuple("Expression").field(expr).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expression(expr) => write!(f, "{}", expr),
            Self::Predicate(_) => write!(f, "<predicate>"),
        }
    }
}

impl From<&str> for Condition {
    fn from(expr: &str) -> Self {
        Self::expression(expr)
    }
}

impl From<String> for Condition {
    fn from(expr: String) -> Self {
        Self::Expression(expr)
    }
}

/// Evaluate a boolean expression against the context
pub fn evaluate_expression(expr: &str, context: &TestContext) -> Result<bool> {
    let resolved = context
        .resolve(expr)
        .map_err(|e| Error::condition(expr, e.to_string()))?;
    let tokens = tokenize(&resolved).map_err(|reason| Error::condition(expr, reason))?;

    let mut parser = Parser {
        tokens,
        pos: 0,
        context,
    };
    let result = parser
        .parse_or()
        .and_then(|operand| {
            if parser.pos < parser.tokens.len() {
                Err(format!("unexpected token '{}'", parser.tokens[parser.pos]))
            } else {
                operand.truthy()
            }
        })
        .map_err(|reason| Error::condition(expr, reason))?;

    tracing::trace!(expression = expr, result, "Evaluated condition");
    Ok(result)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Op(CmpOp),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Str(s) => write!(f, "'{}'", s),
            Token::Ident(s) => write!(f, "{}", s),
            Token::Op(op) => write!(f, "{:?}", op),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

fn tokenize(input: &str) -> std::result::Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '\'' | '"' => {
                chars.next();
                tokens.push(Token::Str(read_quoted(&mut chars, c)?));
            }
            '<' | '>' | '=' | '!' => {
                chars.next();
                let eq = chars.next_if_eq(&'=').is_some();
                let token = match (c, eq) {
                    ('<', false) => Token::Op(CmpOp::Lt),
                    ('<', true) => Token::Op(CmpOp::Le),
                    ('>', false) => Token::Op(CmpOp::Gt),
                    ('>', true) => Token::Op(CmpOp::Ge),
                    ('=', _) => Token::Op(CmpOp::Eq),
                    ('!', true) => Token::Op(CmpOp::Ne),
                    _ => Token::Not,
                };
                tokens.push(token);
            }
            '&' | '|' => {
                chars.next();
                if chars.next_if_eq(&c).is_none() {
                    return Err(format!("expected '{}{}'", c, c));
                }
                tokens.push(if c == '&' { Token::And } else { Token::Or });
            }
            c if c.is_ascii_digit() || c == '-' || c == '.' => {
                let mut text = String::new();
                text.push(c);
                chars.next();
                while let Some(d) = chars.next_if(|d| d.is_ascii_digit() || *d == '.') {
                    text.push(d);
                }
                if has_exponent(&chars) {
                    text.extend(chars.next());
                    text.extend(chars.next_if(|c| matches!(c, '+' | '-')));
                    while let Some(d) = chars.next_if(char::is_ascii_digit) {
                        text.push(d);
                    }
                }
                if text == "-" || text == "." {
                    return Err(format!("unexpected '{}'", text));
                }
                let n = text
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number '{}'", text))?;
                tokens.push(Token::Number(n));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(w) =
                    chars.next_if(|w| w.is_alphanumeric() || *w == '_' || *w == '.')
                {
                    word.push(w);
                }
                tokens.push(match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "lt" => Token::Op(CmpOp::Lt),
                    "le" => Token::Op(CmpOp::Le),
                    "gt" => Token::Op(CmpOp::Gt),
                    "ge" => Token::Op(CmpOp::Ge),
                    "eq" => Token::Op(CmpOp::Eq),
                    "ne" => Token::Op(CmpOp::Ne),
                    _ => Token::Ident(word),
                });
            }
            other => return Err(format!("unexpected character '{}'", other)),
        }
    }

    Ok(tokens)
}

/// Whether the upcoming characters are an exponent such as `e3` or `E-2`
fn has_exponent(chars: &Peekable<Chars<'_>>) -> bool {
    let mut look = chars.clone();
    if !matches!(look.next(), Some('e' | 'E')) {
        return false;
    }
    look.next_if(|c| matches!(c, '+' | '-'));
    look.next().is_some_and(|c| c.is_ascii_digit())
}

fn read_quoted(chars: &mut Peekable<Chars<'_>>, quote: char) -> std::result::Result<String, String> {
    let mut s = String::new();
    loop {
        match chars.next() {
            Some(c) if c == quote => return Ok(s),
            Some(c) => s.push(c),
            None => return Err("unterminated string literal".to_string()),
        }
    }
}

/// Evaluated operand
#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Number(f64),
    Str(String),
    Bool(bool),
}

impl Operand {
    fn from_value(value: Value) -> Self {
        match value {
            Value::Bool(b) => Operand::Bool(b),
            Value::Number(n) => n.as_f64().map(Operand::Number).unwrap_or(Operand::Str(n.to_string())),
            Value::String(s) => Operand::Str(s),
            other => Operand::Str(other.to_string()),
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Operand::Number(n) => Some(*n),
            // "NaN" and "inf" stay text
            Operand::Str(s) => s.trim().parse().ok().filter(|n: &f64| n.is_finite()),
            Operand::Bool(_) => None,
        }
    }

    fn as_text(&self) -> String {
        match self {
            Operand::Number(n) => n.to_string(),
            Operand::Str(s) => s.clone(),
            Operand::Bool(b) => b.to_string(),
        }
    }

    fn truthy(&self) -> std::result::Result<bool, String> {
        match self {
            Operand::Bool(b) => Ok(*b),
            Operand::Str(s) if s.eq_ignore_ascii_case("true") => Ok(true),
            Operand::Str(s) if s.eq_ignore_ascii_case("false") => Ok(false),
            other => Err(format!("'{}' is not a boolean", other.as_text())),
        }
    }

    fn compare(&self, op: CmpOp, rhs: &Operand) -> std::result::Result<bool, String> {
        if let (Some(a), Some(b)) = (self.as_number(), rhs.as_number()) {
            return Ok(match op {
                CmpOp::Lt => a < b,
                CmpOp::Le => a <= b,
                CmpOp::Gt => a > b,
                CmpOp::Ge => a >= b,
                CmpOp::Eq => a == b,
                CmpOp::Ne => a != b,
            });
        }

        let (a, b) = (self.as_text(), rhs.as_text());
        Ok(match op {
            CmpOp::Lt => a < b,
            CmpOp::Le => a <= b,
            CmpOp::Gt => a > b,
            CmpOp::Ge => a >= b,
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
        })
    }
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    context: &'a TestContext,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn parse_or(&mut self) -> std::result::Result<Operand, String> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let rhs = self.parse_and()?;
            lhs = Operand::Bool(lhs.truthy()? || rhs.truthy()?);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> std::result::Result<Operand, String> {
        let mut lhs = self.parse_not()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let rhs = self.parse_not()?;
            lhs = Operand::Bool(lhs.truthy()? && rhs.truthy()?);
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> std::result::Result<Operand, String> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            let inner = self.parse_not()?;
            return Ok(Operand::Bool(!inner.truthy()?));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> std::result::Result<Operand, String> {
        let lhs = self.parse_operand()?;
        if let Some(Token::Op(op)) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.parse_operand()?;
            return lhs.compare(op, &rhs).map(Operand::Bool);
        }
        Ok(lhs)
    }

    fn parse_operand(&mut self) -> std::result::Result<Operand, String> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Operand::Number(n)),
            Some(Token::Str(s)) => Ok(Operand::Str(s)),
            Some(Token::Ident(name)) => match name.as_str() {
                "true" => Ok(Operand::Bool(true)),
                "false" => Ok(Operand::Bool(false)),
                _ => self
                    .context
                    .get(&name)
                    .map(Operand::from_value)
                    .ok_or_else(|| format!("unknown variable '{}'", name)),
            },
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err("missing closing ')'".to_string()),
                }
            }
            Some(other) => Err(format!("unexpected token '{}'", other)),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}
