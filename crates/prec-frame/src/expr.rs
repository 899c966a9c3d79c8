//! String expression engine for cuts, category predicates and derived columns.
//!
//! Supports arithmetic (`+ - * /`), comparisons (`== != < <= > >=`), boolean
//! operators in both spellings (`&& || !` and `& | ~`), and built-in functions
//! (`abs sqrt log exp pow min max`). Identifiers may contain dots so that
//! friend-tree columns such as `mva.mva_prc` resolve. Booleans evaluate to
//! `1.0` / `0.0`; any positive value counts as true.

use prec_core::{ErrorInfo, PrecError};

fn parse_error(input: &str, message: impl Into<String>) -> PrecError {
    PrecError::Expression(ErrorInfo::new("expression-parse", message).with_context("expr", input))
}

#[derive(Debug, Clone)]
enum Expr {
    Number(f64),
    Var(usize),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    BinOp(BinOp, Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
}

#[derive(Debug, Clone, Copy)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy)]
enum Func {
    Abs,
    Sqrt,
    Log,
    Exp,
    Pow,
    Min,
    Max,
}

impl Func {
    fn from_name(name: &str) -> Option<(Func, usize)> {
        match name {
            "abs" => Some((Func::Abs, 1)),
            "sqrt" => Some((Func::Sqrt, 1)),
            "log" => Some((Func::Log, 1)),
            "exp" => Some((Func::Exp, 1)),
            "pow" => Some((Func::Pow, 2)),
            "min" => Some((Func::Min, 2)),
            "max" => Some((Func::Max, 2)),
            _ => None,
        }
    }
}

/// A parsed expression ready for evaluation.
#[derive(Debug, Clone)]
pub struct CompiledExpr {
    source: String,
    ast: Expr,
    /// Column names referenced by the expression, ordered by first occurrence.
    pub required_columns: Vec<String>,
}

impl CompiledExpr {
    /// Parses and compiles an expression string.
    pub fn compile(input: &str) -> Result<Self, PrecError> {
        let tokens = tokenize(input)?;
        let mut parser = Parser {
            input,
            tokens: &tokens,
            pos: 0,
            columns: Vec::new(),
        };
        let ast = parser.parse_or()?;
        if let Some(token) = parser.tokens.get(parser.pos) {
            return Err(parse_error(
                input,
                format!("unexpected token after expression: {token:?}"),
            ));
        }
        let columns = std::mem::take(&mut parser.columns);
        Ok(CompiledExpr {
            source: input.to_string(),
            ast,
            required_columns: columns,
        })
    }

    /// The expression text this was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluates the expression for a single row.
    ///
    /// `values` follows the order of [`CompiledExpr::required_columns`].
    pub fn eval_row(&self, values: &[f64]) -> f64 {
        eval(&self.ast, values)
    }

    /// Evaluates the expression column-wise. All columns must have equal length.
    pub fn eval_bulk(&self, columns: &[&[f64]]) -> Vec<f64> {
        let n = columns.first().map_or(0, |col| col.len());
        let mut row = vec![0.0f64; columns.len()];
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            for (j, col) in columns.iter().enumerate() {
                row[j] = col[i];
            }
            out.push(eval(&self.ast, &row));
        }
        out
    }
}

fn truth(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn eval(e: &Expr, vals: &[f64]) -> f64 {
    match e {
        Expr::Number(n) => *n,
        Expr::Var(i) => vals[*i],
        Expr::Neg(a) => -eval(a, vals),
        Expr::Not(a) => truth(eval(a, vals) <= 0.0),
        Expr::BinOp(op, a, b) => {
            let lhs = eval(a, vals);
            let rhs = eval(b, vals);
            match op {
                BinOp::Add => lhs + rhs,
                BinOp::Sub => lhs - rhs,
                BinOp::Mul => lhs * rhs,
                BinOp::Div => lhs / rhs,
                BinOp::Eq => truth((lhs - rhs).abs() < f64::EPSILON),
                BinOp::Ne => truth((lhs - rhs).abs() >= f64::EPSILON),
                BinOp::Lt => truth(lhs < rhs),
                BinOp::Le => truth(lhs <= rhs),
                BinOp::Gt => truth(lhs > rhs),
                BinOp::Ge => truth(lhs >= rhs),
                BinOp::And => truth(lhs > 0.0 && rhs > 0.0),
                BinOp::Or => truth(lhs > 0.0 || rhs > 0.0),
            }
        }
        Expr::Call(f, args) => {
            let a0 = || eval(&args[0], vals);
            let a1 = || eval(&args[1], vals);
            match f {
                Func::Abs => a0().abs(),
                Func::Sqrt => a0().sqrt(),
                Func::Log => a0().ln(),
                Func::Exp => a0().exp(),
                Func::Pow => a0().powf(a1()),
                Func::Min => a0().min(a1()),
                Func::Max => a0().max(a1()),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
}

fn tokenize(input: &str) -> Result<Vec<Token>, PrecError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let next = chars.get(i + 1).copied();
        let two = match (c, next) {
            ('&', Some('&')) => Some(Token::And),
            ('|', Some('|')) => Some(Token::Or),
            ('=', Some('=')) => Some(Token::Eq),
            ('!', Some('=')) => Some(Token::Ne),
            ('<', Some('=')) => Some(Token::Le),
            ('>', Some('=')) => Some(Token::Ge),
            _ => None,
        };
        if let Some(token) = two {
            tokens.push(token);
            i += 2;
            continue;
        }

        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            ',' => Some(Token::Comma),
            '<' => Some(Token::Lt),
            '>' => Some(Token::Gt),
            '&' => Some(Token::And),
            '|' => Some(Token::Or),
            '!' | '~' => Some(Token::Not),
            _ => None,
        };
        if let Some(token) = single {
            tokens.push(token);
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || c == '.' {
            let start = i;
            while i < chars.len()
                && (chars[i].is_ascii_digit()
                    || chars[i] == '.'
                    || chars[i] == 'e'
                    || chars[i] == 'E'
                    || ((chars[i] == '+' || chars[i] == '-')
                        && i > start
                        && (chars[i - 1] == 'e' || chars[i - 1] == 'E')))
            {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let value: f64 = text
                .parse()
                .map_err(|_| parse_error(input, format!("invalid number: '{text}'")))?;
            tokens.push(Token::Num(value));
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len()
                && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '.')
            {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
        } else {
            return Err(parse_error(input, format!("unexpected character: '{c}'")));
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    input: &'a str,
    tokens: &'a [Token],
    pos: usize,
    columns: Vec<String>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<(), PrecError> {
        match self.advance() {
            Some(t) if t == expected => Ok(()),
            other => {
                let message = format!("expected {expected:?}, got {other:?}");
                Err(parse_error(self.input, message))
            }
        }
    }

    fn resolve_column(&mut self, name: &str) -> usize {
        if let Some(i) = self.columns.iter().position(|c| c == name) {
            i
        } else {
            self.columns.push(name.to_string());
            self.columns.len() - 1
        }
    }

    fn parse_or(&mut self) -> Result<Expr, PrecError> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Expr::BinOp(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, PrecError> {
        let mut lhs = self.parse_cmp()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.advance();
            let rhs = self.parse_cmp()?;
            lhs = Expr::BinOp(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_cmp(&mut self) -> Result<Expr, PrecError> {
        let lhs = self.parse_add()?;
        let op = match self.peek() {
            Some(Token::Eq) => BinOp::Eq,
            Some(Token::Ne) => BinOp::Ne,
            Some(Token::Lt) => BinOp::Lt,
            Some(Token::Le) => BinOp::Le,
            Some(Token::Gt) => BinOp::Gt,
            Some(Token::Ge) => BinOp::Ge,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_add()?;
        Ok(Expr::BinOp(op, Box::new(lhs), Box::new(rhs)))
    }

    fn parse_add(&mut self) -> Result<Expr, PrecError> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_mul()?;
            lhs = Expr::BinOp(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<Expr, PrecError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::BinOp(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, PrecError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            Some(Token::Not) => {
                self.advance();
                Ok(Expr::Not(Box::new(self.parse_unary()?)))
            }
            _ => self.parse_atom(),
        }
    }

    fn parse_atom(&mut self) -> Result<Expr, PrecError> {
        match self.advance().cloned() {
            Some(Token::Num(n)) => Ok(Expr::Number(n)),
            Some(Token::LParen) => {
                let e = self.parse_or()?;
                self.expect(&Token::RParen)?;
                Ok(e)
            }
            Some(Token::Ident(name)) => {
                if !matches!(self.peek(), Some(Token::LParen)) {
                    return Ok(Expr::Var(self.resolve_column(&name)));
                }
                self.advance();
                let (func, arity) = Func::from_name(&name).ok_or_else(|| {
                    parse_error(self.input, format!("unknown function: '{name}'"))
                })?;
                let mut args = vec![self.parse_or()?];
                while matches!(self.peek(), Some(Token::Comma)) {
                    self.advance();
                    args.push(self.parse_or()?);
                }
                self.expect(&Token::RParen)?;
                if args.len() != arity {
                    return Err(parse_error(
                        self.input,
                        format!("{name} expects {arity} argument(s), got {}", args.len()),
                    ));
                }
                Ok(Expr::Call(func, args))
            }
            other => Err(parse_error(
                self.input,
                format!("expected number, identifier, or '(', got {other:?}"),
            )),
        }
    }
}
