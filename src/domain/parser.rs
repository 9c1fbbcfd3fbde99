//! Formula lexer, parser and expression tree.
//!
//! Formulas are normalized (lowercased, whitespace removed), split into
//! tokens with identifiers resolved against a [`MathVocabulary`], given
//! explicit `*` tokens wherever multiplication is implied by adjacency, and
//! parsed by recursive descent.
//!
//! # Grammar
//!
//! ```bnf
//! Expression ::= Term ( ( "+" | "-" ) Term )*
//! Term       ::= Unary ( ( "*" | "/" ) Unary )*
//! Unary      ::= ( "+" | "-" ) Unary | Power
//! Power      ::= Primary ( ( "^" | "**" ) Unary )?
//! Primary    ::= Number | "x" | Function "(" Expression ")" | "(" Expression ")"
//! Number     ::= [0-9]* ( "." [0-9]* )?
//! Identifier ::= [a-z] [a-z0-9_]*
//! ```
//!
//! - Power is right-associative and binds tighter than unary minus, so
//!   `2^3^2` is `2^(3^2)` and `-x^2` is `-(x^2)`.
//! - Constants (`pi`, `e`, `tau`, `phi`) are replaced by their values while
//!   lexing; identifiers are matched as whole words, so `sin` is never read
//!   as `s*i*n`.
//! - Multiplication is implied after a number or constant when followed by a
//!   number, constant, `x`, function or `(`, and after `)` when followed by a
//!   number, constant, `x` or function. `)(` and `x(` are errors.

use std::fmt;

use super::errors::{ParseError, ParseResult};
use super::vocabulary::{MathVocabulary, UnaryFn};

/// Maximum nesting of parentheses, signs, powers and calls.
///
/// Runs of `+ -` and `* /` are stored flat in [`Expr::Chain`], so tree
/// height depends only on nesting and never on the number of terms. This
/// keeps the parser, the evaluator and drop well inside any thread's stack.
pub const MAX_DEPTH: usize = 256;

/// A lexical token. Constants are already folded into `Number`.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Variable,
    Function(String),

    Plus,
    Minus,
    Multiply,
    Divide,
    Power,

    LeftParen,
    RightParen,

    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(value) => write!(f, "{value}"),
            Token::Variable => f.write_str("x"),
            Token::Function(name) => f.write_str(name),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Multiply => f.write_str("*"),
            Token::Divide => f.write_str("/"),
            Token::Power => f.write_str("^"),
            Token::LeftParen => f.write_str("("),
            Token::RightParen => f.write_str(")"),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl BinaryOp {
    /// Applies the operator with IEEE-754 semantics.
    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            BinaryOp::Add => left + right,
            BinaryOp::Subtract => left - right,
            BinaryOp::Multiply => left * right,
            BinaryOp::Divide => left / right,
            BinaryOp::Power => power(left, right),
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Power => "^",
        }
    }
}

/// `powf`, except that `(±1)^(±inf)` and `(±1)^NaN` are NaN.
fn power(base: f64, exponent: f64) -> f64 {
    if base.abs() == 1.0 && !exponent.is_finite() {
        f64::NAN
    } else {
        base.powf(exponent)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

/// Parsed formula.
#[derive(Debug, Clone)]
pub enum Expr {
    Number(f64),
    Variable,

    Unary {
        operator: UnaryOp,
        operand: Box<Expr>,
    },

    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
    },

    /// Left-to-right run of same-precedence operators, `first op1 e1 op2 e2 ...`.
    /// Holds at least two operations; a single one is a `Binary`.
    Chain {
        first: Box<Expr>,
        rest: Vec<(BinaryOp, Expr)>,
    },

    Call {
        name: String,
        function: UnaryFn,
        argument: Box<Expr>,
    },
}

impl Expr {
    fn chain(first: Expr, mut rest: Vec<(BinaryOp, Expr)>) -> Expr {
        match rest.len() {
            0 => first,
            1 => {
                let (operator, right) = rest.remove(0);
                Expr::Binary {
                    left: Box::new(first),
                    operator,
                    right: Box::new(right),
                }
            }
            _ => Expr::Chain {
                first: Box::new(first),
                rest,
            },
        }
    }

    /// Evaluates the tree at `x`. Never fails: domain errors come back as
    /// NaN or an infinity.
    pub fn evaluate(&self, x: f64) -> f64 {
        match self {
            Expr::Number(value) => *value,
            Expr::Variable => x,
            Expr::Unary { operator, operand } => {
                let value = operand.evaluate(x);
                match operator {
                    UnaryOp::Plus => value,
                    UnaryOp::Minus => -value,
                }
            }
            Expr::Binary { left, operator, right } => {
                operator.apply(left.evaluate(x), right.evaluate(x))
            }
            Expr::Chain { first, rest } => rest
                .iter()
                .fold(first.evaluate(x), |acc, (operator, operand)| {
                    operator.apply(acc, operand.evaluate(x))
                }),
            Expr::Call { function, argument, .. } => function(argument.evaluate(x)),
        }
    }

    /// Whether the tree mentions `x`.
    pub fn uses_variable(&self) -> bool {
        match self {
            Expr::Number(_) => false,
            Expr::Variable => true,
            Expr::Unary { operand, .. } => operand.uses_variable(),
            Expr::Binary { left, right, .. } => left.uses_variable() || right.uses_variable(),
            Expr::Chain { first, rest } => {
                first.uses_variable() || rest.iter().any(|(_, operand)| operand.uses_variable())
            }
            Expr::Call { argument, .. } => argument.uses_variable(),
        }
    }
}

// Functions compare by name; comparing fn pointers is not reliable.
impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Expr::Number(a), Expr::Number(b)) => a == b,
            (Expr::Variable, Expr::Variable) => true,
            (
                Expr::Unary { operator: op_a, operand: a },
                Expr::Unary { operator: op_b, operand: b },
            ) => op_a == op_b && a == b,
            (
                Expr::Binary { left: la, operator: op_a, right: ra },
                Expr::Binary { left: lb, operator: op_b, right: rb },
            ) => op_a == op_b && la == lb && ra == rb,
            (
                Expr::Chain { first: first_a, rest: rest_a },
                Expr::Chain { first: first_b, rest: rest_b },
            ) => first_a == first_b && rest_a == rest_b,
            (
                Expr::Call { name: name_a, argument: a, .. },
                Expr::Call { name: name_b, argument: b, .. },
            ) => name_a == name_b && a == b,
            _ => false,
        }
    }
}

/// Fully parenthesized rendering, e.g. `(2 * sin(x))`. Chains print as
/// the equivalent left-nested binary operations.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(value) => write!(f, "{value}"),
            Expr::Variable => f.write_str("x"),
            Expr::Unary { operator: UnaryOp::Plus, operand } => write!(f, "(+{operand})"),
            Expr::Unary { operator: UnaryOp::Minus, operand } => write!(f, "(-{operand})"),
            Expr::Binary { left, operator, right } => {
                write!(f, "({left} {} {right})", operator.symbol())
            }
            Expr::Chain { first, rest } => {
                write!(f, "{}{first}", "(".repeat(rest.len()))?;
                for (operator, operand) in rest {
                    write!(f, " {} {operand})", operator.symbol())?;
                }
                Ok(())
            }
            Expr::Call { name, argument, .. } => write!(f, "{name}({argument})"),
        }
    }
}

/// Lexical analyzer over a normalized formula.
pub struct Lexer<'a> {
    input: Vec<char>,
    position: usize,
    current_char: Option<char>,
    vocabulary: &'a MathVocabulary,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer; the input is lowercased and stripped of whitespace.
    pub fn new(input: &str, vocabulary: &'a MathVocabulary) -> Self {
        let chars: Vec<char> = input
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        let current_char = chars.first().copied();

        Self {
            input: chars,
            position: 0,
            current_char,
            vocabulary,
        }
    }

    fn advance(&mut self) {
        self.position += 1;
        self.current_char = self.input.get(self.position).copied();
    }

    /// Reads a run of digits and dots; more than one dot is malformed.
    fn read_number(&mut self) -> ParseResult<f64> {
        let mut text = String::new();

        while let Some(ch) = self.current_char {
            if ch.is_ascii_digit() || ch == '.' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if text.matches('.').count() > 1 {
            return Err(ParseError::MalformedNumber(text));
        }
        text.parse::<f64>()
            .map_err(|_| ParseError::MalformedNumber(text))
    }

    fn read_identifier(&mut self) -> String {
        let mut identifier = String::new();

        while let Some(ch) = self.current_char {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        identifier
    }

    /// Resolves a whole word to the variable, a constant or a function.
    fn classify_identifier(&self, identifier: String) -> ParseResult<Token> {
        if identifier == "x" {
            Ok(Token::Variable)
        } else if let Some(value) = self.vocabulary.constant(&identifier) {
            Ok(Token::Number(value))
        } else if self.vocabulary.function(&identifier).is_some() {
            Ok(Token::Function(identifier))
        } else {
            Err(ParseError::UnknownIdentifier(identifier))
        }
    }

    fn single(&mut self, token: Token) -> ParseResult<Token> {
        self.advance();
        Ok(token)
    }

    /// Gets the next token from the input.
    pub fn next_token(&mut self) -> ParseResult<Token> {
        let Some(ch) = self.current_char else {
            return Ok(Token::Eof);
        };

        match ch {
            '0'..='9' | '.' => self.read_number().map(Token::Number),
            'a'..='z' => {
                let identifier = self.read_identifier();
                self.classify_identifier(identifier)
            }
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '*' => {
                self.advance();
                if self.current_char == Some('*') {
                    self.single(Token::Power)
                } else {
                    Ok(Token::Multiply)
                }
            }
            '/' => self.single(Token::Divide),
            '^' => self.single(Token::Power),
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            _ => Err(ParseError::UnexpectedCharacter(ch)),
        }
    }

    /// Lexes the whole input. The returned vector always ends with `Eof`.
    pub fn tokenize(mut self) -> ParseResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

/// Inserts `Multiply` between adjacent tokens whose juxtaposition means a
/// product: `2x`, `2(x+1)`, `2sin(x)`, `(x+1)2`, `(x+1)x`.
pub fn insert_implicit_multiplication(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());

    for token in tokens {
        if out.last().is_some_and(|previous| implies_multiplication(previous, &token)) {
            out.push(Token::Multiply);
        }
        out.push(token);
    }

    out
}

fn implies_multiplication(left: &Token, right: &Token) -> bool {
    match left {
        Token::Number(_) => matches!(
            right,
            Token::Number(_) | Token::Variable | Token::Function(_) | Token::LeftParen
        ),
        Token::RightParen => matches!(
            right,
            Token::Number(_) | Token::Variable | Token::Function(_)
        ),
        _ => false,
    }
}

fn additive_operator(token: &Token) -> Option<BinaryOp> {
    match token {
        Token::Plus => Some(BinaryOp::Add),
        Token::Minus => Some(BinaryOp::Subtract),
        _ => None,
    }
}

fn multiplicative_operator(token: &Token) -> Option<BinaryOp> {
    match token {
        Token::Multiply => Some(BinaryOp::Multiply),
        Token::Divide => Some(BinaryOp::Divide),
        _ => None,
    }
}

/// Recursive descent parser for formulas in `x`.
pub struct Parser<'a> {
    tokens: Vec<Token>,
    position: usize,
    nesting: usize,
    vocabulary: &'a MathVocabulary,
}

impl<'a> Parser<'a> {
    /// Lexes the input and prepares a parser over its tokens.
    ///
    /// Fails on lexical errors and on input with no tokens at all.
    pub fn new(input: &str, vocabulary: &'a MathVocabulary) -> ParseResult<Self> {
        let tokens = Lexer::new(input, vocabulary).tokenize()?;
        if tokens.len() == 1 {
            return Err(ParseError::Empty);
        }

        Ok(Self {
            tokens: insert_implicit_multiplication(tokens),
            position: 0,
            nesting: 0,
            vocabulary,
        })
    }

    fn current(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn previous(&self) -> Option<&Token> {
        self.position.checked_sub(1).map(|index| &self.tokens[index])
    }

    // Stops on the trailing Eof, which keeps `current` in bounds.
    fn advance(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }

    fn unexpected(&self) -> ParseError {
        let found = self.current();
        match (found, self.previous()) {
            (Token::Eof, Some(previous)) => ParseError::UnexpectedEnd(previous.to_string()),
            (Token::Eof, None) => ParseError::Empty,
            (_, Some(previous)) => ParseError::UnexpectedAfter {
                found: found.to_string(),
                after: previous.to_string(),
            },
            (_, None) => ParseError::UnexpectedToken(found.to_string()),
        }
    }

    fn expect_closing(&mut self) -> ParseResult<()> {
        match self.current() {
            Token::RightParen => {
                self.advance();
                Ok(())
            }
            Token::Eof => Err(ParseError::UnclosedParenthesis),
            _ => Err(self.unexpected()),
        }
    }

    /// Parses the whole formula.
    pub fn parse(&mut self) -> ParseResult<Expr> {
        let tree = self.parse_expression()?;

        match self.current() {
            Token::Eof => Ok(tree),
            Token::RightParen => Err(ParseError::UnmatchedParenthesis),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_expression(&mut self) -> ParseResult<Expr> {
        let first = self.parse_term()?;
        let mut rest = Vec::new();

        while let Some(operator) = additive_operator(self.current()) {
            self.advance();
            rest.push((operator, self.parse_term()?));
        }

        Ok(Expr::chain(first, rest))
    }

    fn parse_term(&mut self) -> ParseResult<Expr> {
        let first = self.parse_unary()?;
        let mut rest = Vec::new();

        while let Some(operator) = multiplicative_operator(self.current()) {
            self.advance();
            rest.push((operator, self.parse_unary()?));
        }

        Ok(Expr::chain(first, rest))
    }

    /// Every recursive path of the grammar passes through here, so this is
    /// where nesting is bounded.
    fn parse_unary(&mut self) -> ParseResult<Expr> {
        self.nesting += 1;
        if self.nesting > MAX_DEPTH {
            return Err(ParseError::TooDeep(MAX_DEPTH));
        }

        let result = match self.current() {
            Token::Plus => {
                self.advance();
                self.parse_unary().map(|operand| Expr::Unary {
                    operator: UnaryOp::Plus,
                    operand: Box::new(operand),
                })
            }
            Token::Minus => {
                self.advance();
                self.parse_unary().map(|operand| Expr::Unary {
                    operator: UnaryOp::Minus,
                    operand: Box::new(operand),
                })
            }
            _ => self.parse_power(),
        };

        self.nesting -= 1;
        result
    }

    /// Right-associative: the exponent is itself a unary expression.
    fn parse_power(&mut self) -> ParseResult<Expr> {
        let base = self.parse_primary()?;

        if *self.current() == Token::Power {
            self.advance();
            let exponent = self.parse_unary()?;
            Ok(Expr::Binary {
                left: Box::new(base),
                operator: BinaryOp::Power,
                right: Box::new(exponent),
            })
        } else {
            Ok(base)
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        match self.current().clone() {
            Token::Number(value) => {
                self.advance();
                Ok(Expr::Number(value))
            }

            Token::Variable => {
                self.advance();
                Ok(Expr::Variable)
            }

            Token::Function(name) => {
                self.advance();
                if *self.current() != Token::LeftParen {
                    return Err(ParseError::MissingArgument(name));
                }
                self.advance();
                let argument = self.parse_expression()?;
                self.expect_closing()?;

                let function = self
                    .vocabulary
                    .function(&name)
                    .ok_or_else(|| ParseError::UnknownIdentifier(name.clone()))?;
                Ok(Expr::Call {
                    name,
                    function,
                    argument: Box::new(argument),
                })
            }

            Token::LeftParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect_closing()?;
                Ok(inner)
            }

            _ => Err(self.unexpected()),
        }
    }
}
