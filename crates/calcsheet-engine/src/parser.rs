use std::fmt;

use thiserror::Error;

use calcsheet_core::{col_from_label, CellCoord, CellRange};

use crate::ast::{BinaryOp, Expr};

/// Formula parse failure, carrying the offending character offset
/// (counted from the start of the formula text, '=' included)
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at position {position}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: usize,
}

/// What went wrong while parsing a formula
#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    MissingEquals,
    UnexpectedEnd,
    UnexpectedChar(char),
    UnterminatedParen,
    InvalidNumber(String),
    InvalidCellReference(String),
    TrailingInput,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::MissingEquals => write!(f, "formula must start with '='"),
            ParseErrorKind::UnexpectedEnd => write!(f, "unexpected end of formula"),
            ParseErrorKind::UnexpectedChar(c) => write!(f, "unexpected character '{}'", c),
            ParseErrorKind::UnterminatedParen => write!(f, "missing closing parenthesis"),
            ParseErrorKind::InvalidNumber(s) => write!(f, "invalid number '{}'", s),
            ParseErrorKind::InvalidCellReference(s) => {
                write!(f, "invalid cell reference '{}'", s)
            }
            ParseErrorKind::TrailingInput => {
                write!(f, "unexpected characters after formula")
            }
        }
    }
}

/// Recursive-descent parser for formula strings
///
/// Grammar (left-associative, standard precedence):
/// ```text
/// Formula    -> '=' Expression
/// Expression -> Term (('+' | '-') Term)*
/// Term       -> Factor (('*' | '/') Factor)*
/// Factor     -> Number | CellOrFunction | '(' Expression ')'
/// ```
pub struct Parser {
    input: Vec<char>,
    position: usize,
}

impl Parser {
    pub fn new(formula: &str) -> Self {
        Self {
            input: formula.chars().collect(),
            position: 0,
        }
    }

    /// Parse the formula into an AST, consuming the entire input
    pub fn parse(mut self) -> Result<Expr, ParseError> {
        if self.peek() != Some('=') {
            return self.error(ParseErrorKind::MissingEquals);
        }
        self.position = 1; // Skip '='

        let expr = self.parse_expression()?;

        self.skip_whitespace();
        if self.position < self.input.len() {
            return self.error(ParseErrorKind::TrailingInput);
        }

        Ok(expr)
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.position += 1;
        }
    }

    fn error<T>(&self, kind: ParseErrorKind) -> Result<T, ParseError> {
        Err(ParseError {
            kind,
            position: self.position,
        })
    }

    /// Expression -> Term (('+' | '-') Term)*
    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_term()?;

        loop {
            self.skip_whitespace();
            let op = match self.peek() {
                Some('+') => BinaryOp::Add,
                Some('-') => BinaryOp::Sub,
                _ => break,
            };

            self.position += 1;
            let right = self.parse_term()?;
            left = Expr::binary(left, op, right);
        }

        Ok(left)
    }

    /// Term -> Factor (('*' | '/') Factor)*
    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_factor()?;

        loop {
            self.skip_whitespace();
            let op = match self.peek() {
                Some('*') => BinaryOp::Mul,
                Some('/') => BinaryOp::Div,
                _ => break,
            };

            self.position += 1;
            let right = self.parse_factor()?;
            left = Expr::binary(left, op, right);
        }

        Ok(left)
    }

    /// Factor -> Number | CellOrFunction | '(' Expression ')'
    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        self.skip_whitespace();

        let c = match self.peek() {
            Some(c) => c,
            None => return self.error(ParseErrorKind::UnexpectedEnd),
        };

        if c == '(' {
            self.position += 1;
            let expr = self.parse_expression()?;
            self.skip_whitespace();
            if self.peek() != Some(')') {
                return self.error(ParseErrorKind::UnterminatedParen);
            }
            self.position += 1;
            return Ok(expr);
        }

        if c.is_ascii_digit() {
            return self.parse_number();
        }

        if c.is_ascii_alphabetic() {
            return self.parse_cell_or_function();
        }

        self.error(ParseErrorKind::UnexpectedChar(c))
    }

    /// Parse a decimal literal: digits and at most one decimal point,
    /// no sign, no exponent
    fn parse_number(&mut self) -> Result<Expr, ParseError> {
        let start = self.position;

        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '.') {
            self.position += 1;
        }

        let text: String = self.input[start..self.position].iter().collect();
        match text.parse::<f64>() {
            Ok(n) if text.chars().filter(|&c| c == '.').count() <= 1 => Ok(Expr::Number(n)),
            _ => Err(ParseError {
                kind: ParseErrorKind::InvalidNumber(text),
                position: start,
            }),
        }
    }

    /// An identifier followed by '(' is a function call; otherwise it is
    /// the column half of a cell coordinate, possibly the start of a range
    fn parse_cell_or_function(&mut self) -> Result<Expr, ParseError> {
        let start = self.position;

        let mut letters = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphabetic() {
                letters.push(c.to_ascii_uppercase());
                self.position += 1;
            } else {
                break;
            }
        }

        if self.peek() == Some('(') {
            return self.parse_function(letters);
        }

        // Cell coordinate: the row digits must follow the letters directly
        let digit_start = self.position;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.position += 1;
        }

        if digit_start == self.position {
            return Err(ParseError {
                kind: ParseErrorKind::InvalidCellReference(letters),
                position: start,
            });
        }

        let row_text: String = self.input[digit_start..self.position].iter().collect();
        let coord = coordinate_from_parts(&letters, &row_text).ok_or(ParseError {
            kind: ParseErrorKind::InvalidCellReference(format!("{}{}", letters, row_text)),
            position: start,
        })?;

        // A ':' after a bare coordinate makes it a range operand
        self.skip_whitespace();
        if self.peek() == Some(':') {
            self.position += 1;
            self.skip_whitespace();
            let end = self.parse_coordinate()?;
            return Ok(Expr::Range(CellRange::new(coord, end)));
        }

        Ok(Expr::CellRef(coord))
    }

    /// Function -> Name '(' Argument ')'
    fn parse_function(&mut self, name: String) -> Result<Expr, ParseError> {
        self.position += 1; // Skip '('
        self.skip_whitespace();

        let argument = self.parse_function_argument()?;

        self.skip_whitespace();
        if self.peek() != Some(')') {
            return self.error(ParseErrorKind::UnterminatedParen);
        }
        self.position += 1;

        Ok(Expr::function(name, argument))
    }

    /// Argument -> CellCoord ':' CellCoord | Expression
    fn parse_function_argument(&mut self) -> Result<Expr, ParseError> {
        if let Some(range) = self.try_parse_range() {
            return Ok(Expr::Range(range));
        }
        self.parse_expression()
    }

    /// Lookahead for a range argument; restores the position and returns
    /// None when the input is not of the form coord ':' coord
    fn try_parse_range(&mut self) -> Option<CellRange> {
        let saved = self.position;

        let start = match self.parse_coordinate() {
            Ok(coord) => coord,
            Err(_) => {
                self.position = saved;
                return None;
            }
        };

        self.skip_whitespace();
        if self.peek() != Some(':') {
            self.position = saved;
            return None;
        }
        self.position += 1;
        self.skip_whitespace();

        match self.parse_coordinate() {
            Ok(end) => Some(CellRange::new(start, end)),
            Err(_) => {
                self.position = saved;
                None
            }
        }
    }

    /// Parse a bare cell coordinate (e.g., "A1", "AA27")
    fn parse_coordinate(&mut self) -> Result<CellCoord, ParseError> {
        let start = self.position;

        let mut letters = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphabetic() {
                letters.push(c.to_ascii_uppercase());
                self.position += 1;
            } else {
                break;
            }
        }

        let digit_start = self.position;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.position += 1;
        }

        let row_text: String = self.input[digit_start..self.position].iter().collect();
        if letters.is_empty() || row_text.is_empty() {
            return Err(ParseError {
                kind: ParseErrorKind::InvalidCellReference(letters),
                position: start,
            });
        }

        coordinate_from_parts(&letters, &row_text).ok_or(ParseError {
            kind: ParseErrorKind::InvalidCellReference(format!("{}{}", letters, row_text)),
            position: start,
        })
    }
}

fn coordinate_from_parts(letters: &str, row_text: &str) -> Option<CellCoord> {
    let col = col_from_label(letters)?;
    let row: u32 = row_text.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some(CellCoord::new(row, col))
}
