use calcsheet_core::{CellCoord, CellRange};

/// Abstract Syntax Tree for formula expressions
///
/// References hold coordinates only, never the cells themselves, so an
/// expression stays valid when the referenced cell is overwritten:
/// resolution happens at evaluation time against the live sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal
    Number(f64),

    /// Cell reference (e.g., A1)
    CellRef(CellCoord),

    /// Range reference (e.g., A1:B10), normalized top-left to bottom-right
    Range(CellRange),

    /// Aggregate function call with a single argument (e.g., SUM(A1:A10))
    FunctionCall { name: String, arg: Box<Expr> },

    /// Binary arithmetic operation
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl Expr {
    /// Create a binary expression
    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Create a function call expression
    pub fn function(name: impl Into<String>, arg: Expr) -> Self {
        Expr::FunctionCall {
            name: name.into(),
            arg: Box::new(arg),
        }
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
        }
    }
}
