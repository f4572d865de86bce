use calcsheet_core::{CellCoord, CellRange, EvalError};

use crate::ast::{BinaryOp, Expr};
use crate::functions;

/// Numeric view of the cell store, the seam between expression
/// evaluation and the live sheet
pub trait CellResolver {
    /// Numeric value of a cell.
    ///
    /// `Ok(None)` means the cell is absent, empty, or holds empty text;
    /// a direct reference reads it as 0 while a range skips it.
    /// A formula cell re-evaluates its own expression on every call
    /// (there is no cached value).
    fn numeric_value(&self, coord: CellCoord) -> Result<Option<f64>, EvalError>;
}

/// Evaluator for formula AST
pub struct Evaluator<'a, R: CellResolver> {
    cells: &'a R,
}

impl<'a, R: CellResolver> Evaluator<'a, R> {
    pub fn new(cells: &'a R) -> Self {
        Self { cells }
    }

    /// Evaluate an expression AST to a number
    pub fn evaluate(&self, expr: &Expr) -> Result<f64, EvalError> {
        match expr {
            Expr::Number(n) => Ok(*n),

            // An absent or empty cell reads as 0
            Expr::CellRef(coord) => Ok(self.cells.numeric_value(*coord)?.unwrap_or(0.0)),

            // A bare range used as an operand reduces to the sum of its values
            Expr::Range(range) => Ok(functions::sum(&self.range_values(*range))),

            Expr::FunctionCall { name, arg } => {
                let values = self.argument_values(arg)?;
                functions::apply(name, &values)
            }

            Expr::Binary { left, op, right } => self.evaluate_binary(left, *op, right),
        }
    }

    /// Collect the numeric values of a range, row-major.
    ///
    /// Cells whose value cannot be read as a number (non-numeric text,
    /// failing formulas) are silently skipped, unlike direct references.
    pub fn range_values(&self, range: CellRange) -> Vec<f64> {
        let mut values = Vec::new();

        for coord in range.iter() {
            if let Ok(Some(n)) = self.cells.numeric_value(coord) {
                values.push(n);
            }
        }

        values
    }

    /// A range argument contributes all its values; any other argument
    /// is a one-element set
    fn argument_values(&self, arg: &Expr) -> Result<Vec<f64>, EvalError> {
        match arg {
            Expr::Range(range) => Ok(self.range_values(*range)),
            _ => Ok(vec![self.evaluate(arg)?]),
        }
    }

    fn evaluate_binary(&self, left: &Expr, op: BinaryOp, right: &Expr) -> Result<f64, EvalError> {
        let l = self.evaluate(left)?;
        let r = self.evaluate(right)?;

        match op {
            BinaryOp::Add => Ok(l + r),
            BinaryOp::Sub => Ok(l - r),
            BinaryOp::Mul => Ok(l * r),
            BinaryOp::Div => {
                if r == 0.0 {
                    Err(EvalError::DivisionByZero)
                } else {
                    Ok(l / r)
                }
            }
        }
    }
}
