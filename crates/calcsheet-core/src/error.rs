use thiserror::Error;

use crate::range::CellCoord;

/// Errors that can occur while evaluating a formula expression.
///
/// These never abort a recalculation pass: a failing formula cell shows
/// its error marker while unrelated cells keep evaluating.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("cell {coord} contains non-numeric value: {text}")]
    NonNumericReference { coord: CellCoord, text: String },

    #[error("unknown function: {name}")]
    UnknownFunction { name: String },
}

impl EvalError {
    /// Excel-compatible error marker shown as the cell's display value
    pub fn marker(&self) -> &'static str {
        match self {
            EvalError::DivisionByZero => "#DIV/0!",
            EvalError::NonNumericReference { .. } => "#VALUE!",
            EvalError::UnknownFunction { .. } => "#NAME?",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers() {
        assert_eq!(EvalError::DivisionByZero.marker(), "#DIV/0!");
        assert_eq!(
            EvalError::NonNumericReference {
                coord: CellCoord::new(1, 1),
                text: "hello".to_string(),
            }
            .marker(),
            "#VALUE!"
        );
        assert_eq!(
            EvalError::UnknownFunction {
                name: "FOO".to_string(),
            }
            .marker(),
            "#NAME?"
        );
    }

    #[test]
    fn test_messages_name_the_cell() {
        let err = EvalError::NonNumericReference {
            coord: CellCoord::new(2, 1),
            text: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "cell A2 contains non-numeric value: abc");
    }
}
