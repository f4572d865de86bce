pub mod error;
pub mod range;

pub use error::EvalError;
pub use range::{col_from_label, col_to_label, CellCoord, CellRange};
