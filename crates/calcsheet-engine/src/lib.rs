pub mod ast;
pub mod content;
pub mod dependency;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod spreadsheet;

pub use ast::{BinaryOp, Expr};
pub use content::Content;
pub use dependency::{CircularDependency, DependencyGraph};
pub use evaluator::{CellResolver, Evaluator};
pub use parser::{ParseError, ParseErrorKind, Parser};
pub use spreadsheet::{Spreadsheet, WriteError};

use std::collections::BTreeSet;

use calcsheet_core::CellCoord;

/// Collect every cell coordinate a formula expression references.
///
/// A cell reference contributes itself, a range contributes every
/// coordinate in its rectangle, operators and function calls recurse
/// into their operands.
pub fn referenced_cells(expr: &Expr) -> BTreeSet<CellCoord> {
    let mut refs = BTreeSet::new();
    collect_references(expr, &mut refs);
    refs
}

fn collect_references(expr: &Expr, refs: &mut BTreeSet<CellCoord>) {
    match expr {
        Expr::Number(_) => {}
        Expr::CellRef(coord) => {
            refs.insert(*coord);
        }
        Expr::Range(range) => {
            refs.extend(range.iter());
        }
        Expr::FunctionCall { arg, .. } => {
            collect_references(arg, refs);
        }
        Expr::Binary { left, right, .. } => {
            collect_references(left, refs);
            collect_references(right, refs);
        }
    }
}
