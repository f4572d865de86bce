use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use calcsheet_core::{CellCoord, EvalError};

use crate::content::{format_number, Content};
use crate::dependency::{CircularDependency, DependencyGraph};
use crate::evaluator::{CellResolver, Evaluator};
use crate::parser::ParseError;
use crate::referenced_cells;

/// A rejected write: either the input did not parse as a formula, or
/// installing it would create a dependency cycle. Rejection is atomic;
/// neither cell content nor edges are touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WriteError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Cycle(#[from] CircularDependency),
}

/// The spreadsheet orchestrator: owns the cell store and the dependency
/// graph, classifies input, and drives recalculation.
///
/// Single-owner and synchronous; every write runs classification,
/// cycle checking and recalculation to completion before returning.
#[derive(Debug, Default)]
pub struct Spreadsheet {
    cells: BTreeMap<CellCoord, Content>,
    graph: DependencyGraph,
}

impl Spreadsheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell from raw user input and recalculate everything
    /// affected.
    ///
    /// Returns the written cell followed by its transitive dependents
    /// in recalculation order. A parse failure or a would-be cycle
    /// rejects the write with the previous content and edges intact.
    pub fn set_cell_content(
        &mut self,
        coord: CellCoord,
        raw: &str,
    ) -> Result<Vec<CellCoord>, WriteError> {
        let content = Content::classify(raw)?;

        let refs = match content.formula_expr() {
            Some(expr) => referenced_cells(expr),
            None => BTreeSet::new(),
        };

        // Checked against the pre-write graph, before any edge moves
        if self.graph.would_create_cycle(coord, &refs) {
            return Err(CircularDependency { cell: coord }.into());
        }

        self.graph.clear_dependencies(coord);
        for &dep in &refs {
            self.graph.add_dependency(coord, dep);
        }
        self.cells.insert(coord, content);

        let mut affected = self.graph.all_dependents(coord);
        affected.insert(coord);
        let order = self.graph.calculation_order(&affected)?;

        self.recalculate(&order);
        Ok(order)
    }

    /// Re-evaluate every formula cell in the sheet, dependencies first
    pub fn calculate_all(&self) -> Result<Vec<CellCoord>, CircularDependency> {
        let formulas: BTreeSet<CellCoord> = self
            .cells
            .iter()
            .filter(|(_, content)| content.is_formula())
            .map(|(&coord, _)| coord)
            .collect();

        let order = self.graph.calculation_order(&formulas)?;
        self.recalculate(&order);
        Ok(order)
    }

    /// Force re-evaluation of the formula cells in `order`.
    ///
    /// Values are not memoized, so this only surfaces evaluation-time
    /// errors; per-cell failures degrade to error markers on display
    /// and never abort the pass.
    fn recalculate(&self, order: &[CellCoord]) {
        for &cell in order {
            if let Some(Content::Formula { expr, .. }) = self.cells.get(&cell) {
                let _ = Evaluator::new(self).evaluate(expr);
            }
        }
    }

    /// The evaluated value, string-rendered; a failing formula shows
    /// its error marker instead
    pub fn display_value(&self, coord: CellCoord) -> String {
        match self.cells.get(&coord) {
            None | Some(Content::Empty) => String::new(),
            Some(Content::Text(s)) => s.clone(),
            Some(Content::Number(n)) => format_number(*n),
            Some(Content::Formula { expr, .. }) => match Evaluator::new(self).evaluate(expr) {
                Ok(value) => format_number(value),
                Err(err) => err.marker().to_string(),
            },
        }
    }

    /// The original, re-editable representation of a cell
    pub fn raw_content(&self, coord: CellCoord) -> String {
        self.cells
            .get(&coord)
            .map(Content::raw_content)
            .unwrap_or_default()
    }

    /// The stored content of a cell, if any
    pub fn content(&self, coord: CellCoord) -> Option<&Content> {
        self.cells.get(&coord)
    }

    /// Iterate over all stored cells in coordinate order
    pub fn cells(&self) -> impl Iterator<Item = (CellCoord, &Content)> {
        self.cells.iter().map(|(&coord, content)| (coord, content))
    }

    /// Check if the sheet has no stored cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Copy of a cell's direct dependencies (cells its formula reads)
    pub fn dependencies_of(&self, coord: CellCoord) -> BTreeSet<CellCoord> {
        self.graph.dependencies_of(coord)
    }

    /// Copy of a cell's direct dependents
    pub fn dependents_of(&self, coord: CellCoord) -> BTreeSet<CellCoord> {
        self.graph.dependents_of(coord)
    }

    /// Clear all cells and the dependency graph
    pub fn reset(&mut self) {
        self.cells.clear();
        self.graph.reset();
    }
}

impl CellResolver for Spreadsheet {
    fn numeric_value(&self, coord: CellCoord) -> Result<Option<f64>, EvalError> {
        match self.cells.get(&coord) {
            None | Some(Content::Empty) => Ok(None),
            Some(Content::Number(n)) => Ok(Some(*n)),
            Some(Content::Text(s)) => {
                if s.trim().is_empty() {
                    return Ok(None);
                }
                s.trim()
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| EvalError::NonNumericReference {
                        coord,
                        text: s.clone(),
                    })
            }
            // Re-entrant: a referenced formula evaluates its own
            // expression first, every call recomputes
            Some(Content::Formula { expr, .. }) => {
                Evaluator::new(self).evaluate(expr).map(Some)
            }
        }
    }
}
