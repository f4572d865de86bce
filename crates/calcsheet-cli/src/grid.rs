use std::fmt::Write;

use calcsheet_core::{col_to_label, CellCoord};
use calcsheet_engine::Spreadsheet;

/// Field width for column headers and cell values
const CELL_WIDTH: usize = 15;

/// Render the sheet as a text grid.
///
/// Bounds are the maximum row and column over all stored cells; absent
/// cells render as blank fields. Display values wider than the field
/// are truncated with an ellipsis.
pub fn render(sheet: &Spreadsheet) -> String {
    let mut max_row = 0;
    let mut max_col = 0;
    for (coord, _) in sheet.cells() {
        max_row = max_row.max(coord.row);
        max_col = max_col.max(coord.col);
    }

    if max_row == 0 {
        return "Spreadsheet is empty\n".to_string();
    }

    let mut out = String::new();

    // Column headers
    out.push_str("     ");
    for col in 1..=max_col {
        let _ = write!(out, "{:<width$} ", col_to_label(col), width = CELL_WIDTH);
    }
    out.push('\n');
    out.push_str("     ");
    for _ in 1..=max_col {
        let _ = write!(out, "{} ", "-".repeat(CELL_WIDTH));
    }
    out.push('\n');

    for row in 1..=max_row {
        let _ = write!(out, "{:<4}|", row);
        for col in 1..=max_col {
            let value = sheet.display_value(CellCoord::new(row, col));
            let _ = write!(out, "{:<width$} ", truncate(&value), width = CELL_WIDTH);
        }
        out.push('\n');
    }

    out
}

fn truncate(value: &str) -> String {
    if value.chars().count() > CELL_WIDTH - 1 {
        let head: String = value.chars().take(CELL_WIDTH - 4).collect();
        format!("{}...", head)
    } else {
        value.to_string()
    }
}
