use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use calcsheet_core::CellCoord;
use calcsheet_engine::{Spreadsheet, WriteError};

/// Flat-file persistence failure
#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("cell {coord}: {source}")]
    Cell {
        coord: CellCoord,
        source: WriteError,
    },
}

/// Save the sheet to a semicolon-delimited text file.
///
/// One line per row from row 1 to the last row with a non-empty cell;
/// each line holds raw cell contents up to that row's last non-empty
/// column. Rows with no content are written as blank lines so row
/// numbering survives a reload.
pub fn save(sheet: &Spreadsheet, path: impl AsRef<Path>) -> Result<(), StorageError> {
    // row -> col -> raw content, non-empty cells only
    let mut rows: BTreeMap<u32, BTreeMap<u32, String>> = BTreeMap::new();
    for (coord, content) in sheet.cells() {
        let raw = content.raw_content();
        if !raw.is_empty() {
            rows.entry(coord.row).or_default().insert(coord.col, raw);
        }
    }

    let mut writer = BufWriter::new(File::create(path)?);

    let max_row = rows.keys().next_back().copied().unwrap_or(0);
    for row in 1..=max_row {
        match rows.get(&row).and_then(|cols| {
            cols.keys().next_back().copied().map(|max_col| (cols, max_col))
        }) {
            Some((cols, max_col)) => {
                let fields: Vec<&str> = (1..=max_col)
                    .map(|col| cols.get(&col).map(String::as_str).unwrap_or(""))
                    .collect();
                writeln!(writer, "{}", fields.join(";"))?;
            }
            None => writeln!(writer)?,
        }
    }

    writer.flush()?;
    Ok(())
}

/// Load a sheet from a semicolon-delimited text file.
///
/// Every field, empty ones included, is replayed through
/// `set_cell_content` at its positional coordinate, so formulas are
/// re-parsed and the dependency graph is rebuilt from scratch. Forward
/// references are legal; a field the engine rejects aborts the load
/// naming the offending coordinate.
pub fn load(path: impl AsRef<Path>) -> Result<Spreadsheet, StorageError> {
    let reader = BufReader::new(File::open(path)?);
    let mut sheet = Spreadsheet::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let row = index as u32 + 1;

        for (offset, field) in line.split(';').enumerate() {
            let coord = CellCoord::new(row, offset as u32 + 1);
            sheet
                .set_cell_content(coord, field)
                .map_err(|source| StorageError::Cell { coord, source })?;
        }
    }

    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn coord(notation: &str) -> CellCoord {
        CellCoord::from_a1(notation).unwrap()
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sheet.csheet");

        let mut sheet = Spreadsheet::new();
        sheet.set_cell_content(coord("A1"), "1").unwrap();
        sheet.set_cell_content(coord("C1"), "hello").unwrap();
        sheet.set_cell_content(coord("B2"), "=A1+1").unwrap();
        save(&sheet, &path).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "1;;hello\n;=A1+1\n"
        );

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.raw_content(coord("A1")), "1");
        assert_eq!(loaded.raw_content(coord("C1")), "hello");
        assert_eq!(loaded.raw_content(coord("B2")), "=A1+1");
        assert_eq!(loaded.display_value(coord("B2")), "2");
    }

    #[test]
    fn test_save_load_save_is_byte_identical() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("first.csheet");
        let second = dir.path().join("second.csheet");

        let mut sheet = Spreadsheet::new();
        sheet.set_cell_content(coord("A1"), "2.5").unwrap();
        sheet.set_cell_content(coord("B3"), "=SUM(A1:A2)").unwrap();
        save(&sheet, &first).unwrap();

        let loaded = load(&first).unwrap();
        save(&loaded, &second).unwrap();

        assert_eq!(
            fs::read_to_string(&first).unwrap(),
            fs::read_to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_gap_rows_written_as_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gaps.csheet");

        let mut sheet = Spreadsheet::new();
        sheet.set_cell_content(coord("A1"), "top").unwrap();
        sheet.set_cell_content(coord("A3"), "bottom").unwrap();
        save(&sheet, &path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "top\n\nbottom\n");

        // Row numbering is preserved on reload
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.raw_content(coord("A3")), "bottom");
        assert_eq!(loaded.raw_content(coord("A2")), "");
    }

    #[test]
    fn test_forward_references_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("forward.csheet");

        // B1 references A2, which arrives a row later
        fs::write(&path, ";=A2*2\n10\n").unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.display_value(coord("B1")), "20");
    }

    #[test]
    fn test_rejected_field_names_coordinate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csheet");

        fs::write(&path, "1;=A1+\n").unwrap();

        match load(&path) {
            Err(StorageError::Cell { coord: c, .. }) => assert_eq!(c, coord("B1")),
            other => panic!("expected cell error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_sheet_saves_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csheet");

        save(&Spreadsheet::new(), &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let result = load(dir.path().join("absent.csheet"));
        assert!(matches!(result, Err(StorageError::Io(_))));
    }
}
