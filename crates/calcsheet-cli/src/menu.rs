use std::io::{self, BufRead, Write};

use calcsheet_core::CellCoord;
use calcsheet_engine::Spreadsheet;

use crate::{grid, storage};

/// Run the interactive menu loop over the given handles until the user
/// exits or input ends.
///
/// Per-operation failures are printed and never terminate the loop.
pub fn run<R: BufRead, W: Write>(
    sheet: &mut Spreadsheet,
    mut input: R,
    mut output: W,
) -> io::Result<()> {
    loop {
        writeln!(output)?;
        writeln!(output, "=== CalcSheet ===")?;
        writeln!(output, "1. Set cell")?;
        writeln!(output, "2. View cell")?;
        writeln!(output, "3. View spreadsheet grid")?;
        writeln!(output, "4. Save spreadsheet")?;
        writeln!(output, "5. Load spreadsheet")?;
        writeln!(output, "6. Create new spreadsheet")?;
        writeln!(output, "7. Exit")?;

        let choice = match prompt(&mut input, &mut output, "Choose: ")? {
            Some(line) => line,
            None => return Ok(()),
        };

        match choice.trim() {
            "1" => set_cell(sheet, &mut input, &mut output)?,
            "2" => view_cell(sheet, &mut input, &mut output)?,
            "3" => write!(output, "{}", grid::render(sheet))?,
            "4" => save(sheet, &mut input, &mut output)?,
            "5" => load(sheet, &mut input, &mut output)?,
            "6" => create_new(sheet, &mut input, &mut output)?,
            "7" => return Ok(()),
            _ => writeln!(output, "Invalid option")?,
        }
    }
}

/// Write a prompt and read one line; None means end of input
fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    message: &str,
) -> io::Result<Option<String>> {
    write!(output, "{}", message)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn read_coord<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> io::Result<Option<CellCoord>> {
    let text = match prompt(input, output, "Cell (e.g. A1): ")? {
        Some(text) => text,
        None => return Ok(None),
    };

    match CellCoord::from_a1(&text) {
        Some(coord) => Ok(Some(coord)),
        None => {
            writeln!(output, "Invalid coordinate: {}", text.trim())?;
            Ok(None)
        }
    }
}

fn set_cell<R: BufRead, W: Write>(
    sheet: &mut Spreadsheet,
    input: &mut R,
    output: &mut W,
) -> io::Result<()> {
    let coord = match read_coord(input, output)? {
        Some(coord) => coord,
        None => return Ok(()),
    };

    let content = match prompt(
        input,
        output,
        "Content (text, number, or formula starting with =): ",
    )? {
        Some(content) => content,
        None => return Ok(()),
    };

    match sheet.set_cell_content(coord, &content) {
        Ok(_) => {
            writeln!(output, "Cell {} set successfully", coord)?;
            writeln!(output, "Evaluated value: {}", sheet.display_value(coord))?;
        }
        Err(err) => writeln!(output, "ERROR: {}", err)?,
    }
    Ok(())
}

fn view_cell<R: BufRead, W: Write>(
    sheet: &Spreadsheet,
    input: &mut R,
    output: &mut W,
) -> io::Result<()> {
    let coord = match read_coord(input, output)? {
        Some(coord) => coord,
        None => return Ok(()),
    };

    writeln!(output)?;
    writeln!(output, "--- Cell {} ---", coord)?;
    writeln!(output, "Raw content: {}", sheet.raw_content(coord))?;
    writeln!(output, "Evaluated value: {}", sheet.display_value(coord))?;
    Ok(())
}

fn save<R: BufRead, W: Write>(
    sheet: &Spreadsheet,
    input: &mut R,
    output: &mut W,
) -> io::Result<()> {
    let path = match prompt(input, output, "File path: ")? {
        Some(path) => path,
        None => return Ok(()),
    };

    match storage::save(sheet, &path) {
        Ok(()) => writeln!(output, "Saved!")?,
        Err(err) => writeln!(output, "ERROR: {}", err)?,
    }
    Ok(())
}

fn load<R: BufRead, W: Write>(
    sheet: &mut Spreadsheet,
    input: &mut R,
    output: &mut W,
) -> io::Result<()> {
    let path = match prompt(input, output, "File path: ")? {
        Some(path) => path,
        None => return Ok(()),
    };

    // The working sheet is only replaced on success
    match storage::load(&path) {
        Ok(loaded) => {
            *sheet = loaded;
            writeln!(output, "Loaded successfully!")?;
        }
        Err(err) => writeln!(output, "ERROR: {}", err)?,
    }
    Ok(())
}

fn create_new<R: BufRead, W: Write>(
    sheet: &mut Spreadsheet,
    input: &mut R,
    output: &mut W,
) -> io::Result<()> {
    let confirm = match prompt(
        input,
        output,
        "Are you sure? This will clear all data (y/n): ",
    )? {
        Some(confirm) => confirm,
        None => return Ok(()),
    };

    if confirm.trim().eq_ignore_ascii_case("y") {
        sheet.reset();
        writeln!(output, "New spreadsheet created")?;
    }
    Ok(())
}
