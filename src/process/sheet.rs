use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use csv::WriterBuilder;
use std::{fs::File, path::Path};
use tracing::debug;

use crate::process::raw_table::RawTable;

/// Render a cell the way a text-typed read of the sheet would see it.
///
/// Integral floats drop their fractional part so codes stored as numbers
/// (`501.0`) come back as `"501"`.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        other => other.to_string(),
    }
}

/// Every row of the first worksheet of an `.xls`/`.xlsx` workbook.
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.display()))]
pub fn read_first_sheet(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("opening workbook {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("no worksheet in {}", path.display()))?
        .with_context(|| format!("reading first worksheet of {}", path.display()))?;

    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();
    debug!(rows = rows.len(), "worksheet loaded");
    Ok(rows)
}

/// First worksheet as a table whose header is the first row.
pub fn read_sheet_table(path: &Path) -> Result<RawTable> {
    RawTable::from_records(path.display().to_string(), read_first_sheet(path)?, 0, 0)
}

/// Table from a workbook, or from a CSV export of one when `path` ends in `.csv`.
pub fn read_table(path: &Path) -> Result<RawTable> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if is_csv {
        RawTable::from_csv_path(path, 0, 0)
    } else {
        read_sheet_table(path)
    }
}

/// Write rows verbatim as CSV, replacing `dest` if present.
pub fn write_rows_csv(rows: &[Vec<String>], dest: &Path) -> Result<()> {
    let file = File::create(dest).with_context(|| format!("creating {}", dest.display()))?;
    let mut wtr = WriterBuilder::new().flexible(true).from_writer(file);
    for row in rows {
        wtr.write_record(row)
            .with_context(|| format!("writing {}", dest.display()))?;
    }
    wtr.flush()
        .with_context(|| format!("flushing {}", dest.display()))?;
    Ok(())
}

/// Convert the first worksheet of `workbook` into a CSV at `dest`.
pub fn convert_sheet_to_csv(workbook: &Path, dest: &Path) -> Result<usize> {
    let rows = read_first_sheet(workbook)?;
    write_rows_csv(&rows, dest)?;
    Ok(rows.len())
}
