//! Reference workbook loading.
//!
//! The first row of each sheet holds the column names; every following
//! non-blank row is data. Cells are kept as read, column meaning is left to
//! the [`RuleTable`](crate::core::RuleTable).

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{Data, Reader, Sheets, open_workbook_auto, open_workbook_auto_from_rs};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use crate::core::{Cell, PeajesError, ReferenceSheet, ReferenceTables, Table};

/// Load the six reference sheets from a workbook file (xlsx, xls, xlsb, ods).
pub fn load_reference_tables(path: &Path) -> Result<ReferenceTables, PeajesError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| {
        PeajesError::Spreadsheet(format!("cannot open {}: {e}", path.display()))
    })?;
    let tables = load_from_workbook(&mut workbook)?;
    tracing::info!(path = %path.display(), "reference tables loaded");
    Ok(tables)
}

/// Load the reference sheets from an in-memory workbook.
pub fn load_reference_tables_from_bytes(bytes: &[u8]) -> Result<ReferenceTables, PeajesError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| PeajesError::Spreadsheet(format!("cannot open workbook: {e}")))?;
    load_from_workbook(&mut workbook)
}

fn load_from_workbook<RS: Read + Seek>(
    workbook: &mut Sheets<RS>,
) -> Result<ReferenceTables, PeajesError> {
    let available = workbook.sheet_names();

    let mut tables = ReferenceTables::empty();
    for sheet in ReferenceSheet::ALL {
        let name = sheet.sheet_name();
        if !available.iter().any(|s| s == name) {
            return Err(PeajesError::MissingReferenceSheet(name.to_string()));
        }
        let range = workbook
            .worksheet_range(name)
            .map_err(|e| PeajesError::Spreadsheet(format!("cannot read sheet '{name}': {e}")))?;

        let table = table_from_rows(name, range.rows());
        tracing::debug!(sheet = name, columns = table.columns.len(), rows = table.len(), "sheet loaded");
        *tables.get_mut(sheet) = table;
    }
    Ok(tables)
}

fn table_from_rows<'a>(name: &str, mut rows: impl Iterator<Item = &'a [Data]>) -> Table {
    let columns = rows
        .next()
        .map(|header| header.iter().map(column_name).collect())
        .unwrap_or_default();

    let mut table = Table {
        name: name.to_string(),
        columns,
        rows: Vec::new(),
    };
    for row in rows {
        let cells: Vec<Cell> = row.iter().map(cell_from_data).collect();
        if cells.iter().all(|c| *c == Cell::Empty) {
            continue;
        }
        table.push_row(cells);
    }
    table
}

fn column_name(data: &Data) -> String {
    match cell_from_data(data) {
        Cell::Text(s) => s.trim().to_string(),
        Cell::Number(n) => n.normalize().to_string(),
        other => other.to_string(),
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(n) => Cell::Number(Decimal::from(*n)),
        Data::Float(n) => float_cell(*n),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => float_cell(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

fn float_cell(n: f64) -> Cell {
    Decimal::from_f64(n).map_or(Cell::Empty, Cell::Number)
}
