use calamine::{open_workbook_auto, Data, Reader};
use std::fmt;
use std::path::Path;

use crate::error::LoadError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_cell(cell: &Data) -> Option<Self> {
        let text = match cell {
            Data::Empty => return None,
            Data::Int(n) => n.to_string(),
            Data::Float(f) => format_number(*f),
            Data::String(s) => s.trim().to_string(),
            other => other.to_string(),
        };

        if text.is_empty() {
            None
        } else {
            Some(Self(text))
        }
    }

    fn from_text(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(Self(text.to_string()))
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Spreadsheets store every number as a float.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Anything that isn't `.csv` goes through calamine's format detection.
pub fn load_identifiers(
    path: &Path,
    column: &str,
    sheet: Option<&str>,
) -> Result<Vec<Identifier>, LoadError> {
    if !path.is_file() {
        return Err(LoadError::Missing {
            path: path.to_path_buf(),
        });
    }

    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let values = if is_csv {
        load_from_csv(path, column)?
    } else {
        load_from_workbook(path, column, sheet)?
    };

    if !values.blank_rows.is_empty() {
        log::info!(
            "Skipped {} blank '{}' cells (rows {:?})",
            values.blank_rows.len(),
            column,
            values.blank_rows
        );
    }
    log::info!(
        "Loaded {} identifiers from column '{}' of {:?}",
        values.ids.len(),
        column,
        path
    );
    Ok(values.ids)
}

// Row numbers are 1-based sheet rows, header included.
#[derive(Debug, Default)]
struct ColumnValues {
    ids: Vec<Identifier>,
    blank_rows: Vec<usize>,
}

impl ColumnValues {
    fn push(&mut self, row: usize, id: Option<Identifier>) {
        match id {
            Some(id) => self.ids.push(id),
            None => {
                log::debug!("Skipping blank identifier cell in row {}", row);
                self.blank_rows.push(row);
            }
        }
    }
}

fn find_column<'a>(
    path: &Path,
    column: &str,
    headers: impl Iterator<Item = &'a str>,
) -> Result<usize, LoadError> {
    headers
        .map(str::trim)
        .position(|name| name == column)
        .ok_or_else(|| LoadError::ColumnMissing {
            path: path.to_path_buf(),
            column: column.to_string(),
        })
}

fn load_from_workbook(
    path: &Path,
    column: &str,
    sheet: Option<&str>,
) -> Result<ColumnValues, LoadError> {
    let spreadsheet_error = |source| LoadError::Spreadsheet {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = open_workbook_auto(path).map_err(spreadsheet_error)?;

    let range = match sheet {
        Some(name) => {
            if !workbook.sheet_names().iter().any(|s| s == name) {
                return Err(LoadError::SheetMissing {
                    path: path.to_path_buf(),
                    sheet: name.to_string(),
                });
            }
            workbook.worksheet_range(name).map_err(spreadsheet_error)?
        }
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| LoadError::Empty {
                path: path.to_path_buf(),
            })?
            .map_err(spreadsheet_error)?,
    };

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .ok_or_else(|| LoadError::Empty {
            path: path.to_path_buf(),
        })?
        .iter()
        .map(|cell| cell.to_string())
        .collect();

    let idx = find_column(path, column, header.iter().map(String::as_str))?;

    let mut values = ColumnValues::default();
    for (i, row) in rows.enumerate() {
        values.push(i + 2, row.get(idx).and_then(Identifier::from_cell));
    }
    Ok(values)
}

fn load_from_csv(path: &Path, column: &str) -> Result<ColumnValues, LoadError> {
    let csv_error = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let headers = reader.headers().map_err(csv_error)?.clone();
    if headers.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }
    let idx = find_column(path, column, headers.iter())?;

    let mut values = ColumnValues::default();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let row = record.position().map_or(0, |pos| pos.line() as usize);
        values.push(row, record.get(idx).and_then(Identifier::from_text));
    }
    Ok(values)
}
