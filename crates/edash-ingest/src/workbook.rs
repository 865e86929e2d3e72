//! Spreadsheet workbooks → header-keyed tables
//!
//! Format detection (xls / xlsx / xlsm / xlsb / ods) is left to calamine.
//! The first row of each sheet's used range is the header row.

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use serde_json::{Number, Value};
use std::io::Cursor;
use tracing::debug;

use crate::error::{IngestError, IngestResult};
use crate::table::{build_row, normalize_headers, IngestOptions, Table};

/// One worksheet's rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Table,
}

/// All sheets of a workbook, in workbook order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Table> {
        self.sheets.iter().find(|s| s.name == name).map(|s| &s.rows)
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }
}

/// Parse workbook bytes into one table per sheet.
pub fn workbook_to_tables(bytes: &[u8], opts: &IngestOptions) -> IngestResult<Workbook> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| IngestError::Workbook(format!("cannot open workbook: {e}")))?;

    let sheet_names = workbook.sheet_names().to_owned();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for name in sheet_names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| IngestError::Workbook(format!("sheet '{name}': {e}")))?;
        let rows = range_to_rows(&range, opts);
        debug!(sheet = %name, rows = rows.len(), "parsed sheet");
        sheets.push(Sheet { name, rows });
    }

    Ok(Workbook { sheets })
}

fn range_to_rows(range: &Range<Data>, opts: &IngestOptions) -> Table {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Table::new();
    };

    let headers = normalize_headers(header.iter().map(header_text).collect());
    rows.filter_map(|cells| build_row(&headers, cells.iter().map(convert_cell).collect(), opts))
        .collect()
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn convert_cell(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::Bool(b) => Value::Bool(*b),
        Data::Int(i) => Value::Number((*i).into()),
        Data::Float(f) => float_value(*f),
        Data::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    }
}

/// Spreadsheets store every number as a float; keep integral ones integral.
fn float_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        return Value::Number((f as i64).into());
    }
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}
