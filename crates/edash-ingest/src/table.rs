//! Row / table representation shared by every ingestion path

use edash_core::types::EmptyCell;
use serde_json::Value;
use std::collections::HashSet;

/// One record keyed by header name, in column order.
pub type Row = serde_json::Map<String, Value>;

/// Ordered rows of one sheet or file.
pub type Table = Vec<Row>;

/// Header used for blank header cells (`__EMPTY`, `__EMPTY_1`, ...)
pub const EMPTY_HEADER: &str = "__EMPTY";

/// Options applied identically by workbook, delimited and URL ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOptions {
    /// Value written for empty cells
    pub empty_cell: Value,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            empty_cell: Value::Null,
        }
    }
}

impl IngestOptions {
    pub fn from_config(empty_cell: EmptyCell) -> Self {
        let empty_cell = match empty_cell {
            EmptyCell::Null => Value::Null,
            EmptyCell::EmptyString => Value::String(String::new()),
        };
        Self { empty_cell }
    }
}

pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Make header names unique: blanks become `__EMPTY`, repeats get `_1`, `_2`, ...
pub(crate) fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut out = Vec::with_capacity(raw.len());

    for header in raw {
        let base = if header.is_empty() {
            EMPTY_HEADER.to_string()
        } else {
            header
        };

        let mut name = base.clone();
        let mut n = 0;
        while used.contains(&name) {
            n += 1;
            name = format!("{base}_{n}");
        }
        used.insert(name.clone());
        out.push(name);
    }
    out
}

/// Build a row from positional cells. Fully blank rows yield `None`.
pub(crate) fn build_row(headers: &[String], cells: Vec<Value>, opts: &IngestOptions) -> Option<Row> {
    if cells.iter().all(is_blank) {
        return None;
    }

    let mut cells = cells.into_iter();
    let mut row = Row::new();
    for header in headers {
        let value = match cells.next() {
            Some(v) if !is_blank(&v) => v,
            _ => opts.empty_cell.clone(),
        };
        row.insert(header.clone(), value);
    }
    Some(row)
}
