//! Capacity CSV: installed capacity (MW) and yearly volume (MJ) per technology
//!
//! Layout, as exported by the source spreadsheet tool:
//! ```text
//! index,0,1,...            ┐
//! name,<scenario>,...      │ five metadata rows, one value per
//! type,<type>,...          │ scenario column
//! year,2030,...            │
//! id,<column id>,...       ┘
//! <technology>,"""150,300000""",...   one row per technology
//! ```
//! Cells hold a `{capacity,volume}` pair inside quoted fields with doubled or
//! tripled quotes, so lines are split with a quote-aware scanner rather than
//! the csv reader.

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{IngestError, IngestResult};
use crate::table::Table;

const METADATA_ROWS: usize = 5;
const SECONDS_PER_HOUR: f64 = 3600.0;

/// Capacity / volume pair from one cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CapacityEntry {
    /// Installed capacity in MW
    pub capacity: f64,
    /// Yearly volume in MJ
    pub volume: f64,
}

impl CapacityEntry {
    /// `volume / (capacity * 3600)`, or 0 unless both are strictly positive.
    pub fn full_load_hours(&self) -> f64 {
        if self.capacity > 0.0 && self.volume > 0.0 {
            self.volume / (self.capacity * SECONDS_PER_HOUR)
        } else {
            0.0
        }
    }
}

/// One scenario column described by the metadata rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioColumn {
    pub index: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub year: String,
    pub id: String,
}

/// One technology and its value per scenario column (`None` if unparseable).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnologyRow {
    pub key: String,
    pub values: Vec<Option<CapacityEntry>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CapacityTable {
    pub columns: Vec<ScenarioColumn>,
    pub technologies: Vec<TechnologyRow>,
}

impl CapacityTable {
    pub fn column_index(&self, id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id == id)
    }

    pub fn value(&self, technology: &str, column_id: &str) -> Option<&CapacityEntry> {
        let col = self.column_index(column_id)?;
        self.technologies
            .iter()
            .find(|t| t.key == technology)?
            .values
            .get(col)?
            .as_ref()
    }

    /// Long-format rows (`technology, id, name, type, year, capacity, volume,
    /// fullLoadHours`), one per parseable cell, for chart consumers.
    pub fn to_rows(&self) -> Table {
        let mut rows = Table::new();
        for tech in &self.technologies {
            for (column, value) in self.columns.iter().zip(&tech.values) {
                let Some(entry) = value else { continue };
                let row = json!({
                    "technology": tech.key,
                    "id": column.id,
                    "name": column.name,
                    "type": column.kind,
                    "year": column.year,
                    "capacity": entry.capacity,
                    "volume": entry.volume,
                    "fullLoadHours": entry.full_load_hours(),
                });
                if let Value::Object(map) = row {
                    rows.push(map);
                }
            }
        }
        rows
    }
}

/// Split one line on commas outside quotes. Every `"` toggles the quoted
/// state, which handles doubled and tripled quotes as long as they pair up.
/// Quote characters are kept in the fields.
pub fn split_quoted_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Decode a `{capacity,volume}` cell: strip `"`, `{`, `}`, split on commas,
/// parse the first two numbers. Trailing parts are ignored.
pub fn parse_capacity_pair(cell: &str) -> Option<CapacityEntry> {
    let cleaned: String = cell
        .chars()
        .filter(|c| !matches!(c, '"' | '{' | '}'))
        .collect();

    let mut parts = cleaned.split(',');
    let capacity = parts.next()?.trim().parse::<f64>().ok()?;
    let volume = parts.next()?.trim().parse::<f64>().ok()?;
    if !capacity.is_finite() || !volume.is_finite() {
        return None;
    }

    Some(CapacityEntry { capacity, volume })
}

fn unquote(field: &str) -> String {
    field.trim().trim_matches('"').replace("\"\"", "\"")
}

/// Parse the whole capacity CSV.
pub fn parse_capacity_csv(text: &str) -> IngestResult<CapacityTable> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let lines: Vec<&str> = text
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.len() < METADATA_ROWS {
        return Err(IngestError::Format(format!(
            "capacity CSV needs {METADATA_ROWS} metadata rows, found {} lines",
            lines.len()
        )));
    }

    let meta: Vec<Vec<String>> = lines[..METADATA_ROWS]
        .iter()
        .map(|l| split_quoted_line(l).iter().map(|f| unquote(f)).collect())
        .collect();

    // First field of each metadata row is its label.
    let width = meta.iter().map(|r| r.len()).max().unwrap_or(0).saturating_sub(1);
    let cell = |row: usize, col: usize| meta[row].get(col + 1).cloned().unwrap_or_default();
    let columns = (0..width)
        .map(|col| ScenarioColumn {
            index: cell(0, col),
            name: cell(1, col),
            kind: cell(2, col),
            year: cell(3, col),
            id: cell(4, col),
        })
        .collect();

    let technologies = lines[METADATA_ROWS..]
        .iter()
        .map(|line| {
            let fields = split_quoted_line(line);
            let key = fields.first().map(|f| unquote(f)).unwrap_or_default();
            let values = (0..width)
                .map(|col| fields.get(col + 1).and_then(|f| parse_capacity_pair(f)))
                .collect();
            TechnologyRow { key, values }
        })
        .collect();

    Ok(CapacityTable {
        columns,
        technologies,
    })
}
