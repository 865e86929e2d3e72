//! Delimited text (CSV / TSV / TXT) → header-keyed tables

use serde_json::Value;

use crate::error::IngestResult;
use crate::table::{build_row, normalize_headers, IngestOptions, Table};

/// Delimiter for an entry: `.tsv` is tab, `.csv` is comma, anything else is
/// tab when the header line contains one and comma otherwise.
pub fn delimiter_for(extension: &str, text: &str) -> u8 {
    match extension.to_ascii_lowercase().as_str() {
        "tsv" => b'\t',
        "csv" => b',',
        _ => {
            let header = text.lines().next().unwrap_or("");
            if header.contains('\t') {
                b'\t'
            } else {
                b','
            }
        }
    }
}

/// Parse delimited text whose first record is the header row.
///
/// Values are kept as strings; empty fields get the configured default.
pub fn delimited_to_rows(text: &str, delimiter: u8, opts: &IngestOptions) -> IngestResult<Table> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        // Headers are handled here so blank / duplicate names follow the workbook rules.
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let headers = match records.next() {
        Some(record) => normalize_headers(record?.iter().map(str::to_string).collect()),
        None => return Ok(Table::new()),
    };

    let mut rows = Table::new();
    for record in records {
        let record = record?;
        let cells = record
            .iter()
            .map(|field| Value::String(field.to_string()))
            .collect();
        if let Some(row) = build_row(&headers, cells, opts) {
            rows.push(row);
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn csv_with_quotes_and_blanks() {
        let text = "id,label,color\n1,\"Gas, natural\",#ff0000\n2,Wind,\n\n3,,\n";
        let rows = delimited_to_rows(text, b',', &IngestOptions::default()).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["label"], json!("Gas, natural"));
        assert_eq!(rows[1]["color"], Value::Null);
        assert_eq!(rows[2]["label"], Value::Null);
        assert_eq!(rows[2]["id"], json!("3"));
    }

    #[test]
    fn tsv_and_bom() {
        let text = "\u{feff}key\tvalue\nunit\tPJ\n";
        let rows = delimited_to_rows(text, b'\t', &IngestOptions::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["key"], json!("unit"));
        assert_eq!(rows[0]["value"], json!("PJ"));
    }

    #[test]
    fn short_and_long_records() {
        let text = "a,b\n1\n2,3,4\n";
        let rows = delimited_to_rows(text, b',', &IngestOptions::default()).unwrap();
        assert_eq!(rows[0]["b"], Value::Null);
        assert_eq!(rows[1].len(), 2, "extra fields beyond the header are dropped");
    }

    #[test]
    fn empty_input() {
        assert!(delimited_to_rows("", b',', &IngestOptions::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn delimiter_detection() {
        assert_eq!(delimiter_for("TSV", "a,b"), b'\t');
        assert_eq!(delimiter_for("csv", "a\tb"), b',');
        assert_eq!(delimiter_for("txt", "a\tb\n1\t2"), b'\t');
        assert_eq!(delimiter_for("txt", "a,b\n1,2"), b',');
    }
}
