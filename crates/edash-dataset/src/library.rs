//! Workbook sheets grouped by data kind and diagram id
//!
//! Built in two passes: full sheets first, then sparse sheets, which only
//! fill a slot no full sheet claimed (and only under
//! [`SparsePolicy::FallbackWhenAlone`]).

use edash_core::types::{DataKind, SparsePolicy};
use edash_ingest::{Table, Workbook};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::sheet_name::{parse_sheet_name, SheetConvention, SheetName};

/// Why a sparse sheet did not make it into the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SparseSkipReason {
    /// A full sheet for the same id and kind exists
    Superseded,
    /// No full sheet exists and the policy does not fall back
    NoFullSheet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSheet {
    pub sheet: String,
    pub id: String,
    pub kind: DataKind,
    pub reason: SparseSkipReason,
}

/// `library[kind][diagram_id] = rows`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetLibrary {
    tables: BTreeMap<DataKind, BTreeMap<String, Table>>,
    /// Diagram ids in the order their first sheet appeared
    order: Vec<String>,
    pub skipped: Vec<SkippedSheet>,
    /// Sheets that do not follow the naming convention
    pub unrecognized: Vec<String>,
}

impl SheetLibrary {
    pub fn get(&self, kind: DataKind, id: &str) -> Option<&Table> {
        self.tables.get(&kind)?.get(id)
    }

    pub fn contains(&self, kind: DataKind, id: &str) -> bool {
        self.get(kind, id).is_some()
    }

    pub fn insert(&mut self, kind: DataKind, id: impl Into<String>, rows: Table) -> Option<Table> {
        let id = id.into();
        self.note_id(&id);
        self.tables.entry(kind).or_default().insert(id, rows)
    }

    fn note_id(&mut self, id: &str) {
        if !self.order.iter().any(|seen| seen == id) {
            self.order.push(id.to_string());
        }
    }

    /// Every diagram id with at least one sheet, in workbook order.
    pub fn diagram_ids(&self) -> Vec<&str> {
        self.order
            .iter()
            .map(String::as_str)
            .filter(|id| self.tables.values().any(|by_id| by_id.contains_key(*id)))
            .collect()
    }

    /// Required kinds absent for `id`.
    pub fn missing_kinds(&self, id: &str) -> Vec<DataKind> {
        DataKind::ALL
            .iter()
            .copied()
            .filter(|kind| kind.is_required() && !self.contains(*kind, id))
            .collect()
    }

    /// Diagram ids carrying links, nodes and settings.
    pub fn complete_ids(&self) -> Vec<&str> {
        self.diagram_ids()
            .into_iter()
            .filter(|id| self.missing_kinds(id).is_empty())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(BTreeMap::is_empty)
    }
}

/// Group a workbook's sheets by the naming convention.
pub fn build_sheet_library(workbook: &Workbook, convention: &SheetConvention) -> SheetLibrary {
    let mut library = SheetLibrary::default();
    let mut sparse = Vec::new();

    for sheet in &workbook.sheets {
        match parse_sheet_name(&sheet.name, convention) {
            SheetName::Recognized { id, kind } => {
                if library.insert(kind, id.clone(), sheet.rows.clone()).is_some() {
                    warn!(sheet = %sheet.name, %id, %kind, "duplicate sheet, keeping the later one");
                }
            }
            SheetName::Sparse { id, kind } => {
                library.note_id(&id);
                sparse.push((sheet, id, kind));
            }
            SheetName::Unrecognized => {
                debug!(sheet = %sheet.name, "sheet does not follow the naming convention");
                library.unrecognized.push(sheet.name.clone());
            }
        }
    }

    for (sheet, id, kind) in sparse {
        let reason = if library.contains(kind, &id) {
            SparseSkipReason::Superseded
        } else if convention.sparse_policy == SparsePolicy::FallbackWhenAlone {
            debug!(sheet = %sheet.name, %id, %kind, "using sparse sheet, no full sheet present");
            library.insert(kind, id, sheet.rows.clone());
            continue;
        } else {
            SparseSkipReason::NoFullSheet
        };

        debug!(sheet = %sheet.name, %id, %kind, ?reason, "skipping sparse sheet");
        library.skipped.push(SkippedSheet {
            sheet: sheet.name.clone(),
            id,
            kind,
            reason,
        });
    }

    library
}
