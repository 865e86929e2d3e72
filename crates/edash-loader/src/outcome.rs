//! What a successful load hands back to the caller

use edash_core::EdashError;
use edash_dataset::{AssemblyReport, DatasetRegistry, Rejection};
use edash_ingest::{CapacityTable, DecodedArchive, ExtractionIssue, KeyCollision, Table};
use serde_json::Value;
use std::collections::BTreeMap;

/// Per-entry diagnostics from archive extraction and table parsing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArchiveReport {
    pub recognized: usize,
    pub issues: Vec<ExtractionIssue>,
    pub collisions: Vec<KeyCollision>,
    pub skipped: Vec<String>,
}

impl ArchiveReport {
    pub fn from_archive(archive: &DecodedArchive) -> Self {
        Self {
            recognized: archive.recognized,
            issues: archive.issues.clone(),
            collisions: archive.collisions.clone(),
            skipped: archive.skipped.clone(),
        }
    }

    pub fn loaded(&self) -> usize {
        self.recognized.saturating_sub(self.issues.len())
    }

    /// "N of M files loaded"
    pub fn summary(&self) -> String {
        format!("{} of {} files loaded", self.loaded(), self.recognized)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    /// Renderable diagrams; the first one is active
    pub registry: DatasetRegistry,
    pub assembly: AssemblyReport,
    pub archive: ArchiveReport,
    /// Capacity CSV entries, by base name
    pub capacity: BTreeMap<String, CapacityTable>,
    /// Other delimited entries, by base name
    pub tables: BTreeMap<String, Table>,
    /// JSON entries, by base name
    pub documents: BTreeMap<String, Value>,
}

impl LoadOutcome {
    pub fn diagram_count(&self) -> usize {
        self.registry.len()
    }

    /// When nothing is renderable, the error to show instead.
    ///
    /// An identity mismatch takes precedence over incomplete diagrams.
    pub fn blocking_error(&self) -> Option<EdashError> {
        if !self.registry.is_empty() {
            return None;
        }
        let mismatch = self.assembly.rejected.iter().find_map(|r| match r {
            Rejection::IdentityMismatch {
                diagram_id, html, ..
            } => Some(EdashError::IdentityMismatch {
                diagram: diagram_id.clone(),
                detail: html.clone(),
            }),
            Rejection::Incomplete { .. } => None,
        });
        if mismatch.is_some() {
            return mismatch;
        }

        let incomplete: Vec<String> = self
            .assembly
            .rejected
            .iter()
            .filter_map(|r| match r {
                Rejection::Incomplete {
                    diagram_id,
                    missing,
                } => {
                    let missing: Vec<&str> = missing.iter().map(|k| k.as_str()).collect();
                    Some(format!("{diagram_id} (missing {})", missing.join(", ")))
                }
                Rejection::IdentityMismatch { .. } => None,
            })
            .collect();
        Some(EdashError::Incomplete(if incomplete.is_empty() {
            "no diagram sheets found".into()
        } else {
            incomplete.join("; ")
        }))
    }
}
