//! Decrypted ZIP archive → keyed entries
//!
//! Entries are classified by extension (case-insensitive):
//! - spreadsheet: `xls xlsx xlsm ods xml` → parsed [`Workbook`]
//! - delimited:   `csv tsv txt`           → UTF-8 text
//! - structured:  `json`                  → parsed JSON value
//!
//! A failing entry is recorded as an [`ExtractionIssue`] and extraction moves
//! on; only an unreadable ZIP container fails the whole call.

use serde_json::Value;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::error::{IngestError, IngestResult};
use crate::table::IngestOptions;
use crate::workbook::{workbook_to_tables, Workbook};

pub const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xls", "xlsx", "xlsm", "ods", "xml"];
pub const DELIMITED_EXTENSIONS: [&str; 3] = ["csv", "tsv", "txt"];
pub const STRUCTURED_EXTENSIONS: [&str; 1] = ["json"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Spreadsheet,
    Delimited,
    Structured,
}

/// Classify an entry path by its extension.
pub fn classify(path: &str) -> Option<EntryKind> {
    let ext = extension(path)?.to_ascii_lowercase();
    if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
        Some(EntryKind::Spreadsheet)
    } else if DELIMITED_EXTENSIONS.contains(&ext.as_str()) {
        Some(EntryKind::Delimited)
    } else if STRUCTURED_EXTENSIONS.contains(&ext.as_str()) {
        Some(EntryKind::Structured)
    } else {
        None
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn extension(path: &str) -> Option<&str> {
    let name = file_name(path);
    let dot = name.rfind('.')?;
    (dot > 0).then(|| &name[dot + 1..])
}

/// Lookup key of an entry: file name with directory and extension stripped.
pub fn base_name(path: &str) -> String {
    let name = file_name(path);
    match name.rfind('.') {
        Some(dot) if dot > 0 => name[..dot].to_string(),
        _ => name.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryContent {
    Workbook(Workbook),
    Delimited { text: String, extension: String },
    Json(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveEntry {
    /// Full path inside the archive
    pub path: String,
    /// Base-name lookup key
    pub key: String,
    pub kind: EntryKind,
    pub content: EntryContent,
}

/// An entry that was recognized but could not be read or parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionIssue {
    pub path: String,
    pub reason: String,
}

/// Two entries mapped to the same key; `kept` replaced `replaced`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCollision {
    pub key: String,
    pub kept: String,
    pub replaced: String,
}

#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
    pub ingest: IngestOptions,
    /// Fail instead of reporting when two entries share a key
    pub reject_collisions: bool,
}

/// Archive contents after extraction, plus what went wrong along the way.
#[derive(Debug, Clone, Default)]
pub struct DecodedArchive {
    entries: BTreeMap<String, ArchiveEntry>,
    /// Entries with a recognized extension
    pub recognized: usize,
    pub issues: Vec<ExtractionIssue>,
    pub collisions: Vec<KeyCollision>,
    /// Directories and unrecognized entries, by path
    pub skipped: Vec<String>,
}

impl DecodedArchive {
    pub fn get(&self, key: &str) -> Option<&ArchiveEntry> {
        self.entries.get(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = &ArchiveEntry> {
        self.entries.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn workbooks(&self) -> impl Iterator<Item = (&str, &Workbook)> {
        self.entries.values().filter_map(|e| match &e.content {
            EntryContent::Workbook(wb) => Some((e.key.as_str(), wb)),
            _ => None,
        })
    }

    pub fn delimited(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.entries.values().filter_map(|e| match &e.content {
            EntryContent::Delimited { text, extension } => {
                Some((e.key.as_str(), extension.as_str(), text.as_str()))
            }
            _ => None,
        })
    }

    pub fn documents(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.values().filter_map(|e| match &e.content {
            EntryContent::Json(v) => Some((e.key.as_str(), v)),
            _ => None,
        })
    }

    /// Recognized entries that were read and parsed successfully.
    pub fn loaded(&self) -> usize {
        self.recognized - self.issues.len()
    }

    /// "N of M files loaded"
    pub fn summary(&self) -> String {
        format!("{} of {} files loaded", self.loaded(), self.recognized)
    }

    fn insert(&mut self, entry: ArchiveEntry, reject_collisions: bool) -> IngestResult<()> {
        if let Some(previous) = self.entries.get(&entry.key) {
            if reject_collisions {
                return Err(IngestError::Collision {
                    key: entry.key.clone(),
                    first: previous.path.clone(),
                    second: entry.path.clone(),
                });
            }
            warn!(key = %entry.key, kept = %entry.path, replaced = %previous.path, "archive key collision");
            self.collisions.push(KeyCollision {
                key: entry.key.clone(),
                kept: entry.path.clone(),
                replaced: previous.path.clone(),
            });
        }
        self.entries.insert(entry.key.clone(), entry);
        Ok(())
    }
}

/// Open decrypted archive bytes and extract every recognized entry.
pub fn extract(bytes: &[u8], opts: &ArchiveOptions) -> IngestResult<DecodedArchive> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| IngestError::Format(format!("not a readable ZIP archive: {e}")))?;

    let mut decoded = DecodedArchive::default();

    for index in 0..archive.len() {
        let name = archive.name_for_index(index).map(str::to_string);
        let mut file = match archive.by_index(index) {
            Ok(f) => f,
            Err(e) => {
                let path = name.unwrap_or_else(|| format!("#{index}"));
                if classify(&path).is_none() {
                    debug!(path = %path, error = %e, "skipping unreadable unrecognized entry");
                    decoded.skipped.push(path);
                    continue;
                }
                warn!(path = %path, error = %e, "unreadable archive entry");
                decoded.recognized += 1;
                decoded.issues.push(ExtractionIssue {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let path = file.name().to_string();
        if file.is_dir() {
            decoded.skipped.push(path);
            continue;
        }
        let Some(kind) = classify(&path) else {
            debug!(path = %path, "skipping unrecognized entry");
            decoded.skipped.push(path);
            continue;
        };
        decoded.recognized += 1;

        let mut raw = Vec::with_capacity(file.size() as usize);
        if let Err(e) = file.read_to_end(&mut raw) {
            warn!(path = %path, error = %e, "failed to inflate entry");
            decoded.issues.push(ExtractionIssue {
                path,
                reason: e.to_string(),
            });
            continue;
        }

        match parse_entry(&path, kind, raw, &opts.ingest) {
            Ok(content) => {
                let entry = ArchiveEntry {
                    key: base_name(&path),
                    path,
                    kind,
                    content,
                };
                decoded.insert(entry, opts.reject_collisions)?;
            }
            Err(e) => {
                warn!(path = %path, error = %e, "skipping entry that failed to parse");
                decoded.issues.push(ExtractionIssue {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        loaded = decoded.loaded(),
        recognized = decoded.recognized,
        skipped = decoded.skipped.len(),
        collisions = decoded.collisions.len(),
        "archive extracted"
    );
    Ok(decoded)
}

fn parse_entry(
    path: &str,
    kind: EntryKind,
    raw: Vec<u8>,
    opts: &IngestOptions,
) -> IngestResult<EntryContent> {
    match kind {
        EntryKind::Spreadsheet => Ok(EntryContent::Workbook(workbook_to_tables(&raw, opts)?)),
        EntryKind::Delimited => Ok(EntryContent::Delimited {
            text: String::from_utf8(raw)?,
            extension: extension(path).unwrap_or_default().to_ascii_lowercase(),
        }),
        EntryKind::Structured => Ok(EntryContent::Json(serde_json::from_slice(&raw)?)),
    }
}
