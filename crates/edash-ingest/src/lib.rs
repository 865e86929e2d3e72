//! edash-ingest: decrypted archive → keyed in-memory tables
//!
//! # Overview
//! - `archive`: ZIP enumeration, extension classification, per-entry error report
//! - `workbook`: spreadsheet sheets → header-keyed rows
//! - `delimited`: CSV / TSV text → header-keyed rows
//! - `capacity`: the capacity CSV with quoted `{capacity,volume}` cells

pub mod archive;
pub mod capacity;
pub mod delimited;
pub mod error;
pub mod table;
pub mod workbook;

pub use archive::{
    extract, ArchiveEntry, ArchiveOptions, DecodedArchive, EntryContent, EntryKind,
    ExtractionIssue, KeyCollision,
};
pub use capacity::{parse_capacity_csv, CapacityEntry, CapacityTable};
pub use delimited::delimited_to_rows;
pub use error::{IngestError, IngestResult};
pub use table::{IngestOptions, Row, Table};
pub use workbook::{workbook_to_tables, Sheet, Workbook};
