//! edash-dataset: parsed workbooks → per-diagram datasets
//!
//! # Overview
//! - `sheet_name`: `<prefix><id>_<kind>` parser (recognized / sparse / other)
//! - `library`: sheets grouped by kind and diagram id, sparse precedence
//! - `settings`: `{setting, waarde}` pivot into a flat settings object
//! - `identity`: projectID / versionID / productID check
//! - `assembly`: complete, validated diagrams as [`LoadedDataset`] values
//! - `registry`: loaded datasets plus the active one, renderer handoff

pub mod assembly;
pub mod error;
pub mod identity;
pub mod library;
pub mod registry;
pub mod render;
pub mod settings;
pub mod sheet_name;

pub use assembly::{assemble, Assembler, AssemblyConfig, AssemblyReport, LoadedDataset, Rejection};
pub use error::{DatasetError, DatasetResult};
pub use identity::{validate_identity, ExpectedIdentity, IdentityMismatch};
pub use library::{build_sheet_library, SheetLibrary, SkippedSheet, SparseSkipReason};
pub use registry::{DatasetKey, DatasetRegistry};
pub use render::DiagramRenderer;
pub use settings::{normalize_settings, DiagramSettings};
pub use sheet_name::{parse_sheet_name, SheetConvention, SheetName};
