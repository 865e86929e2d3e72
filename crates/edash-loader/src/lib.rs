//! edash-loader: fetch → decrypt → extract → assemble
//!
//! [`BundleLoader`] owns one bundle location and its status line. A load
//! returns a [`LoadOutcome`] value holding the dataset registry; nothing is
//! written to shared state.

pub mod error;
pub mod loader;
pub mod outcome;
pub mod status;

pub use error::{map_crypto_error, map_ingest_error};
pub use loader::{process_archive, process_workbook, BundleLoader};
pub use outcome::{ArchiveReport, LoadOutcome};
pub use status::{user_message, LoadStatus, StatusLine};
