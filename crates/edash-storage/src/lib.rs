//! edash-storage: OpenDAL-backed retrieval of bundles and workbooks
//!
//! The hosting site serves bundles over HTTP; operators and tests read them
//! from the local filesystem or an in-memory service.

pub mod fetch;
pub mod operator;

pub use fetch::BundleSource;
pub use operator::{build_operator, split_url, BundleLocation};
