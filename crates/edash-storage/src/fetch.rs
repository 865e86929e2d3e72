//! Bundle retrieval

use edash_core::{EdashError, EdashResult};
use opendal::{ErrorKind, Operator};
use tracing::{debug, info};

use crate::operator::{build_operator, BundleLocation};

/// A readable bundle: an operator plus the object path inside it.
#[derive(Debug, Clone)]
pub struct BundleSource {
    op: Operator,
    path: String,
    display: String,
}

impl BundleSource {
    /// An unusable URL or path is a [`EdashError::Config`].
    pub fn from_location(location: &BundleLocation) -> EdashResult<Self> {
        let (op, path) = build_operator(location)
            .map_err(|e| EdashError::Config(format!("bundle location {location}: {e:#}")))?;
        Ok(Self {
            op,
            path,
            display: location.to_string(),
        })
    }

    /// Wrap an existing operator (e.g. the in-memory service in tests).
    pub fn from_operator(op: Operator, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            display: format!("{}:{}", op.info().scheme(), path),
            op,
            path,
        }
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    /// Read the whole object. Any failure is a [`EdashError::Fetch`].
    pub async fn fetch(&self) -> EdashResult<Vec<u8>> {
        debug!(source = %self.display, "fetching");
        let buf = self.op.read(&self.path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => EdashError::Fetch(format!("{} not found", self.display)),
            _ => EdashError::Fetch(format!("reading {}: {e}", self.display)),
        })?;

        let bytes = buf.to_vec();
        info!(source = %self.display, bytes = bytes.len(), "fetched");
        Ok(bytes)
    }
}
