//! Sheet naming convention: `<prefix><diagramId>_<dataKind>`
//!
//! `snky_sys_links` is the links sheet of diagram `sys`. A sheet with a
//! standalone sparse-marker segment (`snky_sys_links_sparse`) is a thinned
//! variant of the same id/kind. Ids cannot contain `_`, and a marker embedded
//! in another segment (`snky_sparsesys_links`) makes the name unrecognized.

use edash_core::config::SheetConfig;
use edash_core::types::{DataKind, SparsePolicy};

/// How sheet names map to diagram ids and data kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetConvention {
    pub prefix: String,
    /// Kinds this dashboard recognizes; other kinds are unrecognized
    pub kinds: Vec<DataKind>,
    /// Case-sensitive `_`-separated segment marking a sparse sheet
    pub sparse_marker: String,
    pub sparse_policy: SparsePolicy,
}

impl SheetConvention {
    pub fn from_config(cfg: &SheetConfig) -> Self {
        Self {
            prefix: cfg.prefix.clone(),
            kinds: cfg.kinds.clone(),
            sparse_marker: cfg.sparse_marker.clone(),
            sparse_policy: cfg.sparse_policy,
        }
    }

    pub fn recognizes(&self, kind: DataKind) -> bool {
        self.kinds.contains(&kind)
    }
}

impl Default for SheetConvention {
    fn default() -> Self {
        Self::from_config(&SheetConfig::default())
    }
}

/// Result of parsing one sheet name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetName {
    Recognized { id: String, kind: DataKind },
    Sparse { id: String, kind: DataKind },
    Unrecognized,
}

pub fn parse_sheet_name(name: &str, convention: &SheetConvention) -> SheetName {
    let Some(rest) = name.strip_prefix(convention.prefix.as_str()) else {
        return SheetName::Unrecognized;
    };

    let marker = convention.sparse_marker.as_str();
    let mut sparse = false;
    let mut segments = Vec::new();
    for segment in rest.split('_') {
        if !marker.is_empty() && segment == marker {
            sparse = true;
        } else if !marker.is_empty() && segment.contains(marker) {
            return SheetName::Unrecognized;
        } else {
            segments.push(segment);
        }
    }

    let [id, kind] = segments.as_slice() else {
        return SheetName::Unrecognized;
    };
    if id.is_empty() {
        return SheetName::Unrecognized;
    }
    let Ok(kind) = kind.parse::<DataKind>() else {
        return SheetName::Unrecognized;
    };
    if !convention.recognizes(kind) {
        return SheetName::Unrecognized;
    }

    let id = id.to_string();
    if sparse {
        SheetName::Sparse { id, kind }
    } else {
        SheetName::Recognized { id, kind }
    }
}
