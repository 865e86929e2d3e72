use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{EdashError, EdashResult};
use crate::types::{DataKind, DataSourceMode, EmptyCell, Locale, SparsePolicy};

/// Top-level configuration (loaded from edash.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EdashConfig {
    pub bundle: BundleConfig,
    pub identity: IdentityConfig,
    pub sheets: SheetConfig,
    pub ingest: IngestConfig,
    pub diagram: DiagramDefaults,
    pub log: LogConfig,
}

impl EdashConfig {
    pub fn from_toml(content: &str) -> EdashResult<Self> {
        toml::from_str(content).map_err(|e| EdashError::Config(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Bundle (file mode) or workbook (url mode) URL
    pub url: Option<String>,
    /// Local bundle path, used when no URL is set
    pub path: Option<PathBuf>,
    /// Pipeline variant: "file" (encrypted ZIP bundle) or "url" (plain workbook)
    pub mode: DataSourceMode,
    /// Keep the fetched bundle so a passphrase retry skips the fetch
    pub keep_bundle: bool,
    /// Language for status and error messages
    pub locale: Locale,
}

/// Identifiers the hosting page expects the dataset to carry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub project_id: String,
    pub version_id: String,
    /// Only checked in file mode
    pub product_id: Option<String>,
    /// Link offered to the user when the data does not match the page
    pub correction_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    /// Reserved sheet-name prefix, e.g. "snky_" in "snky_sys_links"
    pub prefix: String,
    /// Data kinds this dashboard recognizes
    pub kinds: Vec<DataKind>,
    /// Name segment marking a thinned variant of a sheet
    pub sparse_marker: String,
    pub sparse_policy: SparsePolicy,
    /// Workbook entries (base names) holding diagrams; empty = every workbook
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Value for empty cells: "null" or "empty-string"
    pub empty_cell: EmptyCell,
    /// Fail the load when two archive entries share a base name
    pub reject_collisions: bool,
    /// Delimited entries whose base name starts with this are capacity tables
    pub capacity_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramDefaults {
    /// Width in pixels when settings carry no diagramWidth
    pub fallback_width: u32,
    /// Height in pixels when settings carry no diagramHeight
    pub fallback_height: u32,
    /// Render target id prefix; the instance number is appended
    pub target_element_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            url: None,
            path: None,
            mode: DataSourceMode::File,
            keep_bundle: true,
            locale: Locale::Nl,
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            version_id: String::new(),
            product_id: None,
            correction_url: "https://www.energieinbeeld.nl".into(),
        }
    }
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            prefix: "snky_".into(),
            kinds: DataKind::ALL.to_vec(),
            sparse_marker: "sparse".into(),
            sparse_policy: SparsePolicy::Ignore,
            sources: Vec::new(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            empty_cell: EmptyCell::Null,
            reject_collisions: false,
            capacity_prefix: "capacity".into(),
        }
    }
}

impl Default for DiagramDefaults {
    fn default() -> Self {
        Self {
            fallback_width: 1200,
            fallback_height: 800,
            target_element_prefix: "sankeyContainer".into(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[bundle]
url = "https://dashboards.example.org/tennet/bundle.json"
mode = "file"
keep_bundle = false
locale = "en"

[identity]
project_id = "TENNET"
version_id = "2024.2"
product_id = "sankey"
correction_url = "https://dashboards.example.org/tennet/"

[sheets]
prefix = "snky_"
kinds = ["links", "nodes", "settings", "rectangles"]
sparse_marker = "sparse"
sparse_policy = "fallback-when-alone"
sources = ["II3050", "capacity"]

[ingest]
empty_cell = "empty-string"
reject_collisions = true

[diagram]
fallback_width = 1600
fallback_height = 900

[log]
level = "debug"
format = "json"
"#;
        let config = EdashConfig::from_toml(toml_str).unwrap();

        assert_eq!(
            config.bundle.url.as_deref(),
            Some("https://dashboards.example.org/tennet/bundle.json")
        );
        assert!(!config.bundle.keep_bundle);
        assert_eq!(config.bundle.locale, Locale::En);
        assert_eq!(config.identity.project_id, "TENNET");
        assert_eq!(config.identity.product_id.as_deref(), Some("sankey"));
        assert_eq!(config.sheets.kinds.len(), 4);
        assert!(config.sheets.kinds.contains(&DataKind::Rectangles));
        assert_eq!(config.sheets.sparse_policy, SparsePolicy::FallbackWhenAlone);
        assert_eq!(config.sheets.sources, vec!["II3050", "capacity"]);
        assert_eq!(config.ingest.empty_cell, EmptyCell::EmptyString);
        assert!(config.ingest.reject_collisions);
        assert_eq!(config.diagram.fallback_width, 1600);
        assert_eq!(config.log.format, "json");
    }

    #[test]
    fn test_parse_defaults() {
        let config = EdashConfig::from_toml("").unwrap();

        assert!(config.bundle.url.is_none());
        assert_eq!(config.bundle.mode, DataSourceMode::File);
        assert!(config.bundle.keep_bundle);
        assert_eq!(config.sheets.prefix, "snky_");
        assert_eq!(config.sheets.kinds, DataKind::ALL.to_vec());
        assert_eq!(config.sheets.sparse_policy, SparsePolicy::Ignore);
        assert_eq!(config.ingest.empty_cell, EmptyCell::Null);
        assert_eq!(config.diagram.fallback_width, 1200);
        assert_eq!(config.diagram.fallback_height, 800);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[identity]
project_id = "KGG"
version_id = "3"
"#;
        let config = EdashConfig::from_toml(toml_str).unwrap();

        // Overridden
        assert_eq!(config.identity.project_id, "KGG");
        // Defaults
        assert!(config.identity.product_id.is_none());
        assert_eq!(config.sheets.sparse_marker, "sparse");
        assert_eq!(config.ingest.capacity_prefix, "capacity");
    }

    #[test]
    fn test_unknown_mode_is_config_error() {
        let err = EdashConfig::from_toml("[bundle]\nmode = \"ftp\"\n").unwrap_err();
        assert!(matches!(err, EdashError::Config(_)));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = EdashConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed = EdashConfig::from_toml(&toml_str).unwrap();

        assert_eq!(config.sheets.prefix, parsed.sheets.prefix);
        assert_eq!(config.diagram.fallback_width, parsed.diagram.fallback_width);
        assert_eq!(config.bundle.mode, parsed.bundle.mode);
    }
}
