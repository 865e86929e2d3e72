use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of data a workbook sheet carries for one diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Links,
    Nodes,
    Remarks,
    Legend,
    Settings,
    Rectangles,
}

impl DataKind {
    pub const ALL: [DataKind; 6] = [
        DataKind::Links,
        DataKind::Nodes,
        DataKind::Remarks,
        DataKind::Legend,
        DataKind::Settings,
        DataKind::Rectangles,
    ];

    /// Kinds a diagram cannot be assembled without.
    pub const REQUIRED: [DataKind; 3] = [DataKind::Links, DataKind::Nodes, DataKind::Settings];

    pub fn as_str(self) -> &'static str {
        match self {
            DataKind::Links => "links",
            DataKind::Nodes => "nodes",
            DataKind::Remarks => "remarks",
            DataKind::Legend => "legend",
            DataKind::Settings => "settings",
            DataKind::Rectangles => "rectangles",
        }
    }

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown data kind: {s}"))
    }
}

/// Which pipeline variant feeds the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceMode {
    /// Plain workbook fetched from a URL
    Url,
    /// Encrypted bundle holding a ZIP archive; also checks `productID`
    #[default]
    File,
}

/// Language of user-facing status and error messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Nl,
    En,
}

/// Value written for empty cells by every ingestion path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyCell {
    #[default]
    Null,
    EmptyString,
}

/// What to do with a sparse sheet that has no full counterpart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SparsePolicy {
    /// The id has no data for that kind
    #[default]
    Ignore,
    /// Use the sparse sheet when it is the only one
    FallbackWhenAlone,
}

/// Identity and render-target binding for one visualization instance.
///
/// Width and height stay `None` until the diagram's settings are known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramConfig {
    pub data_id: String,
    pub instance_id: u32,
    pub target_element_id: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl DiagramConfig {
    pub fn new(data_id: impl Into<String>, instance_id: u32, target_prefix: &str) -> Self {
        Self {
            data_id: data_id.into(),
            instance_id,
            target_element_id: format!("{target_prefix}{instance_id}"),
            width: None,
            height: None,
        }
    }

    pub fn set_dimensions(&mut self, width: u32, height: u32) {
        self.width = Some(width);
        self.height = Some(height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_kind_parse_roundtrip() {
        for kind in DataKind::ALL {
            assert_eq!(kind.as_str().parse::<DataKind>().unwrap(), kind);
        }
        assert!("Links".parse::<DataKind>().is_err());
        assert!("flows".parse::<DataKind>().is_err());
    }

    #[test]
    fn required_kinds() {
        assert!(DataKind::Links.is_required());
        assert!(DataKind::Settings.is_required());
        assert!(!DataKind::Legend.is_required());
        assert!(!DataKind::Rectangles.is_required());
    }

    #[test]
    fn diagram_config_target_and_dimensions() {
        let mut cfg = DiagramConfig::new("energy_system", 0, "sankeyContainer");
        assert_eq!(cfg.target_element_id, "sankeyContainer0");
        assert_eq!(cfg.width, None);

        cfg.set_dimensions(1200, 800);
        assert_eq!((cfg.width, cfg.height), (Some(1200), Some(800)));
    }

    #[test]
    fn diagram_config_serializes_camel_case() {
        let cfg = DiagramConfig::new("sys", 3, "chart");
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"dataId\":\"sys\""));
        assert!(json.contains("\"targetElementId\":\"chart3\""));
    }
}
