//! Settings sheet pivot: `{setting, waarde}` rows → flat key/value object

use edash_ingest::{Row, Table};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Column holding the setting name
pub const SETTING_COLUMN: &str = "setting";
/// Column holding the setting value ("waarde" is Dutch for value)
pub const VALUE_COLUMN: &str = "waarde";

pub const PROJECT_ID: &str = "projectID";
pub const VERSION_ID: &str = "versionID";
pub const PRODUCT_ID: &str = "productID";
pub const DIAGRAM_WIDTH: &str = "diagramWidth";
pub const DIAGRAM_HEIGHT: &str = "diagramHeight";

/// Flat configuration of one diagram.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagramSettings(Map<String, Value>);

impl DiagramSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value rendered as text; strings as-is, numbers and booleans formatted.
    pub fn get_text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(value_text)
    }

    pub fn project_id(&self) -> Option<String> {
        self.get_text(PROJECT_ID)
    }

    pub fn version_id(&self) -> Option<String> {
        self.get_text(VERSION_ID)
    }

    pub fn product_id(&self) -> Option<String> {
        self.get_text(PRODUCT_ID)
    }

    pub fn width_or(&self, fallback: u32) -> u32 {
        self.get(DIAGRAM_WIDTH).and_then(pixels).unwrap_or(fallback)
    }

    pub fn height_or(&self, fallback: u32) -> u32 {
        self.get(DIAGRAM_HEIGHT).and_then(pixels).unwrap_or(fallback)
    }

    /// Back to long format, one `{setting, waarde}` row per key.
    pub fn to_rows(&self) -> Table {
        self.0
            .iter()
            .map(|(key, value)| {
                let mut row = Row::new();
                row.insert(SETTING_COLUMN.into(), Value::String(key.clone()));
                row.insert(VALUE_COLUMN.into(), value.clone());
                row
            })
            .collect()
    }
}

impl From<Map<String, Value>> for DiagramSettings {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Pivot long-format settings rows into one flat object.
///
/// Returned as a single-element list, the shape renderers take. Rows without
/// a setting name are skipped; a repeated name keeps the last value.
pub fn normalize_settings(rows: &[Row]) -> Vec<DiagramSettings> {
    let mut settings = DiagramSettings::new();
    for row in rows {
        let Some(key) = row.get(SETTING_COLUMN).and_then(value_text) else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        let value = row.get(VALUE_COLUMN).cloned().unwrap_or(Value::Null);
        settings.insert(key, value);
    }
    vec![settings]
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Positive pixel size from a number or numeric string.
fn pixels(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n.is_finite() && n >= 1.0 && n <= u32::MAX as f64).then(|| n.round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn rows(pairs: Value) -> Table {
        pairs
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().cloned().unwrap())
            .collect()
    }

    #[test]
    fn pivots_long_rows() {
        let table = rows(json!([
            { "setting": "projectID", "waarde": "KGG" },
            { "setting": "versionID", "waarde": 3 },
            { "setting": "diagramWidth", "waarde": "1400" },
            { "setting": null, "waarde": "orphan" },
            { "waarde": "no key" },
            { "setting": "scaleInit", "waarde": null },
        ]));

        let all = normalize_settings(&table);
        assert_eq!(all.len(), 1);
        let settings = &all[0];

        assert_eq!(settings.len(), 4);
        assert_eq!(settings.project_id().as_deref(), Some("KGG"));
        assert_eq!(settings.version_id().as_deref(), Some("3"));
        assert_eq!(settings.product_id(), None);
        assert_eq!(settings.get("scaleInit"), Some(&Value::Null));
        assert_eq!(settings.width_or(1200), 1400);
        assert_eq!(settings.height_or(800), 800);
    }

    #[test]
    fn empty_rows_give_one_empty_settings_object() {
        let all = normalize_settings(&[]);
        assert_eq!(all, vec![DiagramSettings::new()]);
    }

    #[test]
    fn repeated_key_keeps_last() {
        let table = rows(json!([
            { "setting": "unit", "waarde": "PJ" },
            { "setting": "unit", "waarde": "TWh" },
        ]));
        assert_eq!(normalize_settings(&table)[0].get("unit"), Some(&json!("TWh")));
    }

    #[test]
    fn dimension_fallbacks() {
        let mut settings = DiagramSettings::new();
        settings.insert(DIAGRAM_WIDTH, json!(0));
        settings.insert(DIAGRAM_HEIGHT, json!("wide"));
        assert_eq!(settings.width_or(1200), 1200);
        assert_eq!(settings.height_or(800), 800);

        settings.insert(DIAGRAM_WIDTH, json!(960.4));
        settings.insert(DIAGRAM_HEIGHT, json!(" 540 "));
        assert_eq!(settings.width_or(1200), 960);
        assert_eq!(settings.height_or(800), 540);
    }

    #[test]
    fn serializes_as_flat_object() {
        let mut settings = DiagramSettings::new();
        settings.insert(PROJECT_ID, json!("TNO"));
        assert_eq!(serde_json::to_value(&settings).unwrap(), json!({ "projectID": "TNO" }));
    }

    fn value_strategy() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-zA-Z0-9 .,]{0,16}".prop_map(Value::String),
        ]
    }

    proptest! {
        #[test]
        fn pivot_of_flattened_settings_is_identity(
            entries in proptest::collection::btree_map("[a-zA-Z][a-zA-Z0-9_]{0,12}", value_strategy(), 0..24)
        ) {
            let original: DiagramSettings = entries.into_iter().collect::<Map<_, _>>().into();
            let again = normalize_settings(&original.to_rows());
            prop_assert_eq!(again, vec![original]);
        }
    }
}
