//! Dataset identity check against what the hosting page expects
//!
//! Comparison is loose: a numeric cell `2024` matches the expected text
//! `"2024"`, the way spreadsheet values and page constants are compared in
//! the dashboards.

use edash_core::config::IdentityConfig;
use edash_core::types::DataSourceMode;
use serde_json::Value;
use thiserror::Error;

use crate::settings::{DiagramSettings, PRODUCT_ID, PROJECT_ID, VERSION_ID};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedIdentity {
    pub project_id: String,
    pub version_id: String,
    /// Checked in file mode only
    pub product_id: Option<String>,
    pub correction_url: String,
}

impl ExpectedIdentity {
    pub fn from_config(cfg: &IdentityConfig) -> Self {
        Self {
            project_id: cfg.project_id.clone(),
            version_id: cfg.version_id.clone(),
            product_id: cfg.product_id.clone(),
            correction_url: cfg.correction_url.clone(),
        }
    }
}

impl Default for ExpectedIdentity {
    fn default() -> Self {
        Self::from_config(&IdentityConfig::default())
    }
}

/// First identity field that did not match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} mismatch: expected '{expected}', found {}", describe_found(.found))]
pub struct IdentityMismatch {
    pub field: &'static str,
    pub expected: String,
    /// `None` when the settings do not carry the field
    pub found: Option<String>,
}

impl IdentityMismatch {
    /// Dutch / English HTML message with a link to the right page.
    pub fn html_message(&self, correction_url: &str) -> String {
        let field = escape_html(self.field);
        let expected = escape_html(&self.expected);
        let found = escape_html(self.found.as_deref().unwrap_or("-"));
        let url = escape_html(correction_url);
        format!(
            "<p>De geladen gegevens horen niet bij deze pagina \
             ({field}: verwacht <b>{expected}</b>, gevonden <b>{found}</b>).<br>\
             The loaded data does not belong to this page \
             ({field}: expected <b>{expected}</b>, found <b>{found}</b>).</p>\
             <p><a href=\"{url}\" target=\"_blank\" rel=\"noopener\">\
             Ga naar de juiste pagina / Go to the correct page</a></p>"
        )
    }
}

/// Check `projectID` and `versionID`, plus `productID` for bundles loaded in
/// file mode when the page expects one.
pub fn validate_identity(
    settings: &DiagramSettings,
    expected: &ExpectedIdentity,
    mode: DataSourceMode,
) -> Result<(), IdentityMismatch> {
    check(settings, PROJECT_ID, &expected.project_id)?;
    check(settings, VERSION_ID, &expected.version_id)?;
    if mode == DataSourceMode::File {
        if let Some(product_id) = &expected.product_id {
            check(settings, PRODUCT_ID, product_id)?;
        }
    }
    Ok(())
}

fn check(settings: &DiagramSettings, field: &'static str, expected: &str) -> Result<(), IdentityMismatch> {
    match settings.get(field) {
        Some(found) if loosely_equal(found, expected) => Ok(()),
        found => Err(IdentityMismatch {
            field,
            expected: expected.to_string(),
            found: found.and_then(|v| match v {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            }),
        }),
    }
}

/// Strings compare exactly; numbers and booleans compare numerically against
/// the parsed expected text.
pub fn loosely_equal(found: &Value, expected: &str) -> bool {
    let as_number = || expected.trim().parse::<f64>().ok();
    match found {
        Value::String(s) => s == expected,
        Value::Number(n) => n.as_f64().zip(as_number()).is_some_and(|(a, b)| a == b),
        Value::Bool(b) => as_number().is_some_and(|n| n == if *b { 1.0 } else { 0.0 }),
        _ => false,
    }
}

fn describe_found(found: &Option<String>) -> String {
    match found {
        Some(value) => format!("'{value}'"),
        None => "nothing".into(),
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
