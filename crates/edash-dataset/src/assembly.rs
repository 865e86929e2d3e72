//! Sheet library → renderable per-diagram datasets

use edash_core::types::{DataKind, DataSourceMode, DiagramConfig};
use edash_core::EdashConfig;
use edash_ingest::Table;
use serde::Serialize;
use tracing::{info, warn};

use crate::identity::{validate_identity, ExpectedIdentity, IdentityMismatch};
use crate::library::SheetLibrary;
use crate::settings::{normalize_settings, DiagramSettings};
use crate::sheet_name::SheetConvention;

/// Everything that differs between dashboards, in one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyConfig {
    pub convention: SheetConvention,
    pub identity: ExpectedIdentity,
    pub mode: DataSourceMode,
    pub fallback_width: u32,
    pub fallback_height: u32,
    pub target_prefix: String,
}

impl AssemblyConfig {
    pub fn from_config(cfg: &EdashConfig) -> Self {
        Self {
            convention: SheetConvention::from_config(&cfg.sheets),
            identity: ExpectedIdentity::from_config(&cfg.identity),
            mode: cfg.bundle.mode,
            fallback_width: cfg.diagram.fallback_width,
            fallback_height: cfg.diagram.fallback_height,
            target_prefix: cfg.diagram.target_element_prefix.clone(),
        }
    }
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self::from_config(&EdashConfig::default())
    }
}

/// One diagram, ready for a renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedDataset {
    /// Workbook the diagram came from
    pub source: String,
    pub diagram_id: String,
    pub links: Table,
    pub nodes: Table,
    pub legend: Table,
    pub remarks: Table,
    pub rectangles: Option<Table>,
    /// Single element
    pub settings: Vec<DiagramSettings>,
    pub config: DiagramConfig,
}

/// A diagram id that produced no dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    Incomplete {
        diagram_id: String,
        missing: Vec<DataKind>,
    },
    IdentityMismatch {
        diagram_id: String,
        mismatch: IdentityMismatch,
        /// User-facing message with a link to the right page
        html: String,
    },
}

impl Rejection {
    pub fn diagram_id(&self) -> &str {
        match self {
            Rejection::Incomplete { diagram_id, .. } => diagram_id,
            Rejection::IdentityMismatch { diagram_id, .. } => diagram_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssemblyReport {
    pub datasets: Vec<LoadedDataset>,
    pub rejected: Vec<Rejection>,
}

impl AssemblyReport {
    pub fn merge(&mut self, other: AssemblyReport) {
        self.datasets.extend(other.datasets);
        self.rejected.extend(other.rejected);
    }

    pub fn identity_mismatches(&self) -> impl Iterator<Item = &Rejection> {
        self.rejected
            .iter()
            .filter(|r| matches!(r, Rejection::IdentityMismatch { .. }))
    }
}

/// Assembles libraries from several sources, numbering render instances
/// across all of them.
#[derive(Debug)]
pub struct Assembler<'a> {
    cfg: &'a AssemblyConfig,
    next_instance: u32,
}

impl<'a> Assembler<'a> {
    pub fn new(cfg: &'a AssemblyConfig) -> Self {
        Self {
            cfg,
            next_instance: 0,
        }
    }

    pub fn assemble(&mut self, library: &SheetLibrary, source: &str) -> AssemblyReport {
        let mut report = AssemblyReport::default();

        for id in library.diagram_ids() {
            let missing = library.missing_kinds(id);
            if !missing.is_empty() {
                warn!(source, diagram = id, ?missing, "incomplete diagram, skipping");
                report.rejected.push(Rejection::Incomplete {
                    diagram_id: id.to_string(),
                    missing,
                });
                continue;
            }

            match self.assemble_one(library, source, id) {
                Ok(dataset) => report.datasets.push(dataset),
                Err(mismatch) => {
                    warn!(source, diagram = id, %mismatch, "identity mismatch, not rendering");
                    report.rejected.push(Rejection::IdentityMismatch {
                        diagram_id: id.to_string(),
                        html: mismatch.html_message(&self.cfg.identity.correction_url),
                        mismatch,
                    });
                }
            }
        }

        info!(
            source,
            assembled = report.datasets.len(),
            rejected = report.rejected.len(),
            "assembled diagrams"
        );
        report
    }

    fn assemble_one(
        &mut self,
        library: &SheetLibrary,
        source: &str,
        id: &str,
    ) -> Result<LoadedDataset, IdentityMismatch> {
        let table = |kind| library.get(kind, id).cloned().unwrap_or_default();

        let settings = normalize_settings(&table(DataKind::Settings));
        let primary = settings.first().cloned().unwrap_or_default();
        validate_identity(&primary, &self.cfg.identity, self.cfg.mode)?;

        let mut config = DiagramConfig::new(id, self.next_instance, &self.cfg.target_prefix);
        self.next_instance += 1;
        config.set_dimensions(
            primary.width_or(self.cfg.fallback_width),
            primary.height_or(self.cfg.fallback_height),
        );

        Ok(LoadedDataset {
            source: source.to_string(),
            diagram_id: id.to_string(),
            links: table(DataKind::Links),
            nodes: table(DataKind::Nodes),
            legend: table(DataKind::Legend),
            remarks: table(DataKind::Remarks),
            rectangles: library.get(DataKind::Rectangles, id).cloned(),
            settings,
            config,
        })
    }
}

/// Assemble a single library with instance numbers starting at 0.
pub fn assemble(library: &SheetLibrary, source: &str, cfg: &AssemblyConfig) -> AssemblyReport {
    Assembler::new(cfg).assemble(library, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use edash_ingest::Row;
    use serde_json::{json, Value};

    fn rows(value: Value) -> Table {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().cloned().unwrap())
            .collect::<Vec<Row>>()
    }

    fn settings_rows(project: &str, extra: &[(&str, Value)]) -> Table {
        let mut table = rows(json!([
            { "setting": "projectID", "waarde": project },
            { "setting": "versionID", "waarde": "1" },
        ]));
        for (k, v) in extra {
            table.extend(rows(json!([{ "setting": k, "waarde": v }])));
        }
        table
    }

    fn config() -> AssemblyConfig {
        AssemblyConfig {
            identity: ExpectedIdentity {
                project_id: "KGG".into(),
                version_id: "1".into(),
                product_id: None,
                correction_url: "https://example.org".into(),
            },
            ..Default::default()
        }
    }

    fn library() -> SheetLibrary {
        let mut lib = SheetLibrary::default();
        let links = rows(json!([{ "source": "gas", "target": "power", "value": 10 }]));
        let nodes = rows(json!([{ "id": "gas" }, { "id": "power" }]));

        lib.insert(DataKind::Links, "sys", links.clone());
        lib.insert(DataKind::Nodes, "sys", nodes.clone());
        lib.insert(
            DataKind::Settings,
            "sys",
            settings_rows("KGG", &[("diagramWidth", json!(1600))]),
        );
        lib.insert(DataKind::Rectangles, "sys", rows(json!([{ "x": 1 }])));

        lib.insert(DataKind::Links, "ned", links.clone());
        lib.insert(DataKind::Nodes, "ned", nodes);
        lib.insert(DataKind::Settings, "ned", settings_rows("KGG", &[]));

        lib.insert(DataKind::Links, "half", links);
        lib
    }

    #[test]
    fn assembles_complete_diagrams_and_reports_incomplete() {
        let report = assemble(&library(), "II3050", &config());

        let ids: Vec<&str> = report.datasets.iter().map(|d| d.diagram_id.as_str()).collect();
        assert_eq!(ids, vec!["sys", "ned"]);
        assert_eq!(
            report.rejected,
            vec![Rejection::Incomplete {
                diagram_id: "half".into(),
                missing: vec![DataKind::Nodes, DataKind::Settings],
            }]
        );
    }

    #[test]
    fn dimensions_and_targets() {
        let report = assemble(&library(), "II3050", &config());
        let sys = &report.datasets[0];
        let ned = &report.datasets[1];

        assert_eq!((ned.config.width, ned.config.height), (Some(1200), Some(800)));
        assert_eq!((sys.config.width, sys.config.height), (Some(1600), Some(800)));
        assert_eq!(sys.config.target_element_id, "sankeyContainer0");
        assert_eq!(ned.config.target_element_id, "sankeyContainer1");
        assert_eq!(sys.config.data_id, "sys");
    }

    #[test]
    fn optional_kinds() {
        let report = assemble(&library(), "II3050", &config());
        let sys = &report.datasets[0];
        let ned = &report.datasets[1];

        assert!(ned.legend.is_empty());
        assert!(ned.remarks.is_empty());
        assert!(ned.rectangles.is_none());
        assert_eq!(sys.rectangles.as_ref().map(Vec::len), Some(1));
        assert_eq!(sys.settings.len(), 1);
        assert_eq!(sys.source, "II3050");
    }

    #[test]
    fn instance_numbers_continue_across_sources() {
        let cfg = config();
        let mut assembler = Assembler::new(&cfg);
        let first = assembler.assemble(&library(), "a");
        let second = assembler.assemble(&library(), "b");

        assert_eq!(first.datasets[1].config.instance_id, 1);
        assert_eq!(second.datasets[0].config.instance_id, 2);
        assert_eq!(second.datasets[1].config.target_element_id, "sankeyContainer3");
    }

    #[test]
    fn mismatched_diagram_is_rejected_with_message() {
        let mut lib = library();
        lib.insert(DataKind::Settings, "ned", settings_rows("TNO", &[]));

        let report = assemble(&lib, "II3050", &config());

        assert_eq!(report.datasets.len(), 1);
        assert_eq!(report.datasets[0].diagram_id, "sys");
        let rejection = report.identity_mismatches().next().unwrap();
        assert_eq!(rejection.diagram_id(), "ned");
        match rejection {
            Rejection::IdentityMismatch { html, mismatch, .. } => {
                assert_eq!(mismatch.found.as_deref(), Some("TNO"));
                assert!(html.contains("https://example.org"));
            }
            other => panic!("unexpected rejection {other:?}"),
        }
    }
}
