//! Loaded diagrams plus the one currently shown
//!
//! Switching diagrams is a lookup; nothing is decrypted or parsed again.

use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::assembly::{AssemblyReport, LoadedDataset};
use crate::error::{DatasetError, DatasetResult};
use crate::render::DiagramRenderer;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DatasetKey {
    pub source: String,
    pub diagram_id: String,
}

impl DatasetKey {
    pub fn new(source: impl Into<String>, diagram_id: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            diagram_id: diagram_id.into(),
        }
    }

    pub fn of(dataset: &LoadedDataset) -> Self {
        Self::new(dataset.source.clone(), dataset.diagram_id.clone())
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source, self.diagram_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DatasetRegistry {
    datasets: BTreeMap<DatasetKey, LoadedDataset>,
    active: Option<DatasetKey>,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a dataset. The first dataset added becomes active.
    pub fn insert(&mut self, dataset: LoadedDataset) -> Option<LoadedDataset> {
        let key = DatasetKey::of(&dataset);
        if self.active.is_none() {
            self.active = Some(key.clone());
        }
        self.datasets.insert(key, dataset)
    }

    pub fn extend_from_report(&mut self, report: &AssemblyReport) {
        for dataset in &report.datasets {
            self.insert(dataset.clone());
        }
    }

    pub fn get(&self, key: &DatasetKey) -> Option<&LoadedDataset> {
        self.datasets.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &DatasetKey> {
        self.datasets.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadedDataset> {
        self.datasets.values()
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    pub fn active_key(&self) -> Option<&DatasetKey> {
        self.active.as_ref()
    }

    pub fn active(&self) -> Option<&LoadedDataset> {
        self.datasets.get(self.active.as_ref()?)
    }

    pub fn select(&mut self, key: &DatasetKey) -> DatasetResult<&LoadedDataset> {
        if !self.datasets.contains_key(key) {
            return Err(DatasetError::UnknownDataset(key.to_string()));
        }
        debug!(dataset = %key, "selecting dataset");
        self.active = Some(key.clone());
        self.active().ok_or(DatasetError::Empty)
    }

    /// Select by diagram id alone; fails if several sources carry that id.
    pub fn select_diagram(&mut self, diagram_id: &str) -> DatasetResult<&LoadedDataset> {
        let matches: Vec<&DatasetKey> = self
            .datasets
            .keys()
            .filter(|k| k.diagram_id == diagram_id)
            .collect();

        let key = match matches.as_slice() {
            [] => return Err(DatasetError::UnknownDiagram(diagram_id.to_string())),
            [key] => (*key).clone(),
            several => {
                return Err(DatasetError::AmbiguousDiagram {
                    diagram: diagram_id.to_string(),
                    sources: several.iter().map(|k| k.source.clone()).collect(),
                })
            }
        };
        self.select(&key)
    }

    /// Hand the active dataset to a renderer.
    pub fn render_active<R: DiagramRenderer + ?Sized>(&self, renderer: &mut R) -> DatasetResult<()> {
        let dataset = self.active().ok_or(DatasetError::Empty)?;
        render(dataset, renderer);
        Ok(())
    }

    /// Hand every dataset to a renderer, in key order.
    pub fn render_all<R: DiagramRenderer + ?Sized>(&self, renderer: &mut R) {
        for dataset in self.datasets.values() {
            render(dataset, renderer);
        }
    }
}

fn render<R: DiagramRenderer + ?Sized>(dataset: &LoadedDataset, renderer: &mut R) {
    debug!(source = %dataset.source, diagram = %dataset.diagram_id, "rendering");
    renderer.process_data(
        &dataset.links,
        &dataset.nodes,
        &dataset.legend,
        &dataset.settings,
        &dataset.remarks,
        &dataset.config,
    );
    if let Some(rectangles) = &dataset.rectangles {
        renderer.process_rectangles(rectangles, &dataset.config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edash_core::types::DiagramConfig;
    use edash_ingest::Row;

    use crate::settings::DiagramSettings;

    fn dataset(source: &str, id: &str, instance: u32) -> LoadedDataset {
        LoadedDataset {
            source: source.into(),
            diagram_id: id.into(),
            links: vec![Row::new()],
            nodes: Vec::new(),
            legend: Vec::new(),
            remarks: Vec::new(),
            rectangles: (id == "sys").then(|| vec![Row::new(), Row::new()]),
            settings: vec![DiagramSettings::new()],
            config: DiagramConfig::new(id, instance, "sankeyContainer"),
        }
    }

    #[derive(Default)]
    struct Recorder {
        rendered: Vec<String>,
        rectangles: usize,
    }

    impl DiagramRenderer for Recorder {
        fn process_data(
            &mut self,
            links: &[Row],
            _nodes: &[Row],
            _legend: &[Row],
            settings: &[DiagramSettings],
            _remarks: &[Row],
            config: &DiagramConfig,
        ) {
            assert_eq!(links.len(), 1);
            assert_eq!(settings.len(), 1);
            self.rendered.push(config.target_element_id.clone());
        }

        fn process_rectangles(&mut self, rectangles: &[Row], _config: &DiagramConfig) {
            self.rectangles += rectangles.len();
        }
    }

    fn registry() -> DatasetRegistry {
        let mut reg = DatasetRegistry::new();
        reg.insert(dataset("II3050", "sys", 0));
        reg.insert(dataset("II3050", "ned", 1));
        reg.insert(dataset("KA2030", "ned", 2));
        reg
    }

    #[test]
    fn first_insert_is_active() {
        let reg = registry();
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.active_key(), Some(&DatasetKey::new("II3050", "sys")));
    }

    #[test]
    fn select_switches_without_copying() {
        let mut reg = registry();
        let selected = reg.select(&DatasetKey::new("KA2030", "ned")).unwrap();
        assert_eq!(selected.config.instance_id, 2);
        assert_eq!(reg.active().unwrap().source, "KA2030");

        let err = reg.select(&DatasetKey::new("KA2030", "sys")).unwrap_err();
        assert!(matches!(err, DatasetError::UnknownDataset(_)));
        assert_eq!(reg.active().unwrap().source, "KA2030", "failed select keeps the active one");
    }

    #[test]
    fn select_by_diagram_id() {
        let mut reg = registry();
        assert_eq!(reg.select_diagram("sys").unwrap().source, "II3050");

        match reg.select_diagram("ned").unwrap_err() {
            DatasetError::AmbiguousDiagram { sources, .. } => {
                assert_eq!(sources, vec!["II3050", "KA2030"])
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            reg.select_diagram("waterfall"),
            Err(DatasetError::UnknownDiagram(_))
        ));
    }

    #[test]
    fn render_active_and_all() {
        let reg = registry();
        let mut recorder = Recorder::default();

        reg.render_active(&mut recorder).unwrap();
        assert_eq!(recorder.rendered, vec!["sankeyContainer0"]);
        assert_eq!(recorder.rectangles, 2);

        let mut recorder = Recorder::default();
        reg.render_all(&mut recorder);
        assert_eq!(recorder.rendered.len(), 3);
    }

    #[test]
    fn empty_registry_has_nothing_to_render() {
        let reg = DatasetRegistry::new();
        assert!(reg.active().is_none());
        assert!(matches!(
            reg.render_active(&mut Recorder::default()),
            Err(DatasetError::Empty)
        ));
    }
}
