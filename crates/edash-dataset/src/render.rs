//! Handoff to the chart renderers

use edash_core::types::DiagramConfig;
use edash_ingest::Row;

use crate::settings::DiagramSettings;

/// Consumer of assembled datasets (Sankey, waterfall, capacity charts).
///
/// Renderers receive borrowed data and must not feed it back into loading.
pub trait DiagramRenderer {
    fn process_data(
        &mut self,
        links: &[Row],
        nodes: &[Row],
        legend: &[Row],
        settings: &[DiagramSettings],
        remarks: &[Row],
        config: &DiagramConfig,
    );

    /// Called after `process_data` when the diagram has a rectangles sheet.
    fn process_rectangles(&mut self, _rectangles: &[Row], _config: &DiagramConfig) {}
}
