use thiserror::Error;

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("no dataset loaded")]
    Empty,

    #[error("unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("unknown diagram: {0}")]
    UnknownDiagram(String),

    /// The diagram id exists in more than one source workbook.
    #[error("diagram '{diagram}' is present in several sources: {}", .sources.join(", "))]
    AmbiguousDiagram { diagram: String, sources: Vec<String> },
}
