use thiserror::Error;

pub type IngestResult<T> = Result<T, IngestError>;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("format error: {0}")]
    Format(String),

    #[error("workbook error: {0}")]
    Workbook(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("entry is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive entries '{first}' and '{second}' both map to key '{key}'")]
    Collision {
        key: String,
        first: String,
        second: String,
    },
}
