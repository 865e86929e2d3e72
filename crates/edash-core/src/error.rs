use thiserror::Error;

pub type EdashResult<T> = Result<T, EdashError>;

#[derive(Debug, Error)]
pub enum EdashError {
    /// Bundle or workbook could not be retrieved.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Malformed envelope, base64, archive container or workbook.
    #[error("format error: {0}")]
    Format(String),

    /// AEAD verification failed at either envelope layer.
    #[error("incorrect passphrase")]
    Authentication,

    /// Dataset identity does not match what the hosting page expects.
    #[error("identity mismatch for diagram '{diagram}': {detail}")]
    IdentityMismatch { diagram: String, detail: String },

    /// Nothing renderable: every diagram lacks a required sheet, or none
    /// was found at all.
    #[error("no complete diagram: {0}")]
    Incomplete(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EdashError {
    /// Whether the user can fix this by retrying with another passphrase.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EdashError::Authentication | EdashError::Fetch(_))
    }
}
