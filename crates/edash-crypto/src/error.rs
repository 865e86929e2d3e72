use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// Malformed envelope JSON, base64, nonce or key material.
    #[error("format error: {0}")]
    Format(String),

    /// AEAD tag verification failed (wrong passphrase or tampered bundle).
    #[error("authentication failed: incorrect passphrase or corrupted bundle")]
    Authentication,

    #[error("invalid key length: {got} bytes (expected {expected})")]
    InvalidKeyLength { expected: usize, got: usize },
}

impl CryptoError {
    pub fn format(msg: impl Into<String>) -> Self {
        CryptoError::Format(msg.into())
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, CryptoError::Authentication)
    }
}
