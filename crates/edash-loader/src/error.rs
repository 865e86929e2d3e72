//! Translation of per-crate errors into the load error taxonomy

use edash_core::EdashError;
use edash_crypto::CryptoError;
use edash_ingest::IngestError;

/// Either envelope layer failing authentication reads as "incorrect
/// passphrase"; the caller never learns which layer it was.
pub fn map_crypto_error(err: CryptoError) -> EdashError {
    match err {
        CryptoError::Authentication => EdashError::Authentication,
        CryptoError::Format(msg) => EdashError::Format(msg),
        other => EdashError::Format(other.to_string()),
    }
}

/// Archive-level ingestion failures abort the load as format errors.
pub fn map_ingest_error(err: IngestError) -> EdashError {
    EdashError::Format(err.to_string())
}
