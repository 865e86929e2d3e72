//! Encrypted bundle format and the two-layer resolve / seal operations
//!
//! ```json
//! {
//!   "kdf":  { "salt": "<base64url>", "iterations": 310000 },
//!   "wrap": { "wrappedKey": "<base64url>", "iv": "<base64url>" },
//!   "data": { "ciphertext": "<base64url>", "iv": "<base64url>" }
//! }
//! ```
//!
//! Resolve steps:
//!   1. Validate that `kdf`, `wrap` and `data` are present (before any KDF work)
//!   2. Derive the KEK from passphrase + `kdf.salt` + `kdf.iterations`
//!   3. Unwrap the DEK: AES-256-GCM(KEK, `wrap.iv`) over `wrap.wrappedKey`
//!   4. Decrypt the archive: AES-256-GCM(DEK, `data.iv`) over `data.ciphertext`

use rand::RngCore;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cipher;
use crate::codec;
use crate::error::{CryptoError, CryptoResult};
use crate::kdf::{KdfParams, KeyDerivation, Pbkdf2Sha256};
use crate::keys::{generate_data_key, DataKey};
use crate::SALT_SIZE;

const REQUIRED_SECTIONS: [&str; 3] = ["kdf", "wrap", "data"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfSection {
    pub salt: String,
    pub iterations: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrapSection {
    pub wrapped_key: String,
    pub iv: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSection {
    pub ciphertext: String,
    pub iv: String,
}

/// A password-protected data bundle, as fetched from the hosting site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBundle {
    pub kdf: KdfSection,
    pub wrap: WrapSection,
    pub data: DataSection,
}

impl EncryptedBundle {
    /// Parse bundle JSON, rejecting documents that lack a required section.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| CryptoError::format(format!("bundle is not valid JSON: {e}")))?;

        let object = value
            .as_object()
            .ok_or_else(|| CryptoError::format("bundle must be a JSON object"))?;

        let missing: Vec<&str> = REQUIRED_SECTIONS
            .iter()
            .copied()
            .filter(|key| !object.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(CryptoError::format(format!(
                "bundle is missing required section(s): {}",
                missing.join(", ")
            )));
        }

        serde_json::from_value(value)
            .map_err(|e| CryptoError::format(format!("malformed bundle section: {e}")))
    }

    pub fn to_vec(&self) -> CryptoResult<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| CryptoError::format(format!("bundle serialization: {e}")))
    }
}

/// BLAKE3 fingerprint (hex) of raw bundle bytes, for log correlation.
pub fn bundle_fingerprint(raw: &[u8]) -> String {
    blake3::hash(raw).to_hex().to_string()
}

/// Resolve a bundle to archive bytes using the bundle KDF.
pub fn resolve(bundle: &EncryptedBundle, passphrase: &SecretString) -> CryptoResult<Vec<u8>> {
    resolve_with(&Pbkdf2Sha256, bundle, passphrase)
}

/// Resolve a bundle with an explicit key derivation.
///
/// An authentication failure while unwrapping the DEK and one while
/// decrypting the payload are returned as the same error.
pub fn resolve_with<K: KeyDerivation>(
    kdf: &K,
    bundle: &EncryptedBundle,
    passphrase: &SecretString,
) -> CryptoResult<Vec<u8>> {
    let kek = kdf.derive(passphrase, &bundle.kdf.salt, bundle.kdf.iterations)?;
    debug!(iterations = bundle.kdf.iterations, "derived key-encryption key");

    let raw_dek = cipher::decrypt(&bundle.wrap.wrapped_key, kek.as_bytes(), &bundle.wrap.iv)?;
    let dek = DataKey::from_vec(raw_dek).map_err(|e| match e {
        CryptoError::InvalidKeyLength { got, .. } => {
            CryptoError::format(format!("unwrapped data key has wrong size: {got} bytes"))
        }
        other => other,
    })?;

    let archive = cipher::decrypt(&bundle.data.ciphertext, dek.as_bytes(), &bundle.data.iv)?;
    debug!(bytes = archive.len(), "decrypted bundle payload");
    Ok(archive)
}

/// Parse and resolve raw bundle JSON in one step.
///
/// Shape validation happens before the KDF runs, so a malformed bundle costs
/// no key-derivation work.
pub fn resolve_bytes(raw: &[u8], passphrase: &SecretString) -> CryptoResult<Vec<u8>> {
    let bundle = EncryptedBundle::from_slice(raw)?;
    resolve(&bundle, passphrase)
}

/// Seal an archive into a new bundle: random salt, random DEK, random nonces.
pub fn seal(
    archive: &[u8],
    passphrase: &SecretString,
    params: &KdfParams,
) -> CryptoResult<EncryptedBundle> {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt_b64 = codec::encode_url(&salt);

    let kek = Pbkdf2Sha256.derive(passphrase, &salt_b64, params.iterations)?;
    let dek = generate_data_key();

    let wrapped = cipher::encrypt(dek.as_bytes(), kek.as_bytes())?;
    let data = cipher::encrypt(archive, dek.as_bytes())?;

    Ok(EncryptedBundle {
        kdf: KdfSection {
            salt: salt_b64,
            iterations: params.iterations,
        },
        wrap: WrapSection {
            wrapped_key: wrapped.ciphertext,
            iv: wrapped.iv,
        },
        data: DataSection {
            ciphertext: data.ciphertext,
            iv: data.iv,
        },
    })
}
