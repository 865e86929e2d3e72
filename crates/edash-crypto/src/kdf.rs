//! Key derivation: PBKDF2-HMAC-SHA256 passphrase → KEK

use pbkdf2::pbkdf2_hmac;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::codec;
use crate::error::{CryptoError, CryptoResult};
use crate::keys::KeyEncryptionKey;
use crate::KEY_SIZE;

/// PBKDF2 parameters used when sealing a new bundle
#[derive(Debug, Clone)]
pub struct KdfParams {
    /// PBKDF2 iteration count (default: 310000)
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: 310_000,
        }
    }
}

/// Derivation seam between the envelope resolver and the KDF primitive.
pub trait KeyDerivation {
    fn derive(
        &self,
        passphrase: &SecretString,
        salt_b64: &str,
        iterations: u32,
    ) -> CryptoResult<KeyEncryptionKey>;
}

/// The bundle KDF: PBKDF2 with HMAC-SHA256 and a 256-bit output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pbkdf2Sha256;

impl KeyDerivation for Pbkdf2Sha256 {
    fn derive(
        &self,
        passphrase: &SecretString,
        salt_b64: &str,
        iterations: u32,
    ) -> CryptoResult<KeyEncryptionKey> {
        derive_key(passphrase, salt_b64, iterations)
    }
}

/// Derive the key-encryption key from a passphrase and the bundle's salt.
///
/// `iterations` comes from the bundle, never from the user. A tampered salt or
/// iteration count is not detectable here; the resulting KEK simply fails
/// authentication when unwrapping the data key.
pub fn derive_key(
    passphrase: &SecretString,
    salt_b64: &str,
    iterations: u32,
) -> CryptoResult<KeyEncryptionKey> {
    if iterations == 0 {
        return Err(CryptoError::format("kdf.iterations must be a positive integer"));
    }

    let salt = codec::decode(salt_b64)?;
    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(
        passphrase.expose_secret().as_bytes(),
        &salt,
        iterations,
        &mut key,
    );

    Ok(KeyEncryptionKey::from_bytes(key))
}
