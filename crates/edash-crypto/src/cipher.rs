//! AES-256-GCM over base64url-encoded fields
//!
//! Ciphertext layout matches WebCrypto's `AES-GCM` output:
//! ```text
//! [N bytes: ciphertext][16 bytes: GCM tag]     iv: 12 bytes, stored separately
//! ```

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;

use crate::codec;
use crate::error::{CryptoError, CryptoResult};
use crate::{KEY_SIZE, NONCE_SIZE, TAG_SIZE};

/// Output of [`encrypt`]: both fields base64url, ready for bundle JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub ciphertext: String,
    pub iv: String,
}

/// Decrypt a base64url ciphertext under `key` with the base64url `iv`.
///
/// Decode problems are [`CryptoError::Format`]; a tag mismatch is
/// [`CryptoError::Authentication`].
pub fn decrypt(ciphertext_b64: &str, key: &[u8; KEY_SIZE], iv_b64: &str) -> CryptoResult<Vec<u8>> {
    let ciphertext = codec::decode(ciphertext_b64)?;
    let iv = codec::decode(iv_b64)?;

    if iv.len() != NONCE_SIZE {
        return Err(CryptoError::format(format!(
            "iv must be {NONCE_SIZE} bytes, got {}",
            iv.len()
        )));
    }
    if ciphertext.len() < TAG_SIZE {
        return Err(CryptoError::format(format!(
            "ciphertext too short: {} bytes (minimum {TAG_SIZE})",
            ciphertext.len()
        )));
    }

    let cipher = Aes256Gcm::new(key.into());
    cipher
        .decrypt(Nonce::from_slice(&iv), ciphertext.as_ref())
        .map_err(|_| CryptoError::Authentication)
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
pub fn encrypt(plaintext: &[u8], key: &[u8; KEY_SIZE]) -> CryptoResult<Sealed> {
    let cipher = Aes256Gcm::new(key.into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| CryptoError::format(format!("AES-256-GCM encryption failed: {e}")))?;

    Ok(Sealed {
        ciphertext: codec::encode_url(&ciphertext),
        iv: codec::encode_url(&nonce_bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; KEY_SIZE] = [42u8; KEY_SIZE];

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let sealed = encrypt(b"hello, encrypted world!", &KEY).unwrap();
        let plain = decrypt(&sealed.ciphertext, &KEY, &sealed.iv).unwrap();
        assert_eq!(plain, b"hello, encrypted world!");
    }

    #[test]
    fn test_encrypt_decrypt_empty() {
        let sealed = encrypt(b"", &KEY).unwrap();
        assert!(decrypt(&sealed.ciphertext, &KEY, &sealed.iv).unwrap().is_empty());
    }

    #[test]
    fn test_decrypt_wrong_key() {
        let sealed = encrypt(b"secret data", &KEY).unwrap();
        let err = decrypt(&sealed.ciphertext, &[1u8; KEY_SIZE], &sealed.iv).unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn test_tampered_ciphertext() {
        let sealed = encrypt(b"secret data", &KEY).unwrap();
        let mut raw = codec::decode(&sealed.ciphertext).unwrap();
        raw[0] ^= 0xFF;

        let err = decrypt(&codec::encode_url(&raw), &KEY, &sealed.iv).unwrap_err();
        assert!(err.is_authentication(), "tampered ciphertext must fail closed");
    }

    #[test]
    fn test_wrong_iv_length_is_format_error() {
        let sealed = encrypt(b"secret data", &KEY).unwrap();
        let short_iv = codec::encode_url(&[0u8; 8]);

        let err = decrypt(&sealed.ciphertext, &KEY, &short_iv).unwrap_err();
        assert!(matches!(err, CryptoError::Format(_)));
    }

    #[test]
    fn test_bad_base64_is_format_error() {
        let sealed = encrypt(b"secret data", &KEY).unwrap();
        let err = decrypt("%%%", &KEY, &sealed.iv).unwrap_err();
        assert!(matches!(err, CryptoError::Format(_)));
    }

    #[test]
    fn test_ciphertext_size() {
        let sealed = encrypt(&[0u8; 1000], &KEY).unwrap();
        let raw = codec::decode(&sealed.ciphertext).unwrap();
        // plaintext (1000) + tag (16)
        assert_eq!(raw.len(), 1000 + TAG_SIZE);
    }
}
