//! edash-crypto: envelope encryption for dashboard data bundles
//!
//! Bundle layout (JSON, see [`envelope::EncryptedBundle`]):
//! ```text
//! passphrase ──PBKDF2-HMAC-SHA256(salt, iterations)──▶ KEK (256-bit)
//!   └── wrap: AES-256-GCM(KEK, iv) ──▶ DEK (256-bit, random per bundle)
//!         └── data: AES-256-GCM(DEK, iv) ──▶ ZIP archive bytes
//! ```
//!
//! All binary fields travel as URL-safe base64. Authentication failures at
//! either layer surface as the same [`CryptoError::Authentication`].

pub mod cipher;
pub mod codec;
pub mod error;
pub mod envelope;
pub mod kdf;
pub mod keys;

pub use cipher::{decrypt, encrypt, Sealed};
pub use envelope::{
    bundle_fingerprint, resolve, resolve_bytes, resolve_with, seal, EncryptedBundle,
};
pub use error::{CryptoError, CryptoResult};
pub use kdf::{derive_key, KdfParams, KeyDerivation, Pbkdf2Sha256};
pub use keys::{generate_data_key, DataKey, KeyEncryptionKey};

/// Size of a KEK / DEK in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;

/// Size of the random PBKDF2 salt written by [`seal`]
pub const SALT_SIZE: usize = 16;
