//! Keystore error types

use thiserror::Error;

/// Errors that can occur during keystore operations
///
/// Decode failures deliberately collapse to two externally visible causes:
/// `InvalidPassword` (MAC mismatch) and `Corrupted` (anything structurally
/// wrong with the record or the recovered key), so callers cannot build a
/// padding/format oracle out of the error kind.
#[derive(Error, Debug)]
pub enum KeystoreError {
    /// MAC verification failed during decryption
    #[error("invalid password: MAC verification failed")]
    InvalidPassword,

    /// Record is malformed, or the recovered key failed validation
    #[error("keystore record is malformed or corrupted")]
    Corrupted,

    /// Record version is not the supported V3 format
    #[error("unsupported keystore version: {0}")]
    UnsupportedVersion(u32),

    /// Unsupported KDF function
    #[error("unsupported KDF function: {0}")]
    UnsupportedKdf(String),

    /// Unsupported cipher function
    #[error("unsupported cipher function: {0}")]
    UnsupportedCipher(String),

    /// Invalid KDF parameters
    #[error("invalid KDF parameters: {0}")]
    InvalidKdfParams(String),

    /// Invalid cipher parameters
    #[error("invalid cipher parameters: {0}")]
    InvalidCipherParams(String),

    /// Key derivation failed
    #[error("key derivation failed: {0}")]
    Kdf(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The blocking worker running the KDF failed
    #[error("blocking task failed: {0}")]
    TaskJoin(String),
}

/// Result type for keystore operations
pub type KeystoreResult<T> = Result<T, KeystoreError>;
