//! Crate-level error types

use thiserror::Error;

/// Errors from key material creation and validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Private key is malformed, zero, or not below the curve order
    #[error("invalid private key: not a valid secp256k1 scalar")]
    InvalidPrivateKey,

    /// The system entropy source failed or is unavailable
    #[error("entropy source failure: {0}")]
    Entropy(String),
}

/// Errors from mnemonic handling and key derivation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MnemonicError {
    /// Phrase has invalid words, word count, or checksum
    #[error("invalid mnemonic phrase: {0}")]
    InvalidPhrase(String),

    /// Derivation path is not a valid BIP-32 path
    #[error("invalid derivation path: {0}")]
    InvalidPath(String),

    /// The system entropy source failed or is unavailable
    #[error("entropy source failure: {0}")]
    Entropy(String),

    /// Child key derivation produced an invalid scalar
    #[error("key derivation failed: {0}")]
    Derivation(String),
}

/// Errors from transaction validation and signing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// Required fields are missing or out of valid range
    #[error("invalid transaction payload: {0}")]
    InvalidPayload(String),

    /// ECDSA signing failed
    #[error("signing failed: {0}")]
    Signing(String),

    /// Signer address could not be recovered from the signature
    #[error("signature recovery failed: {0}")]
    Recovery(String),
}
