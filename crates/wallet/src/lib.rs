//! Ethereum key management primitives
//!
//! This crate provides:
//! - secp256k1 key material with EVM address derivation
//! - Web3 Secret Storage ("V3") encrypted keystores for key import/export
//! - BIP-39 mnemonic generation and BIP-32 key derivation
//! - Deterministic (RFC 6979) signing of legacy/EIP-155 transactions
//! - A `Wallet` facade tying key, keystore, and signer together
//!
//! # Example
//!
//! ```rust,ignore
//! use ethwallet::Wallet;
//!
//! // Import a wallet and export it as an encrypted V3 keystore
//! let wallet = Wallet::from_private_key("0x4646...4646")?;
//! let record = wallet.encrypt_keystore("correct horse battery staple").await?;
//! record.save("./keys/wallet.json")?;
//!
//! // Later: load, decrypt, and sign
//! let wallet = Wallet::from_keystore(&record, "correct horse battery staple").await?;
//! let signed = wallet.sign_transaction(&tx)?;
//! ```

pub mod error;
pub mod keys;
pub mod keystore;
pub mod mnemonic;
pub mod secure;
pub mod transaction;
pub mod wallet;

// Key material exports
pub use keys::KeyMaterial;

// Error exports
pub use error::{KeyError, MnemonicError, TransactionError};

// Keystore exports
pub use keystore::{Kdf, KeystoreError, KeystoreRecord};

// Mnemonic exports
pub use mnemonic::{Mnemonic, DEFAULT_DERIVATION_PATH};

// Transaction exports
pub use transaction::{
    recover_signer, sign_transaction, Signature, SignedTransaction, TransactionPayload,
};

// Secure memory exports
pub use secure::{ExposeSecret, SecretBytes, SecretString};

// Wallet exports
pub use wallet::Wallet;
