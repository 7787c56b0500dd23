//! Web3 Secret Storage ("V3") encrypted keystore implementation
//!
//! This module provides password-based key storage in the V3 keystore format
//! used by geth and other Ethereum tooling. The format supports:
//!
//! - Password-based key derivation via scrypt (default) or PBKDF2
//! - AES-128-CTR symmetric encryption
//! - keccak256 MAC verification over the second derived-key half
//! - JSON serialization for portability
//!
//! # Security Properties
//!
//! - Keys are encrypted at rest with a user password
//! - scrypt with N=2^18 makes brute-force attacks expensive
//! - The MAC detects both wrong passwords and tampered ciphertext
//! - UUID provides unique identification
//!
//! # Example
//!
//! ```rust,ignore
//! use ethwallet::keystore::KeystoreRecord;
//!
//! // Encrypt a key to a V3 record
//! let record = KeystoreRecord::encrypt(&key, "my-strong-password")?;
//! record.save("./keys/wallet.json")?;
//!
//! // Load and decrypt (the KDF is CPU-bound; prefer the async variant
//! // inside a runtime)
//! let loaded = KeystoreRecord::load("./keys/wallet.json")?;
//! let key = loaded.decrypt_async("my-strong-password").await?;
//! ```

mod cipher;
mod error;
mod kdf;
mod mac;
mod record;

pub use cipher::{decrypt_secret, encrypt_secret, generate_iv, CipherParams};
pub use error::{KeystoreError, KeystoreResult};
pub use kdf::{generate_salt, Kdf, KdfParams};
pub use mac::{compute_mac, verify_mac};
pub use record::{CryptoBlock, KeystoreRecord, CIPHER_AES_128_CTR, KEYSTORE_VERSION};
