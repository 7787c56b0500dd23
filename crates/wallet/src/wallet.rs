//! Wallet facade over key material, keystore, and signer
//!
//! A `Wallet` owns one secp256k1 key and caches its address. It is the
//! entry point callers use: import a private key, generate a random wallet
//! via a fresh mnemonic, export/import encrypted V3 keystores, and sign
//! transactions.

use alloy_primitives::Address;
use rand::{CryptoRng, RngCore};

use crate::error::{KeyError, MnemonicError, TransactionError};
use crate::keys::KeyMaterial;
use crate::keystore::{Kdf, KeystoreRecord, KeystoreResult};
use crate::mnemonic::{Mnemonic, DEFAULT_DERIVATION_PATH};
use crate::transaction::{sign_transaction, SignedTransaction, TransactionPayload};

/// An Ethereum wallet: one private key and its derived address.
///
/// Not `Clone`; the key material moves with the wallet.
pub struct Wallet {
    key: KeyMaterial,
    /// Cached address (derived once from the key)
    address: Address,
}

impl Wallet {
    /// Wrap existing key material.
    pub fn new(key: KeyMaterial) -> Self {
        let address = key.address();
        Self { key, address }
    }

    /// Import a wallet from a 32-byte hex private key (with or without a
    /// `0x` prefix).
    pub fn from_private_key(hex_key: &str) -> Result<Self, KeyError> {
        Ok(Self::new(KeyMaterial::from_hex(hex_key)?))
    }

    /// Create a random wallet.
    ///
    /// Generates a fresh 12-word mnemonic from OS entropy and derives the
    /// key at the standard Ethereum path. The mnemonic is returned alongside
    /// the wallet so the caller can offer a backup; it is the only copy.
    pub fn random() -> Result<(Self, Mnemonic), MnemonicError> {
        let mnemonic = Mnemonic::generate()?;
        let wallet = Self::from_mnemonic(&mnemonic, DEFAULT_DERIVATION_PATH, None)?;
        Ok((wallet, mnemonic))
    }

    /// Derive a wallet from an existing mnemonic.
    pub fn from_mnemonic(
        mnemonic: &Mnemonic,
        path: &str,
        passphrase: Option<&str>,
    ) -> Result<Self, MnemonicError> {
        Ok(Self::new(mnemonic.derive_key(path, passphrase)?))
    }

    /// Generate a wallet directly from the given RNG, without a mnemonic.
    pub fn generate<R: CryptoRng + RngCore>(rng: &mut R) -> Self {
        Self::new(KeyMaterial::generate(rng))
    }

    /// The wallet's EVM address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The wallet's uncompressed public key (65 bytes).
    pub fn public_key(&self) -> [u8; 65] {
        self.key.public_key_uncompressed()
    }

    /// The underlying key material.
    pub fn key(&self) -> &KeyMaterial {
        &self.key
    }

    /// Export the wallet as an encrypted V3 keystore record with default
    /// scrypt parameters.
    ///
    /// The KDF runs on a blocking worker; the returned record is the
    /// caller's to persist (see [`KeystoreRecord::save`]).
    pub async fn encrypt_keystore(&self, password: &str) -> KeystoreResult<KeystoreRecord> {
        let record = KeystoreRecord::encrypt_async(&self.key, password).await?;
        tracing::debug!(address = %self.address, id = %record.id, "encrypted wallet to keystore");
        Ok(record)
    }

    /// Export with explicit KDF cost parameters.
    pub async fn encrypt_keystore_with_kdf(
        &self,
        password: &str,
        kdf: Kdf,
    ) -> KeystoreResult<KeystoreRecord> {
        KeystoreRecord::encrypt_with_kdf_async(&self.key, password, kdf).await
    }

    /// Decrypt a keystore record back into a wallet.
    pub async fn from_keystore(record: &KeystoreRecord, password: &str) -> KeystoreResult<Self> {
        let key = record.decrypt_async(password).await?;
        let wallet = Self::new(key);
        tracing::debug!(address = %wallet.address, id = %record.id, "decrypted wallet from keystore");
        Ok(wallet)
    }

    /// Decrypt a keystore JSON string back into a wallet.
    pub async fn from_encrypted_json(json: &str, password: &str) -> KeystoreResult<Self> {
        let record = KeystoreRecord::from_json(json)?;
        Self::from_keystore(&record, password).await
    }

    /// Sign a transaction payload with this wallet's key.
    pub fn sign_transaction(
        &self,
        tx: &TransactionPayload,
    ) -> Result<SignedTransaction, TransactionError> {
        sign_transaction(&self.key, tx)
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .field("key", &"[REDACTED]")
            .finish()
    }
}
