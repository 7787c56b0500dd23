//! AES-128-CTR encryption for keystore records
//!
//! CTR mode is a stream cipher, so the ciphertext has the same length as the
//! plaintext and no padding is involved. The encryption key is the first 16
//! bytes of the KDF output.

use aes::Aes128;
use cipher::{KeyIvInit, StreamCipher};
use ctr::Ctr128BE;
use serde::{Deserialize, Serialize};

use super::error::{KeystoreError, KeystoreResult};
use crate::secure::SecretBytes;

/// IV (initialization vector) length for AES-128-CTR
pub const IV_LENGTH: usize = 16;

/// AES-128 key length
pub const AES_KEY_LENGTH: usize = 16;

type Aes128Ctr = Ctr128BE<Aes128>;

/// The record's `cipherparams` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CipherParams {
    /// Initialization vector as hex string
    pub iv: String,
}

impl CipherParams {
    /// Wrap a raw IV for storage.
    pub fn new(iv: &[u8]) -> Self {
        Self {
            iv: hex::encode(iv),
        }
    }

    /// Decode and length-check the IV.
    pub fn iv_bytes(&self) -> KeystoreResult<[u8; IV_LENGTH]> {
        let bytes = hex::decode(&self.iv)
            .map_err(|e| KeystoreError::InvalidCipherParams(format!("invalid IV hex: {}", e)))?;
        bytes.as_slice().try_into().map_err(|_| {
            KeystoreError::InvalidCipherParams(format!(
                "IV must be {} bytes, got {}",
                IV_LENGTH,
                bytes.len()
            ))
        })
    }
}

/// Encrypt secret data with AES-128-CTR.
///
/// `encryption_key` is the full derived key; only its first 16 bytes are
/// used.
pub fn encrypt_secret(secret: &[u8], encryption_key: &[u8], iv: &[u8]) -> KeystoreResult<Vec<u8>> {
    let mut ciphertext = secret.to_vec();
    apply_keystream(&mut ciphertext, encryption_key, iv)?;
    Ok(ciphertext)
}

/// Decrypt keystore ciphertext with AES-128-CTR.
pub fn decrypt_secret(
    ciphertext: &[u8],
    decryption_key: &[u8],
    iv: &[u8],
) -> KeystoreResult<SecretBytes> {
    let mut plaintext = ciphertext.to_vec();
    apply_keystream(&mut plaintext, decryption_key, iv)?;
    Ok(SecretBytes::new(Box::new(plaintext)))
}

// CTR encryption and decryption are the same keystream XOR.
fn apply_keystream(data: &mut [u8], derived_key: &[u8], iv: &[u8]) -> KeystoreResult<()> {
    if derived_key.len() < AES_KEY_LENGTH {
        return Err(KeystoreError::InvalidCipherParams(format!(
            "cipher key must be at least {} bytes, got {}",
            AES_KEY_LENGTH,
            derived_key.len()
        )));
    }

    let iv: [u8; IV_LENGTH] = iv.try_into().map_err(|_| {
        KeystoreError::InvalidCipherParams(format!("IV must be {} bytes", IV_LENGTH))
    })?;

    let key: [u8; AES_KEY_LENGTH] = derived_key[..AES_KEY_LENGTH]
        .try_into()
        .map_err(|_| KeystoreError::InvalidCipherParams("key conversion failed".to_string()))?;

    let mut cipher = Aes128Ctr::new(&key.into(), &iv.into());
    cipher.apply_keystream(data);
    Ok(())
}

/// Generate a random IV.
pub fn generate_iv() -> Vec<u8> {
    use rand::RngCore;
    let mut iv = vec![0u8; IV_LENGTH];
    rand::thread_rng().fill_bytes(&mut iv);
    iv
}
