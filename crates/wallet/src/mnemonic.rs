//! BIP-39 mnemonic phrases and BIP-32 key derivation
//!
//! A random wallet is created by generating a mnemonic from CSPRNG entropy
//! and deriving a secp256k1 key from its seed at the standard Ethereum path
//! `m/44'/60'/0'/0/0`. Hardened (`'`) and normal components are both
//! supported, so keys derived here match other BIP-44 Ethereum wallets for
//! the same phrase and path.
//!
//! # Security
//!
//! - The phrase is stored as a `SecretString` and zeroized on drop
//! - `Debug` output never contains the phrase
//! - Seeds and intermediate chain state are wrapped in `Zeroizing`

use bip39::Mnemonic as Bip39Mnemonic;
use hmac::{Hmac, Mac};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::PrimeField;
use k256::{Scalar, SecretKey as K256SecretKey};
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::ExposeSecret;
use sha2::Sha512;
use zeroize::Zeroizing;

use crate::error::MnemonicError;
use crate::keys::KeyMaterial;
use crate::secure::SecretString;

/// Standard Ethereum derivation path (BIP-44, first account)
pub const DEFAULT_DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

/// Marker bit for hardened path components
const HARDENED_OFFSET: u32 = 0x8000_0000;

type HmacSha512 = Hmac<Sha512>;

/// A BIP-39 mnemonic phrase.
pub struct Mnemonic {
    inner: Bip39Mnemonic,
    /// Cached phrase for secure access
    phrase: SecretString,
}

impl Mnemonic {
    /// Generate a new random 12-word (128-bit entropy) mnemonic.
    ///
    /// # Errors
    ///
    /// Returns `MnemonicError::Entropy` if the OS random source fails.
    pub fn generate() -> Result<Self, MnemonicError> {
        Self::generate_with_word_count(12)
    }

    /// Generate a mnemonic with a specific word count (12, 15, 18, 21, 24).
    pub fn generate_with_word_count(word_count: usize) -> Result<Self, MnemonicError> {
        let entropy_bytes = word_count_to_entropy_bytes(word_count)?;

        let mut entropy = Zeroizing::new(vec![0u8; entropy_bytes]);
        OsRng
            .try_fill_bytes(&mut *entropy)
            .map_err(|e| MnemonicError::Entropy(e.to_string()))?;

        let mnemonic = Bip39Mnemonic::from_entropy(&entropy)
            .map_err(|e| MnemonicError::InvalidPhrase(e.to_string()))?;

        let phrase = mnemonic.to_string();
        Ok(Self {
            inner: mnemonic,
            phrase: phrase.into(),
        })
    }

    /// Import a mnemonic from an existing phrase.
    ///
    /// Normalizes whitespace and case, then validates words and checksum.
    pub fn from_phrase(phrase: &str) -> Result<Self, MnemonicError> {
        let normalized = phrase.trim().to_lowercase();
        let mnemonic = Bip39Mnemonic::parse_normalized(&normalized)
            .map_err(|e| MnemonicError::InvalidPhrase(e.to_string()))?;

        Ok(Self {
            phrase: normalized.into(),
            inner: mnemonic,
        })
    }

    /// The mnemonic phrase.
    ///
    /// # Security
    ///
    /// Use immediately (e.g. backup display) and do not store the reference.
    pub fn phrase(&self) -> &str {
        self.phrase.expose_secret()
    }

    /// Number of words in the phrase.
    pub fn word_count(&self) -> usize {
        self.inner.word_count()
    }

    /// Derive a secp256k1 key at a BIP-32 path.
    ///
    /// The optional passphrase is the BIP-39 "25th word", not the keystore
    /// password.
    pub fn derive_key(
        &self,
        path: &str,
        passphrase: Option<&str>,
    ) -> Result<KeyMaterial, MnemonicError> {
        let components = parse_derivation_path(path)?;
        let seed = Zeroizing::new(self.inner.to_seed(passphrase.unwrap_or("")));

        // BIP-32 master node
        let master = hmac_sha512(b"Bitcoin seed", seed.as_ref());
        let mut secret = K256SecretKey::from_slice(&master[..32]).map_err(|_| {
            MnemonicError::Derivation("master seed is not a valid scalar".to_string())
        })?;
        let mut chain_code: Zeroizing<[u8; 32]> =
            Zeroizing::new(master[32..].try_into().expect("split of 64-byte digest"));

        for index in components {
            let mut mac = HmacSha512::new_from_slice(chain_code.as_ref())
                .expect("hmac accepts any key length");
            if index >= HARDENED_OFFSET {
                let secret_bytes: Zeroizing<[u8; 32]> = Zeroizing::new(secret.to_bytes().into());
                mac.update(&[0u8]);
                mac.update(secret_bytes.as_ref());
            } else {
                let point = secret.public_key().to_encoded_point(true);
                mac.update(point.as_bytes());
            }
            mac.update(&index.to_be_bytes());

            let digest: Zeroizing<[u8; 64]> = Zeroizing::new(mac.finalize().into_bytes().into());

            // child = (IL + parent) mod n; IL >= n or child == 0 is rejected
            let tweak: Option<Scalar> =
                Scalar::from_repr(k256::FieldBytes::clone_from_slice(&digest[..32])).into();
            let tweak = tweak.ok_or_else(|| {
                MnemonicError::Derivation("derived tweak exceeds curve order".to_string())
            })?;
            let child = tweak + *secret.to_nonzero_scalar();
            secret = K256SecretKey::from_bytes(&child.to_repr()).map_err(|_| {
                MnemonicError::Derivation("derived child key is zero".to_string())
            })?;
            chain_code = Zeroizing::new(digest[32..].try_into().expect("split of 64-byte digest"));
        }

        let secret_bytes: Zeroizing<[u8; 32]> = Zeroizing::new(secret.to_bytes().into());
        KeyMaterial::from_bytes(&secret_bytes)
            .map_err(|_| MnemonicError::Derivation("derived key is invalid".to_string()))
    }
}

impl std::fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mnemonic")
            .field("word_count", &self.word_count())
            .field("phrase", &"[REDACTED]")
            .finish()
    }
}

fn hmac_sha512(key: &[u8], data: &[u8]) -> Zeroizing<[u8; 64]> {
    let mut mac = HmacSha512::new_from_slice(key).expect("hmac accepts any key length");
    mac.update(data);
    Zeroizing::new(mac.finalize().into_bytes().into())
}

/// Parse a BIP-32 derivation path such as "m/44'/60'/0'/0/0".
///
/// Hardened components may be written with `'`, `h`, or `H`.
fn parse_derivation_path(path: &str) -> Result<Vec<u32>, MnemonicError> {
    let path = path.trim();
    let mut parts = path.split('/');

    match parts.next() {
        Some("m") | Some("M") => {}
        _ => {
            return Err(MnemonicError::InvalidPath(
                "path must start with 'm'".to_string(),
            ))
        }
    }

    let mut components = Vec::new();
    for part in parts {
        if part.is_empty() {
            continue;
        }

        let (num_str, hardened) = match part
            .strip_suffix('\'')
            .or_else(|| part.strip_suffix('h'))
            .or_else(|| part.strip_suffix('H'))
        {
            Some(stripped) => (stripped, true),
            None => (part, false),
        };

        let index: u32 = num_str.parse().map_err(|_| {
            MnemonicError::InvalidPath(format!("invalid path component: {}", part))
        })?;
        if index >= HARDENED_OFFSET {
            return Err(MnemonicError::InvalidPath(format!(
                "index out of range: {}",
                part
            )));
        }

        components.push(if hardened {
            index | HARDENED_OFFSET
        } else {
            index
        });
    }

    if components.is_empty() {
        return Err(MnemonicError::InvalidPath(
            "path has no components".to_string(),
        ));
    }

    Ok(components)
}

fn word_count_to_entropy_bytes(word_count: usize) -> Result<usize, MnemonicError> {
    match word_count {
        12 => Ok(16),
        15 => Ok(20),
        18 => Ok(24),
        21 => Ok(28),
        24 => Ok(32),
        _ => Err(MnemonicError::InvalidPhrase(format!(
            "invalid word count: {} (must be 12, 15, 18, 21, or 24)",
            word_count
        ))),
    }
}
