//! Secp256k1 key material with EVM address derivation
//!
//! `KeyMaterial` owns a secp256k1 private key and derives the public key and
//! the 20-byte Ethereum address (keccak256(uncompressed_pubkey[1..])[12..])
//! from it. The public key and address are never independently settable.
//!
//! Uses the k256 crate for secp256k1 curve operations; the underlying secret
//! scalar is zeroized when the value is dropped.

use alloy_primitives::{keccak256, Address};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey as K256SecretKey;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use crate::error::KeyError;

/// Private key length in bytes (secp256k1 scalar)
pub const PRIVATE_KEY_LENGTH: usize = 32;

/// An owned secp256k1 private key plus its derived address.
///
/// Intentionally does NOT implement `Clone` to prevent accidental copies of
/// sensitive material, and `Debug` output never exposes the secret bytes.
pub struct KeyMaterial {
    secret: K256SecretKey,
    address: Address,
}

impl KeyMaterial {
    /// Generate a new random key from the given RNG.
    ///
    /// Pure function of the RNG: a deterministic test RNG yields a
    /// deterministic key.
    pub fn generate<R: CryptoRng + RngCore>(rng: &mut R) -> Self {
        Self::from_secret(K256SecretKey::random(rng))
    }

    /// Generate a new random key from the operating system CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::Entropy` if the OS random source fails.
    pub fn random() -> Result<Self, KeyError> {
        let mut bytes = Zeroizing::new([0u8; PRIVATE_KEY_LENGTH]);
        // Rejection-sample until the bytes are a valid scalar
        loop {
            OsRng
                .try_fill_bytes(&mut *bytes)
                .map_err(|e| KeyError::Entropy(e.to_string()))?;
            if let Ok(key) = Self::from_bytes(&bytes) {
                return Ok(key);
            }
        }
    }

    /// Load from raw bytes (32-byte scalar).
    ///
    /// # Errors
    ///
    /// Returns `KeyError::InvalidPrivateKey` if the bytes are zero or not
    /// below the secp256k1 curve order.
    pub fn from_bytes(bytes: &[u8; PRIVATE_KEY_LENGTH]) -> Result<Self, KeyError> {
        K256SecretKey::from_slice(bytes)
            .map(Self::from_secret)
            .map_err(|_| KeyError::InvalidPrivateKey)
    }

    /// Parse from a 32-byte hex string, with or without a `0x` prefix.
    pub fn from_hex(hex_key: &str) -> Result<Self, KeyError> {
        let stripped = hex_key
            .strip_prefix("0x")
            .or_else(|| hex_key.strip_prefix("0X"))
            .unwrap_or(hex_key);

        let decoded =
            Zeroizing::new(hex::decode(stripped).map_err(|_| KeyError::InvalidPrivateKey)?);
        let bytes: &[u8; PRIVATE_KEY_LENGTH] = decoded
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidPrivateKey)?;

        Self::from_bytes(bytes)
    }

    fn from_secret(secret: K256SecretKey) -> Self {
        let address = address_from_public(&secret.public_key());
        Self { secret, address }
    }

    /// Serialize the private key to bytes (32-byte scalar).
    ///
    /// # Security
    ///
    /// The returned bytes are a copy of the secret; callers are responsible
    /// for zeroizing them (wrap in `Zeroizing` where possible).
    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_LENGTH] {
        self.secret.to_bytes().into()
    }

    /// Uncompressed SEC1 public key (65 bytes, with 0x04 prefix).
    pub fn public_key_uncompressed(&self) -> [u8; 65] {
        let encoded = self.secret.public_key().to_encoded_point(false);
        let mut result = [0u8; 65];
        result.copy_from_slice(encoded.as_bytes());
        result
    }

    /// Compressed SEC1 public key (33 bytes).
    pub fn public_key_compressed(&self) -> [u8; 33] {
        let encoded = self.secret.public_key().to_encoded_point(true);
        let mut result = [0u8; 33];
        result.copy_from_slice(encoded.as_bytes());
        result
    }

    /// The EVM address derived from this key (20 bytes).
    pub fn address(&self) -> Address {
        self.address
    }

    /// ECDSA signing key view for transaction signing.
    pub(crate) fn signing_key(&self) -> k256::ecdsa::SigningKey {
        k256::ecdsa::SigningKey::from(&self.secret)
    }
}

// Explicitly NOT implementing Clone to prevent accidental copies

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("secret", &"[REDACTED]")
            .field("address", &self.address)
            .finish()
    }
}

/// Derive the EVM address: keccak256(uncompressed_pubkey[1..])[12..]
fn address_from_public(public: &k256::PublicKey) -> Address {
    let encoded = public.to_encoded_point(false);
    // Skip the 0x04 prefix byte
    let hash = keccak256(&encoded.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_valid_key() {
        let key = KeyMaterial::generate(&mut rand::thread_rng());
        let bytes = key.to_bytes();
        let restored = KeyMaterial::from_bytes(&bytes).unwrap();
        assert_eq!(key.to_bytes(), restored.to_bytes());
        assert_eq!(key.address(), restored.address());
    }

    #[test]
    fn test_random_keys_differ() {
        let a = KeyMaterial::random().unwrap();
        let b = KeyMaterial::random().unwrap();
        assert_ne!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn test_from_hex_with_and_without_prefix() {
        let hex_key = "495d5c34c912291807c25d5e8300d20b749f6be44a178d5c50f167d495f3315a";
        let bare = KeyMaterial::from_hex(hex_key).unwrap();
        let prefixed = KeyMaterial::from_hex(&format!("0x{hex_key}")).unwrap();
        assert_eq!(bare.to_bytes(), prefixed.to_bytes());
        assert_eq!(bare.address(), prefixed.address());
    }

    #[test]
    fn test_address_derivation_deterministic() {
        let hex_key = "0x495d5c34c912291807c25d5e8300d20b749f6be44a178d5c50f167d495f3315a";
        let addr1 = KeyMaterial::from_hex(hex_key).unwrap().address();
        let addr2 = KeyMaterial::from_hex(hex_key).unwrap().address();
        assert_eq!(addr1, addr2);
        assert_eq!(addr1.len(), 20);
    }

    #[test]
    fn test_address_known_vector() {
        // Private key 0x...01 has a well-known address
        let mut bytes = [0u8; PRIVATE_KEY_LENGTH];
        bytes[31] = 1;
        let key = KeyMaterial::from_bytes(&bytes).unwrap();

        let expected =
            Address::from_slice(&hex::decode("7e5f4552091a69125d5dfcb7b8c2659029395bdf").unwrap());
        assert_eq!(key.address(), expected);
    }

    #[test]
    fn test_zero_key_rejected() {
        let zero = [0u8; PRIVATE_KEY_LENGTH];
        assert_eq!(
            KeyMaterial::from_bytes(&zero).unwrap_err(),
            KeyError::InvalidPrivateKey
        );
    }

    #[test]
    fn test_key_at_or_above_curve_order_rejected() {
        // secp256k1 group order n
        let order =
            hex::decode("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141")
                .unwrap();
        let order: [u8; 32] = order.try_into().unwrap();
        assert!(KeyMaterial::from_bytes(&order).is_err());

        // n - 1 is the largest valid scalar
        let mut below = order;
        below[31] -= 1;
        assert!(KeyMaterial::from_bytes(&below).is_ok());
    }

    #[test]
    fn test_from_hex_malformed() {
        assert!(KeyMaterial::from_hex("not hex").is_err());
        assert!(KeyMaterial::from_hex("0xabcd").is_err()); // too short
    }

    #[test]
    fn test_uncompressed_public_key_prefix() {
        let key = KeyMaterial::generate(&mut rand::thread_rng());
        let uncompressed = key.public_key_uncompressed();
        assert_eq!(uncompressed[0], 0x04);

        let compressed = key.public_key_compressed();
        assert!(compressed[0] == 0x02 || compressed[0] == 0x03);
    }

    #[test]
    fn test_debug_output_redacted() {
        let mut bytes = [0xAB_u8; PRIVATE_KEY_LENGTH];
        bytes[0] = 0x01; // keep below curve order
        let key = KeyMaterial::from_bytes(&bytes).unwrap();

        let debug = format!("{:?}", key);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(&hex::encode(key.to_bytes())));
    }
}
