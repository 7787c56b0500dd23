//! V3 keystore record: encode/decode between key material and the
//! Web3 Secret Storage JSON format
//!
//! A record is self-describing: decoding needs only the record and the
//! password. The KDF parameters, cipher name, IV, and MAC all travel inside
//! the `crypto` block, so records produced here decrypt in geth and vice
//! versa.

use std::fs;
use std::path::Path;

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroizing;

use super::cipher::{decrypt_secret, encrypt_secret, generate_iv, CipherParams};
use super::error::{KeystoreError, KeystoreResult};
use super::kdf::{generate_salt, Kdf, KdfParams};
use super::mac::{compute_mac, verify_mac};
use crate::keys::{KeyMaterial, PRIVATE_KEY_LENGTH};
use crate::secure::SecretString;

/// Version number for Web3 Secret Storage keystores
pub const KEYSTORE_VERSION: u32 = 3;

/// The only cipher the V3 format defines
pub const CIPHER_AES_128_CTR: &str = "aes-128-ctr";

/// A V3 keystore record.
///
/// The private key never appears in plaintext; everything else (KDF
/// parameters, IV, MAC) is stored openly so the record is portable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeystoreRecord {
    /// Schema version (always 3)
    pub version: u32,
    /// Unique identifier
    pub id: String,
    /// EVM address of the stored key (lowercase hex, no 0x prefix).
    /// Optional: the standard's own test vectors omit it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// KDF, cipher, and MAC parameters plus the ciphertext
    pub crypto: CryptoBlock,
}

/// The record's `crypto` block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CryptoBlock {
    /// Cipher identifier (always "aes-128-ctr")
    pub cipher: String,
    /// Encrypted private key as hex string
    pub ciphertext: String,
    /// Cipher parameters (IV)
    pub cipherparams: CipherParams,
    /// KDF identifier ("scrypt" or "pbkdf2")
    pub kdf: String,
    /// KDF parameters
    pub kdfparams: KdfParams,
    /// keccak256(derived_key[16..32] || ciphertext) as hex string
    pub mac: String,
}

impl KeystoreRecord {
    /// Encrypt a key into a V3 record with the default scrypt parameters.
    ///
    /// CPU-bound (the KDF is deliberately slow); from async code use
    /// [`KeystoreRecord::encrypt_async`].
    pub fn encrypt(key: &KeyMaterial, password: &str) -> KeystoreResult<Self> {
        Self::encrypt_with_kdf(key, password, Kdf::default())
    }

    /// Encrypt a key into a V3 record with explicit KDF cost parameters.
    pub fn encrypt_with_kdf(key: &KeyMaterial, password: &str, kdf: Kdf) -> KeystoreResult<Self> {
        let salt = generate_salt();
        let iv = generate_iv();

        let kdfparams = kdf.into_params(salt);
        let derived_key = kdfparams.derive_key(password)?;
        let dk_bytes = derived_key.expose_secret();

        let secret = Zeroizing::new(key.to_bytes());
        let ciphertext = encrypt_secret(secret.as_ref(), dk_bytes, &iv)?;
        let mac = compute_mac(dk_bytes, &ciphertext);

        Ok(Self {
            version: KEYSTORE_VERSION,
            id: Uuid::new_v4().to_string(),
            address: Some(hex::encode(key.address())),
            crypto: CryptoBlock {
                cipher: CIPHER_AES_128_CTR.to_string(),
                ciphertext: hex::encode(&ciphertext),
                cipherparams: CipherParams::new(&iv),
                kdf: kdfparams.function().to_string(),
                kdfparams,
                mac: hex::encode(mac),
            },
        })
    }

    /// Decrypt the record and reconstruct the key material.
    ///
    /// CPU-bound (the KDF is deliberately slow); from async code use
    /// [`KeystoreRecord::decrypt_async`].
    ///
    /// # Errors
    ///
    /// `InvalidPassword` on MAC mismatch; `Corrupted` when the record is
    /// structurally wrong or the recovered bytes are not a valid key.
    pub fn decrypt(&self, password: &str) -> KeystoreResult<KeyMaterial> {
        if self.version != KEYSTORE_VERSION {
            return Err(KeystoreError::UnsupportedVersion(self.version));
        }
        if self.crypto.cipher != CIPHER_AES_128_CTR {
            return Err(KeystoreError::UnsupportedCipher(self.crypto.cipher.clone()));
        }
        // The kdf name must agree with the shape of kdfparams
        if self.crypto.kdf != self.crypto.kdfparams.function() {
            return Err(KeystoreError::Corrupted);
        }

        let derived_key = self.crypto.kdfparams.derive_key(password)?;
        let dk_bytes = derived_key.expose_secret();

        let ciphertext =
            hex::decode(&self.crypto.ciphertext).map_err(|_| KeystoreError::Corrupted)?;
        let mac = hex::decode(&self.crypto.mac).map_err(|_| KeystoreError::Corrupted)?;

        // MAC check comes before any decryption
        if !verify_mac(dk_bytes, &ciphertext, &mac) {
            return Err(KeystoreError::InvalidPassword);
        }

        let iv = self.crypto.cipherparams.iv_bytes()?;
        let plaintext = decrypt_secret(&ciphertext, dk_bytes, &iv)?;

        let secret: &[u8; PRIVATE_KEY_LENGTH] = plaintext
            .expose_secret()
            .as_slice()
            .try_into()
            .map_err(|_| KeystoreError::Corrupted)?;
        let key = KeyMaterial::from_bytes(secret).map_err(|_| KeystoreError::Corrupted)?;

        // When an address is recorded it must match the recovered key
        if let Some(stored) = &self.address {
            let stored = stored.strip_prefix("0x").unwrap_or(stored);
            let stored = hex::decode(stored).map_err(|_| KeystoreError::Corrupted)?;
            if stored.as_slice() != key.address().as_slice() {
                return Err(KeystoreError::Corrupted);
            }
        }

        Ok(key)
    }

    /// Encrypt on a blocking worker so the slow KDF does not stall the
    /// calling executor.
    pub async fn encrypt_async(key: &KeyMaterial, password: &str) -> KeystoreResult<Self> {
        Self::encrypt_with_kdf_async(key, password, Kdf::default()).await
    }

    /// Async variant of [`KeystoreRecord::encrypt_with_kdf`].
    pub async fn encrypt_with_kdf_async(
        key: &KeyMaterial,
        password: &str,
        kdf: Kdf,
    ) -> KeystoreResult<Self> {
        let secret = Zeroizing::new(key.to_bytes());
        let password = SecretString::from(password.to_string());

        tokio::task::spawn_blocking(move || {
            let key = KeyMaterial::from_bytes(&secret).map_err(|_| KeystoreError::Corrupted)?;
            Self::encrypt_with_kdf(&key, password.expose_secret(), kdf)
        })
        .await
        .map_err(|e| KeystoreError::TaskJoin(e.to_string()))?
    }

    /// Decrypt on a blocking worker so the slow KDF does not stall the
    /// calling executor.
    pub async fn decrypt_async(&self, password: &str) -> KeystoreResult<KeyMaterial> {
        let record = self.clone();
        let password = SecretString::from(password.to_string());

        tokio::task::spawn_blocking(move || record.decrypt(password.expose_secret()))
            .await
            .map_err(|e| KeystoreError::TaskJoin(e.to_string()))?
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> KeystoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse from a JSON string.
    ///
    /// Any structural problem is reported as `Corrupted`.
    pub fn from_json(json: &str) -> KeystoreResult<Self> {
        serde_json::from_str(json).map_err(|_| KeystoreError::Corrupted)
    }

    /// Save the record to a file with restricted permissions (0600).
    ///
    /// Creates parent directories if needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> KeystoreResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, &json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(path, permissions)?;
        }

        tracing::debug!(path = %path.display(), id = %self.id, "saved keystore");
        Ok(())
    }

    /// Load a record from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> KeystoreResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let record = Self::from_json(&contents)?;
        tracing::debug!(path = %path.display(), id = %record.id, "loaded keystore");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Light scrypt cost so the unit tests stay fast
    const TEST_KDF: Kdf = Kdf::Scrypt { n: 1024, r: 8, p: 1 };

    fn test_key() -> KeyMaterial {
        KeyMaterial::from_hex("495d5c34c912291807c25d5e8300d20b749f6be44a178d5c50f167d495f3315a")
            .unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = test_key();
        let record = KeystoreRecord::encrypt_with_kdf(&key, "p@$$w0rd~3", TEST_KDF).unwrap();

        assert_eq!(record.version, KEYSTORE_VERSION);
        assert_eq!(record.address, Some(hex::encode(key.address())));

        let decrypted = record.decrypt("p@$$w0rd~3").unwrap();
        assert_eq!(decrypted.to_bytes(), key.to_bytes());
        assert_eq!(decrypted.address(), key.address());
    }

    #[test]
    fn test_pbkdf2_roundtrip() {
        let key = test_key();
        let record =
            KeystoreRecord::encrypt_with_kdf(&key, "password", Kdf::Pbkdf2 { c: 1000 }).unwrap();

        assert_eq!(record.crypto.kdf, "pbkdf2");
        let decrypted = record.decrypt("password").unwrap();
        assert_eq!(decrypted.to_bytes(), key.to_bytes());
    }

    #[test]
    fn test_wrong_password_fails() {
        let record =
            KeystoreRecord::encrypt_with_kdf(&test_key(), "correct", TEST_KDF).unwrap();

        let result = record.decrypt("wrong");
        assert!(matches!(result, Err(KeystoreError::InvalidPassword)));
    }

    #[test]
    fn test_tampered_ciphertext_detected() {
        let record = KeystoreRecord::encrypt_with_kdf(&test_key(), "pw", TEST_KDF).unwrap();

        let mut ciphertext = hex::decode(&record.crypto.ciphertext).unwrap();
        ciphertext[0] ^= 0x01;
        let mut tampered = record.clone();
        tampered.crypto.ciphertext = hex::encode(&ciphertext);

        assert!(matches!(
            tampered.decrypt("pw"),
            Err(KeystoreError::InvalidPassword)
        ));
    }

    #[test]
    fn test_tampered_mac_detected() {
        let record = KeystoreRecord::encrypt_with_kdf(&test_key(), "pw", TEST_KDF).unwrap();

        let mut mac = hex::decode(&record.crypto.mac).unwrap();
        mac[31] ^= 0x80;
        let mut tampered = record.clone();
        tampered.crypto.mac = hex::encode(&mac);

        assert!(matches!(
            tampered.decrypt("pw"),
            Err(KeystoreError::InvalidPassword)
        ));
    }

    #[test]
    fn test_tampered_address_detected() {
        let record = KeystoreRecord::encrypt_with_kdf(&test_key(), "pw", TEST_KDF).unwrap();

        let mut tampered = record.clone();
        tampered.address = Some(hex::encode([0x11u8; 20]));

        assert!(matches!(
            tampered.decrypt("pw"),
            Err(KeystoreError::Corrupted)
        ));
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let mut record = KeystoreRecord::encrypt_with_kdf(&test_key(), "pw", TEST_KDF).unwrap();
        record.version = 4;

        assert!(matches!(
            record.decrypt("pw"),
            Err(KeystoreError::UnsupportedVersion(4))
        ));
    }

    #[test]
    fn test_kdf_name_mismatch_rejected() {
        let mut record = KeystoreRecord::encrypt_with_kdf(&test_key(), "pw", TEST_KDF).unwrap();
        record.crypto.kdf = "pbkdf2".to_string();

        assert!(matches!(
            record.decrypt("pw"),
            Err(KeystoreError::Corrupted)
        ));
    }

    #[test]
    fn test_unsupported_cipher_rejected() {
        let mut record = KeystoreRecord::encrypt_with_kdf(&test_key(), "pw", TEST_KDF).unwrap();
        record.crypto.cipher = "aes-256-gcm".to_string();

        assert!(matches!(
            record.decrypt("pw"),
            Err(KeystoreError::UnsupportedCipher(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let record = KeystoreRecord::encrypt_with_kdf(&test_key(), "pw", TEST_KDF).unwrap();

        let json = record.to_json().unwrap();
        let parsed = KeystoreRecord::from_json(&json).unwrap();
        assert_eq!(record, parsed);

        let decrypted = parsed.decrypt("pw").unwrap();
        assert_eq!(decrypted.to_bytes(), test_key().to_bytes());
    }

    #[test]
    fn test_malformed_json_is_corrupted() {
        assert!(matches!(
            KeystoreRecord::from_json("{\"version\": 3}"),
            Err(KeystoreError::Corrupted)
        ));
        assert!(matches!(
            KeystoreRecord::from_json("not json"),
            Err(KeystoreError::Corrupted)
        ));
    }

    #[test]
    fn test_record_ids_unique() {
        let key = test_key();
        let a = KeystoreRecord::encrypt_with_kdf(&key, "pw", TEST_KDF).unwrap();
        let b = KeystoreRecord::encrypt_with_kdf(&key, "pw", TEST_KDF).unwrap();

        assert_ne!(a.id, b.id);
        // Fresh salt and IV every time, so ciphertexts differ too
        assert_ne!(a.crypto.ciphertext, b.crypto.ciphertext);
    }

    #[test]
    fn test_save_and_load() {
        let record = KeystoreRecord::encrypt_with_kdf(&test_key(), "pw", TEST_KDF).unwrap();

        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("keys").join("wallet.json");

        record.save(&file_path).unwrap();
        assert!(file_path.exists());

        let loaded = KeystoreRecord::load(&file_path).unwrap();
        let decrypted = loaded.decrypt("pw").unwrap();
        assert_eq!(decrypted.to_bytes(), test_key().to_bytes());
    }

    #[test]
    #[cfg(unix)]
    fn test_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let record = KeystoreRecord::encrypt_with_kdf(&test_key(), "pw", TEST_KDF).unwrap();

        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("wallet.json");
        record.save(&file_path).unwrap();

        let metadata = fs::metadata(&file_path).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
    }

    // Official Web3 Secret Storage PBKDF2 test vector
    #[test]
    fn test_pbkdf2_standard_vector() {
        let json = r#"{
            "crypto": {
                "cipher": "aes-128-ctr",
                "cipherparams": { "iv": "6087dab2f9fdbbfaddc31a909735c1e6" },
                "ciphertext": "5318b4d5bcd28de64ee5559e671353e16f075ecae9f99c7a79a38af5f869aa46",
                "kdf": "pbkdf2",
                "kdfparams": {
                    "c": 262144,
                    "dklen": 32,
                    "prf": "hmac-sha256",
                    "salt": "ae3cd4e7013836a3df6bd7241b12db061dbe2c6785853cce422d148a624ce0bd"
                },
                "mac": "517ead924a9d0dc3124507e3393d175ce3ff7c1e96529c6c555ce9e51205e9b2"
            },
            "id": "3198bc9c-6672-5ab3-d995-4942343ae5b6",
            "version": 3
        }"#;

        let record = KeystoreRecord::from_json(json).unwrap();
        let key = record.decrypt("testpassword").unwrap();
        assert_eq!(
            hex::encode(key.to_bytes()),
            "7a28b5ba57c53603b0b07b56bba752f7784bf506fa95edc395f5cf6c7514fe9d"
        );

        assert!(matches!(
            record.decrypt("wrongpassword"),
            Err(KeystoreError::InvalidPassword)
        ));
    }

    // Official Web3 Secret Storage scrypt test vector. Runs the full
    // N=262144 derivation, so it is opt-in.
    #[test]
    #[ignore = "full-cost scrypt derivation"]
    fn test_scrypt_standard_vector() {
        let json = r#"{
            "crypto": {
                "cipher": "aes-128-ctr",
                "cipherparams": { "iv": "83dbcc02d8ccb40e466191a123791e0e" },
                "ciphertext": "d172bf743a674da9cdad04534d56926ef8358534d458fffccd4e6ad2fbde479c",
                "kdf": "scrypt",
                "kdfparams": {
                    "dklen": 32,
                    "n": 262144,
                    "r": 1,
                    "p": 8,
                    "salt": "ab0c7876052600dd703518d6fc3fe8984592145b591fc8fb5c6d43190334ba19"
                },
                "mac": "2103ac29920d71da29f15d75b4a16dbe95cfd7ff8faea1056c33131d846e3097"
            },
            "id": "3198bc9c-6672-5ab3-d995-4942343ae5b6",
            "version": 3
        }"#;

        let record = KeystoreRecord::from_json(json).unwrap();
        let key = record.decrypt("testpassword").unwrap();
        assert_eq!(
            hex::encode(key.to_bytes()),
            "7a28b5ba57c53603b0b07b56bba752f7784bf506fa95edc395f5cf6c7514fe9d"
        );
    }

    #[tokio::test]
    async fn test_async_roundtrip() {
        let key = test_key();
        let record = KeystoreRecord::encrypt_with_kdf_async(&key, "pw", TEST_KDF)
            .await
            .unwrap();

        let decrypted = record.decrypt_async("pw").await.unwrap();
        assert_eq!(decrypted.to_bytes(), key.to_bytes());

        assert!(matches!(
            record.decrypt_async("nope").await,
            Err(KeystoreError::InvalidPassword)
        ));
    }
}
