//! Key derivation functions for V3 keystores
//!
//! The V3 format stores the KDF name and its parameters in the record, so a
//! decoder needs nothing but the record and the password. scrypt is the
//! default for encoding (N=262144 as produced by geth); PBKDF2-HMAC-SHA256
//! records are also decoded for interoperability.

use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::error::{KeystoreError, KeystoreResult};
use crate::secure::SecretBytes;

/// Standard scrypt cost parameters (geth defaults)
pub const SCRYPT_N: u32 = 262144; // 2^18
pub const SCRYPT_R: u32 = 8; // block size
pub const SCRYPT_P: u32 = 1; // parallelization

/// Standard PBKDF2 iteration count
pub const PBKDF2_C: u32 = 262144;

/// Derived key length in bytes
pub const DKLEN: usize = 32;

/// Salt length in bytes
pub const SALT_LENGTH: usize = 32;

/// PRF identifier for PBKDF2 records
pub const PRF_HMAC_SHA256: &str = "hmac-sha256";

/// KDF selection with cost parameters, used when encoding a record.
///
/// The salt is generated at encode time, not carried here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kdf {
    /// scrypt with CPU/memory cost `n` (power of two), block size `r`,
    /// parallelization `p`
    Scrypt { n: u32, r: u32, p: u32 },
    /// PBKDF2-HMAC-SHA256 with iteration count `c`
    Pbkdf2 { c: u32 },
}

impl Default for Kdf {
    fn default() -> Self {
        Kdf::Scrypt {
            n: SCRYPT_N,
            r: SCRYPT_R,
            p: SCRYPT_P,
        }
    }
}

impl Kdf {
    /// Attach a salt, producing the parameter block stored in the record.
    pub fn into_params(self, salt: Vec<u8>) -> KdfParams {
        match self {
            Kdf::Scrypt { n, r, p } => KdfParams::Scrypt {
                dklen: DKLEN as u32,
                n,
                r,
                p,
                salt: hex::encode(&salt),
            },
            Kdf::Pbkdf2 { c } => KdfParams::Pbkdf2 {
                dklen: DKLEN as u32,
                c,
                prf: PRF_HMAC_SHA256.to_string(),
                salt: hex::encode(&salt),
            },
        }
    }
}

/// KDF parameters as serialized in the record's `kdfparams` field.
///
/// Untagged: the variant is recognized by its fields (`n`/`r`/`p` for
/// scrypt, `c`/`prf` for PBKDF2); the sibling `kdf` name field is checked
/// against the variant during decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum KdfParams {
    /// scrypt parameters
    Scrypt {
        /// Derived key length in bytes
        dklen: u32,
        /// CPU/memory cost parameter (must be a power of 2)
        n: u32,
        /// Block size parameter
        r: u32,
        /// Parallelization parameter
        p: u32,
        /// Salt as hex string
        salt: String,
    },
    /// PBKDF2 parameters
    Pbkdf2 {
        /// Derived key length in bytes
        dklen: u32,
        /// Iteration count
        c: u32,
        /// Pseudo-random function identifier
        prf: String,
        /// Salt as hex string
        salt: String,
    },
}

impl KdfParams {
    /// The KDF name this parameter block belongs to.
    pub fn function(&self) -> &'static str {
        match self {
            KdfParams::Scrypt { .. } => "scrypt",
            KdfParams::Pbkdf2 { .. } => "pbkdf2",
        }
    }

    /// Validate the parameters.
    pub fn validate(&self) -> KeystoreResult<()> {
        match self {
            KdfParams::Scrypt {
                dklen,
                n,
                r,
                p,
                salt,
            } => {
                if (*dklen as usize) < DKLEN {
                    return Err(KeystoreError::InvalidKdfParams(format!(
                        "dklen must be at least {}",
                        DKLEN
                    )));
                }
                if *n <= 1 || !n.is_power_of_two() {
                    return Err(KeystoreError::InvalidKdfParams(
                        "n must be a power of 2 greater than 1".to_string(),
                    ));
                }
                if *r == 0 || *p == 0 {
                    return Err(KeystoreError::InvalidKdfParams(
                        "r and p must be positive".to_string(),
                    ));
                }
                hex::decode(salt).map_err(|e| {
                    KeystoreError::InvalidKdfParams(format!("invalid salt hex: {}", e))
                })?;
                Ok(())
            }
            KdfParams::Pbkdf2 {
                dklen,
                c,
                prf,
                salt,
            } => {
                if (*dklen as usize) < DKLEN {
                    return Err(KeystoreError::InvalidKdfParams(format!(
                        "dklen must be at least {}",
                        DKLEN
                    )));
                }
                if *c == 0 {
                    return Err(KeystoreError::InvalidKdfParams(
                        "c must be positive".to_string(),
                    ));
                }
                if prf != PRF_HMAC_SHA256 {
                    return Err(KeystoreError::UnsupportedKdf(format!("pbkdf2 prf {}", prf)));
                }
                hex::decode(salt).map_err(|e| {
                    KeystoreError::InvalidKdfParams(format!("invalid salt hex: {}", e))
                })?;
                Ok(())
            }
        }
    }

    /// Derive the symmetric key from the given password.
    ///
    /// CPU-bound and deliberately slow; callers in async contexts should go
    /// through the record-level `*_async` operations, which move this onto a
    /// blocking worker.
    pub fn derive_key(&self, password: &str) -> KeystoreResult<SecretBytes> {
        self.validate()?;
        match self {
            KdfParams::Scrypt {
                dklen,
                n,
                r,
                p,
                salt,
            } => {
                let salt = hex::decode(salt)
                    .map_err(|e| KeystoreError::InvalidKdfParams(e.to_string()))?;
                scrypt_derive_key(password, &salt, *n, *r, *p, *dklen as usize)
            }
            KdfParams::Pbkdf2 {
                dklen, c, salt, ..
            } => {
                let salt = hex::decode(salt)
                    .map_err(|e| KeystoreError::InvalidKdfParams(e.to_string()))?;
                let mut output = vec![0u8; *dklen as usize];
                pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, *c, &mut output);
                Ok(SecretBytes::new(Box::new(output)))
            }
        }
    }
}

/// Derive a key using the scrypt KDF.
pub fn scrypt_derive_key(
    password: &str,
    salt: &[u8],
    n: u32,
    r: u32,
    p: u32,
    dklen: usize,
) -> KeystoreResult<SecretBytes> {
    let log_n = n.trailing_zeros() as u8;

    let params = scrypt::Params::new(log_n, r, p, dklen)
        .map_err(|e| KeystoreError::InvalidKdfParams(e.to_string()))?;

    let mut output = vec![0u8; dklen];
    scrypt::scrypt(password.as_bytes(), salt, &params, &mut output)
        .map_err(|e| KeystoreError::Kdf(e.to_string()))?;

    Ok(SecretBytes::new(Box::new(output)))
}

/// Generate a random salt.
pub fn generate_salt() -> Vec<u8> {
    use rand::RngCore;
    let mut salt = vec![0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}
