//! Secret wrapper utilities for consistent secret handling
//!
//! Type aliases around the `secrecy` crate for sensitive strings and byte
//! arrays. Values are zeroized on drop and can only be read through
//! `expose_secret()`.

use secrecy::SecretBox;

pub use secrecy::ExposeSecret;

/// A secret byte buffer that is zeroized on drop.
///
/// Used for private keys, derived KDF output, and decrypted plaintext.
///
/// # Example
///
/// ```rust
/// use ethwallet::secure::{ExposeSecret, SecretBytes};
///
/// let secret = SecretBytes::new(Box::new(vec![1, 2, 3, 4]));
/// assert_eq!(secret.expose_secret(), &vec![1, 2, 3, 4]);
/// // Memory is zeroized when `secret` goes out of scope
/// ```
pub type SecretBytes = SecretBox<Vec<u8>>;

/// A secret string that is zeroized on drop.
///
/// Used for passwords and mnemonic phrases.
pub type SecretString = secrecy::SecretString;
