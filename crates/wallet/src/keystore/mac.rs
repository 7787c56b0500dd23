//! keccak256 MAC for keystore integrity verification
//!
//! The MAC is computed over: derived_key[16..32] || ciphertext. A matching
//! MAC proves both that the password was correct and that the ciphertext has
//! not been tampered with.

use alloy_primitives::keccak256;

/// Compute the MAC over derived_key[16..32] || ciphertext.
///
/// The derived key must be at least 32 bytes (enforced by KDF parameter
/// validation before derivation).
pub fn compute_mac(derived_key: &[u8], ciphertext: &[u8]) -> [u8; 32] {
    let mut input = Vec::with_capacity(16 + ciphertext.len());
    input.extend_from_slice(&derived_key[16..32]);
    input.extend_from_slice(ciphertext);
    keccak256(&input).into()
}

/// Verify a MAC in constant time.
pub fn verify_mac(derived_key: &[u8], ciphertext: &[u8], expected: &[u8]) -> bool {
    let computed = compute_mac(derived_key, ciphertext);
    constant_time_eq(&computed, expected)
}

/// Constant-time comparison to prevent timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
