//! Legacy/EIP-155 transaction encoding and deterministic signing
//!
//! A `TransactionPayload` is canonically encoded with RLP, hashed with
//! keccak256, and signed with recoverable ECDSA over secp256k1. k256 uses
//! RFC 6979 deterministic nonces, so signing the same payload with the same
//! key always produces the same signature.
//!
//! With `chain_id` set, the signing payload and the resulting `v` follow
//! EIP-155 replay protection (`v = chain_id * 2 + 35 + recovery_id`);
//! without it, the pre-EIP-155 form (`v = 27 + recovery_id`) is used.

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rlp::{BufMut, Encodable, Header, EMPTY_STRING_CODE};
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;

use crate::error::TransactionError;
use crate::keys::KeyMaterial;

/// An unsigned transaction.
///
/// Gas price, gas limit, and nonce sourcing are the caller's concern; this
/// module only canonicalizes and signs what it is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionPayload {
    /// Account nonce
    pub nonce: u64,
    /// Gas price in wei
    pub gas_price: U256,
    /// Gas limit
    pub gas_limit: u64,
    /// Recipient; `None` creates a contract
    pub to: Option<Address>,
    /// Value in wei
    pub value: U256,
    /// Call data
    pub data: Bytes,
    /// EIP-155 chain id; `None` signs the pre-EIP-155 legacy form
    pub chain_id: Option<u64>,
}

impl TransactionPayload {
    /// Check that the payload fields are in valid range.
    pub fn validate(&self) -> Result<(), TransactionError> {
        if self.gas_limit == 0 {
            return Err(TransactionError::InvalidPayload(
                "gas limit must be nonzero".to_string(),
            ));
        }
        if self.chain_id == Some(0) {
            return Err(TransactionError::InvalidPayload(
                "chain id must be nonzero".to_string(),
            ));
        }
        Ok(())
    }

    /// Canonical RLP encoding of the signing payload.
    ///
    /// `rlp([nonce, gasPrice, gasLimit, to, value, data])`, extended with
    /// `[chainId, 0, 0]` when a chain id is set (EIP-155).
    pub fn encode_for_signing(&self) -> Vec<u8> {
        let mut payload_length = self.fields_length();
        if let Some(chain_id) = self.chain_id {
            payload_length += chain_id.length() + 2;
        }

        let mut out = Vec::with_capacity(payload_length + 3);
        Header {
            list: true,
            payload_length,
        }
        .encode(&mut out);
        self.encode_fields(&mut out);
        if let Some(chain_id) = self.chain_id {
            chain_id.encode(&mut out);
            0u8.encode(&mut out);
            0u8.encode(&mut out);
        }
        out
    }

    /// keccak256 of the canonical signing payload.
    pub fn signing_hash(&self) -> B256 {
        keccak256(self.encode_for_signing())
    }

    fn encode_fields(&self, out: &mut dyn BufMut) {
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas_limit.encode(out);
        match &self.to {
            Some(address) => address.encode(out),
            None => out.put_u8(EMPTY_STRING_CODE),
        }
        self.value.encode(out);
        self.data.encode(out);
    }

    fn fields_length(&self) -> usize {
        self.nonce.length()
            + self.gas_price.length()
            + self.gas_limit.length()
            + self.to.as_ref().map_or(1, Encodable::length)
            + self.value.length()
            + self.data.length()
    }
}

/// A recoverable ECDSA signature in Ethereum's v/r/s form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// Recovery value: `27 + recid` or `chain_id * 2 + 35 + recid`
    pub v: u64,
    /// First signature scalar
    pub r: U256,
    /// Second signature scalar (low-s normalized)
    pub s: U256,
}

impl Signature {
    fn from_recoverable(sig: &EcdsaSignature, recid: RecoveryId, chain_id: Option<u64>) -> Self {
        let bytes = sig.to_bytes();
        let v = match chain_id {
            Some(id) => id * 2 + 35 + recid.to_byte() as u64,
            None => 27 + recid.to_byte() as u64,
        };
        Self {
            v,
            r: U256::from_be_slice(&bytes[..32]),
            s: U256::from_be_slice(&bytes[32..]),
        }
    }

    /// Undo the EIP-155/legacy `v` offset back to a raw recovery id.
    fn recovery_id(&self, chain_id: Option<u64>) -> Result<RecoveryId, TransactionError> {
        let base = match chain_id {
            Some(id) => id * 2 + 35,
            None => 27,
        };
        self.v
            .checked_sub(base)
            .and_then(|b| u8::try_from(b).ok())
            .and_then(RecoveryId::from_byte)
            .ok_or_else(|| {
                TransactionError::Recovery(format!("v value {} does not match chain id", self.v))
            })
    }
}

/// A payload together with its signature, ready for RLP serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// The signed payload
    pub payload: TransactionPayload,
    /// The v/r/s signature
    pub signature: Signature,
}

impl SignedTransaction {
    /// Broadcastable RLP form:
    /// `rlp([nonce, gasPrice, gasLimit, to, value, data, v, r, s])`.
    pub fn rlp_encoded(&self) -> Vec<u8> {
        let payload_length = self.payload.fields_length()
            + self.signature.v.length()
            + self.signature.r.length()
            + self.signature.s.length();

        let mut out = Vec::with_capacity(payload_length + 3);
        Header {
            list: true,
            payload_length,
        }
        .encode(&mut out);
        self.payload.encode_fields(&mut out);
        self.signature.v.encode(&mut out);
        self.signature.r.encode(&mut out);
        self.signature.s.encode(&mut out);
        out
    }

    /// Transaction hash: keccak256 of the broadcastable encoding.
    pub fn hash(&self) -> B256 {
        keccak256(self.rlp_encoded())
    }
}

/// Sign a transaction payload with the given key.
///
/// Deterministic: identical key and payload always yield an identical
/// signature.
pub fn sign_transaction(
    key: &KeyMaterial,
    tx: &TransactionPayload,
) -> Result<SignedTransaction, TransactionError> {
    tx.validate()?;

    let hash = tx.signing_hash();
    let (sig, recid) = key
        .signing_key()
        .sign_prehash_recoverable(hash.as_slice())
        .map_err(|e| TransactionError::Signing(e.to_string()))?;

    Ok(SignedTransaction {
        payload: tx.clone(),
        signature: Signature::from_recoverable(&sig, recid, tx.chain_id),
    })
}

/// Recover the signer address of a signed payload.
pub fn recover_signer(
    tx: &TransactionPayload,
    signature: &Signature,
) -> Result<Address, TransactionError> {
    let recid = signature.recovery_id(tx.chain_id)?;

    let r: [u8; 32] = signature.r.to_be_bytes();
    let s: [u8; 32] = signature.s.to_be_bytes();
    let sig = EcdsaSignature::from_scalars(r, s)
        .map_err(|e| TransactionError::Recovery(e.to_string()))?;

    let hash = tx.signing_hash();
    let verifying_key = VerifyingKey::recover_from_prehash(hash.as_slice(), &sig, recid)
        .map_err(|e| TransactionError::Recovery(e.to_string()))?;

    let encoded = verifying_key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    Ok(Address::from_slice(&hash[12..]))
}
