//! Round nonces

use std::fmt;
use std::sync::Arc;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::random::SecureRandomSource;
use crate::error::{Error, Result};

/// Nonce size in bytes
pub const NONCE_LEN: usize = 32;

/// Length of a hex-encoded nonce or digest
pub const HEX_LEN: usize = NONCE_LEN * 2;

/// A 32-byte single-use round secret.
///
/// Wiped from memory when dropped. `Debug` never prints the value, since a
/// nonce is secret until its owner reveals it.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Nonce([u8; NONCE_LEN]);

impl Nonce {
    pub fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse the wire form: exactly 64 lowercase hex characters
    pub fn from_hex(s: &str) -> Result<Self> {
        Ok(Self(decode_hex32(s, "nonce")?))
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }

    /// Lowercase hex, two characters per byte
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl PartialEq for Nonce {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for Nonce {}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Nonce(<redacted>)")
    }
}

/// Decode a 64-character lowercase hex string into 32 bytes
pub(crate) fn decode_hex32(s: &str, what: &str) -> Result<[u8; 32]> {
    if s.len() != HEX_LEN {
        return Err(Error::InvalidData(format!(
            "{} must be {} hex characters, got {}",
            what,
            HEX_LEN,
            s.len()
        )));
    }
    if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return Err(Error::InvalidData(format!(
            "{} must be lowercase hexadecimal",
            what
        )));
    }

    let mut out = [0u8; 32];
    hex::decode_to_slice(s, &mut out)
        .map_err(|e| Error::InvalidData(format!("{}: {}", what, e)))?;
    Ok(out)
}

/// Produces fresh nonces from a shared secure source
#[derive(Clone)]
pub struct NonceGenerator {
    source: Arc<dyn SecureRandomSource>,
}

impl NonceGenerator {
    pub fn new(source: Arc<dyn SecureRandomSource>) -> Self {
        Self { source }
    }

    /// Draw a new nonce. Fails only if the entropy source is unavailable.
    pub fn generate(&self) -> Result<Nonce> {
        let mut bytes = [0u8; NONCE_LEN];
        self.source.fill(&mut bytes)?;
        let nonce = Nonce(bytes);
        bytes.zeroize();
        Ok(nonce)
    }
}

impl fmt::Debug for NonceGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonceGenerator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::random::{OsRandom, SeededRandom};

    #[test]
    fn test_generated_nonce_is_64_lowercase_hex() {
        let generator = NonceGenerator::new(Arc::new(OsRandom));
        let hex = generator.generate().unwrap().to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
    }

    #[test]
    fn test_consecutive_nonces_differ() {
        let generator = NonceGenerator::new(Arc::new(SeededRandom::from_u64(9)));
        assert_ne!(generator.generate().unwrap(), generator.generate().unwrap());
    }

    #[test]
    fn test_hex_round_trip() {
        let nonce = Nonce::from_bytes([0xab; 32]);
        assert_eq!(nonce.to_hex(), "ab".repeat(32));
        assert_eq!(Nonce::from_hex(&nonce.to_hex()).unwrap(), nonce);
    }

    #[test]
    fn test_from_hex_rejects_malformed() {
        assert!(Nonce::from_hex("aa").is_err());
        assert!(Nonce::from_hex(&"AA".repeat(32)).is_err());
        assert!(Nonce::from_hex(&"zz".repeat(32)).is_err());
        assert!(Nonce::from_hex(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_debug_redacts_value() {
        let nonce = Nonce::from_bytes([0x11; 32]);
        assert!(!format!("{:?}", nonce).contains("11"));
    }
}
