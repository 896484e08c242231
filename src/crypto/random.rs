//! Secure random byte sources
//!
//! Everything that needs entropy in a round (nonces, the house roll) draws
//! through [`SecureRandomSource`], so a single shared source can serve many
//! concurrent rounds and tests can substitute a reproducible one.

use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::error::{Error, Result};

/// A cryptographically secure byte generator, safe to share between rounds
pub trait SecureRandomSource: Send + Sync {
    /// Fill `dest` entirely with random bytes.
    ///
    /// An error means the environment cannot provide entropy; callers treat
    /// it as fatal for the round.
    fn fill(&self, dest: &mut [u8]) -> Result<()>;
}

/// Operating system entropy (getrandom under the hood)
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl SecureRandomSource for OsRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| Error::Environment(format!("OS entropy unavailable: {}", e)))
    }
}

/// Seeded ChaCha20 source
///
/// Produces identical byte streams from the same seed. Intended for
/// simulations and tests, never for a live house.
#[derive(Debug)]
pub struct SeededRandom {
    inner: Mutex<ChaCha20Rng>,
}

impl SeededRandom {
    /// Create a new seeded source
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            inner: Mutex::new(ChaCha20Rng::from_seed(seed)),
        }
    }

    /// Seed from a small integer, handy for tests
    pub fn from_u64(seed: u64) -> Self {
        Self {
            inner: Mutex::new(ChaCha20Rng::seed_from_u64(seed)),
        }
    }
}

impl SecureRandomSource for SeededRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        self.inner.lock().fill_bytes(dest);
        Ok(())
    }
}
