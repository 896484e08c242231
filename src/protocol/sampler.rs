//! Unbiased die sampling
//!
//! A byte has 256 values, which is not a multiple of 6: `byte % 6` would give
//! faces 1-4 a 43/256 chance and faces 5-6 only 42/256. Bytes at or above 252
//! (the largest multiple of 6 not exceeding 256) are thrown away and redrawn,
//! leaving each face exactly 42/252.

use std::sync::Arc;

use super::Roll;
use crate::crypto::SecureRandomSource;
use crate::error::{Error, Result};

/// Bytes at or above this value are rejected
pub const REJECTION_THRESHOLD: u8 = 252;

/// Default number of consecutive rejections before giving up
pub const DEFAULT_MAX_DRAWS: u32 = 1024;

/// Map one uniform byte to a face, or `None` if the byte must be redrawn
pub fn roll_from_byte(byte: u8) -> Option<Roll> {
    if byte >= REJECTION_THRESHOLD {
        return None;
    }
    Some(Roll((byte % 6) + 1))
}

/// Rejection sampler over a secure random source
#[derive(Clone)]
pub struct FairDieSampler {
    source: Arc<dyn SecureRandomSource>,
    max_draws: u32,
}

impl FairDieSampler {
    pub fn new(source: Arc<dyn SecureRandomSource>) -> Self {
        Self {
            source,
            max_draws: DEFAULT_MAX_DRAWS,
        }
    }

    /// Cap on draws for a single sample
    pub fn with_max_draws(mut self, max_draws: u32) -> Self {
        self.max_draws = max_draws.max(1);
        self
    }

    /// Draw a uniformly distributed face.
    ///
    /// The expected redraw rate is 4/256. A source that keeps producing
    /// rejected bytes for `max_draws` draws is treated as broken.
    pub fn sample(&self) -> Result<Roll> {
        let mut byte = [0u8; 1];
        for _ in 0..self.max_draws {
            self.source.fill(&mut byte)?;
            if let Some(roll) = roll_from_byte(byte[0]) {
                return Ok(roll);
            }
            tracing::trace!(byte = byte[0], "rejected biased byte, redrawing");
        }

        Err(Error::Environment(format!(
            "random source produced {} consecutive rejected bytes",
            self.max_draws
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Replays a fixed byte sequence
    struct ScriptedSource(Mutex<VecDeque<u8>>);

    impl ScriptedSource {
        fn new(bytes: &[u8]) -> Arc<Self> {
            Arc::new(Self(Mutex::new(bytes.iter().copied().collect())))
        }

        fn remaining(&self) -> usize {
            self.0.lock().len()
        }
    }

    impl SecureRandomSource for ScriptedSource {
        fn fill(&self, dest: &mut [u8]) -> Result<()> {
            let mut queue = self.0.lock();
            for slot in dest.iter_mut() {
                *slot = queue
                    .pop_front()
                    .ok_or_else(|| Error::Environment("script exhausted".into()))?;
            }
            Ok(())
        }
    }

    #[test]
    fn test_boundary_bytes() {
        assert_eq!(roll_from_byte(0).unwrap().value(), 1);
        assert_eq!(roll_from_byte(5).unwrap().value(), 6);
        assert_eq!(roll_from_byte(251).unwrap().value(), 6);
        assert!(roll_from_byte(252).is_none());
        assert!(roll_from_byte(255).is_none());
    }

    #[test]
    fn test_rejected_byte_triggers_redraw() {
        let source = ScriptedSource::new(&[252, 251, 7]);
        let sampler = FairDieSampler::new(source.clone());

        assert_eq!(sampler.sample().unwrap().value(), 6);
        assert_eq!(source.remaining(), 1);
        assert_eq!(sampler.sample().unwrap().value(), 2);
    }

    #[test]
    fn test_every_face_gets_exactly_42_bytes() {
        let mut counts = [0u32; 6];
        for byte in 0..=u8::MAX {
            if let Some(roll) = roll_from_byte(byte) {
                counts[(roll.value() - 1) as usize] += 1;
            }
        }
        assert_eq!(counts, [42; 6]);
    }

    #[test]
    fn test_stalled_source_is_environment_failure() {
        let source = ScriptedSource::new(&[255; 8]);
        let sampler = FairDieSampler::new(source).with_max_draws(8);
        assert!(matches!(sampler.sample(), Err(Error::Environment(_))));
    }

    #[test]
    fn test_source_failure_propagates() {
        let sampler = FairDieSampler::new(ScriptedSource::new(&[]));
        assert!(matches!(sampler.sample(), Err(Error::Environment(_))));
    }
}
