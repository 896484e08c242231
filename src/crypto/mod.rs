//! crypto module

pub mod commitment;
pub mod nonce;
pub mod random;

// Re-export commonly used types
pub use commitment::{Commitment, CommitmentHasher};
pub use nonce::{Nonce, NonceGenerator, HEX_LEN, NONCE_LEN};
pub use random::{OsRandom, SecureRandomSource, SeededRandom};
