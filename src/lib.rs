//! Fairroll - provably fair commit-reveal dice
//!
//! A client and an untrusted house each roll a die. Before anything is
//! revealed the house commits to its secret; afterwards the client recomputes
//! every commitment and roll from the revealed nonces and refuses to report
//! an outcome the house could have biased.
//!
//! - crypto: random sources, nonces and SHA-256 commitments
//! - protocol: rolls, outcomes, fair sampling, roll derivation, verification
//! - gaming: the round state machine, its orchestrator and the house engine
//! - transport: the seam to the house and an in-process loopback

pub mod config;
pub mod crypto;
pub mod error;
pub mod gaming;
pub mod logging;
pub mod protocol;
pub mod transport;

// Re-export commonly used types for easy access
pub use config::Config;
pub use crypto::{
    Commitment, CommitmentHasher, Nonce, NonceGenerator, OsRandom, SecureRandomSource,
    SeededRandom,
};
pub use error::{Error, ErrorCategory, Result, VerificationFailure};
pub use gaming::{Dealer, Round, RoundOrchestrator, RoundState};
pub use protocol::{
    CommitmentVerifier, FairDieSampler, Outcome, Role, Roll, RollDeriver, Variant,
};
pub use transport::{DealerTransport, LocalDealer};
