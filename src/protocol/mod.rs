//! Core protocol types and the pure fairness primitives
//!
//! Everything in this module is a pure function of its inputs (apart from the
//! sampler's draws from an injected random source). The only mutable protocol
//! entity, the round, lives in [`crate::gaming`].

pub mod derive;
pub mod messages;
pub mod sampler;
pub mod verifier;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use derive::RollDeriver;
pub use sampler::{roll_from_byte, FairDieSampler, REJECTION_THRESHOLD};
pub use verifier::{CommitmentVerifier, DerivedClaims, GuessClaims};

/// A die face in 1..=6
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Roll(u8);

impl Roll {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;

    pub fn new(value: u8) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(Error::InvalidData(format!(
                "Invalid roll value: {}, must be 1-6",
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Roll {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Roll> for u8 {
    fn from(roll: Roll) -> u8 {
        roll.0
    }
}

impl fmt::Display for Roll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Party role, used as the domain-separation label when deriving rolls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Server,
    Client,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Server => "server",
            Role::Client => "client",
        }
    }
}

/// Final result of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    ClientWin,
    ServerWin,
    Tie,
    Expired,
}

impl Outcome {
    /// Compare the two rolls. The higher roll wins; equal rolls tie.
    pub fn decide(server_roll: Roll, client_roll: Roll) -> Self {
        match server_roll.cmp(&client_roll) {
            std::cmp::Ordering::Greater => Outcome::ServerWin,
            std::cmp::Ordering::Equal => Outcome::Tie,
            std::cmp::Ordering::Less => Outcome::ClientWin,
        }
    }

    /// Wire label
    pub fn label(self) -> &'static str {
        match self {
            Outcome::ClientWin => "CLIENT_WIN",
            Outcome::ServerWin => "SERVER_WIN",
            Outcome::Tie => "TIE",
            Outcome::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Outcome {
    type Err = Error;

    /// Any label outside the four known values is a protocol violation
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CLIENT_WIN" => Ok(Outcome::ClientWin),
            "SERVER_WIN" => Ok(Outcome::ServerWin),
            "TIE" => Ok(Outcome::Tie),
            "EXPIRED" => Ok(Outcome::Expired),
            other => Err(Error::ProtocolViolation(format!(
                "unknown outcome label: {:?}",
                other
            ))),
        }
    }
}

/// Which commitment scheme a round runs.
///
/// The two schemes are not interchangeable and a round never mixes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Client commits to its nonce hash, server commits to its nonce hash,
    /// both rolls are derived from the two nonces. The canonical scheme.
    #[default]
    Derived,
    /// Client sends its nonce, server commits to `roll || nonces`, client
    /// submits a blind guess.
    Guess,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Derived => f.write_str("derived"),
            Variant::Guess => f.write_str("guess"),
        }
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "derived" | "derive" => Ok(Variant::Derived),
            "guess" => Ok(Variant::Guess),
            other => Err(Error::InvalidData(format!(
                "unknown protocol variant: {}",
                other
            ))),
        }
    }
}
