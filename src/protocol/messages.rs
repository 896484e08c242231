//! Wire messages exchanged with the house
//!
//! Field names follow the JSON bodies of the casino endpoints (camelCase).
//! Values coming from the peer are kept raw and parsed through accessor
//! methods, so a malformed field surfaces as a protocol violation instead of
//! being trusted or silently ignored.

use serde::{Deserialize, Serialize};

use super::{Outcome, Roll};
use crate::crypto::{Commitment, Nonce};
use crate::error::{Error, Result};

/// Round identifier issued by the house
pub type GameId = u64;

fn violation(field: &str, err: Error) -> Error {
    Error::ProtocolViolation(format!("{}: {}", field, err))
}

fn parse_roll(value: i32, field: &str) -> Result<Roll> {
    u8::try_from(value)
        .map_err(|_| Error::InvalidData(format!("Invalid roll value: {}", value)))
        .and_then(Roll::new)
        .map_err(|e| violation(field, e))
}

fn parse_nonce(value: &str, field: &str) -> Result<Nonce> {
    Nonce::from_hex(value).map_err(|e| violation(field, e))
}

fn parse_commitment(value: &str, field: &str) -> Result<Commitment> {
    Commitment::from_hex(value).map_err(|e| violation(field, e))
}

/// Derived variant, step 1: the client commits to its nonce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateDerivedRequest {
    pub client_nonce_hash: String,
}

impl InitiateDerivedRequest {
    pub fn new(commitment: &Commitment) -> Self {
        Self {
            client_nonce_hash: commitment.to_hex(),
        }
    }

    pub fn client_commitment(&self) -> Result<Commitment> {
        parse_commitment(&self.client_nonce_hash, "clientNonceHash")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateDerivedResponse {
    pub game_id: GameId,
    pub server_nonce_hash: String,
}

impl InitiateDerivedResponse {
    pub fn server_commitment(&self) -> Result<Commitment> {
        parse_commitment(&self.server_nonce_hash, "serverNonceHash")
    }
}

/// Derived variant, step 2: the client reveals its nonce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealRequest {
    pub client_nonce: String,
}

impl RevealRequest {
    pub fn new(nonce: &Nonce) -> Self {
        Self {
            client_nonce: nonce.to_hex(),
        }
    }

    pub fn client_nonce(&self) -> Result<Nonce> {
        parse_nonce(&self.client_nonce, "clientNonce")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealResponse {
    pub game_outcome: String,
    pub server_roll: i32,
    pub client_roll: i32,
    pub server_nonce: String,
}

impl RevealResponse {
    pub fn outcome(&self) -> Result<Outcome> {
        self.game_outcome.parse()
    }

    pub fn server_roll(&self) -> Result<Roll> {
        parse_roll(self.server_roll, "serverRoll")
    }

    pub fn client_roll(&self) -> Result<Roll> {
        parse_roll(self.client_roll, "clientRoll")
    }

    pub fn server_nonce(&self) -> Result<Nonce> {
        parse_nonce(&self.server_nonce, "serverNonce")
    }
}

/// Guess variant, step 1: the client sends its nonce in the clear
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateGuessRequest {
    pub client_nonce: String,
}

impl InitiateGuessRequest {
    pub fn new(nonce: &Nonce) -> Self {
        Self {
            client_nonce: nonce.to_hex(),
        }
    }

    pub fn client_nonce(&self) -> Result<Nonce> {
        parse_nonce(&self.client_nonce, "clientNonce")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateGuessResponse {
    pub game_id: GameId,
    pub hash_commitment: String,
}

impl InitiateGuessResponse {
    pub fn hash_commitment(&self) -> Result<Commitment> {
        parse_commitment(&self.hash_commitment, "hashCommitment")
    }
}

/// Guess variant, step 2: the client submits its blind guess
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessRequest {
    pub client_roll: i32,
}

impl GuessRequest {
    pub fn new(roll: Roll) -> Self {
        Self {
            client_roll: i32::from(roll.value()),
        }
    }

    pub fn client_roll(&self) -> Result<Roll> {
        parse_roll(self.client_roll, "clientRoll")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessResponse {
    pub game_outcome: String,
    pub server_roll: i32,
    pub server_nonce: String,
}

impl GuessResponse {
    pub fn outcome(&self) -> Result<Outcome> {
        self.game_outcome.parse()
    }

    pub fn server_roll(&self) -> Result<Roll> {
        parse_roll(self.server_roll, "serverRoll")
    }

    pub fn server_nonce(&self) -> Result<Nonce> {
        parse_nonce(&self.server_nonce, "serverNonce")
    }
}
