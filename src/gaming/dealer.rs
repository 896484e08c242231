//! In-memory house engine
//!
//! Plays the server side of both commitment schemes: issues commitments,
//! answers reveals and guesses, expires stale rounds and keeps a short
//! history per player. Completed rounds answer repeat requests with the stored
//! result, so a client retrying after a lost response sees the same outcome.
//!
//! Only the last `history_limit` completed rounds per player are retained;
//! older ones are evicted as new rounds complete. Rounds abandoned before
//! their counter-move are kept until one arrives, so this engine suits tests,
//! simulations and short-lived sessions rather than a long-running house.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::DealerConfig;
use crate::crypto::{Commitment, CommitmentHasher, Nonce, NonceGenerator, SecureRandomSource};
use crate::error::{Error, Result};
use crate::protocol::messages::{
    GameId, GuessRequest, GuessResponse, InitiateDerivedRequest, InitiateDerivedResponse,
    InitiateGuessRequest, InitiateGuessResponse, RevealRequest, RevealResponse,
};
use crate::protocol::{CommitmentVerifier, FairDieSampler, Outcome, Roll, RollDeriver, Variant};

/// Authenticated player identity, supplied by the host application
pub type PlayerId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameStatus {
    InProgress,
    Completed,
}

struct HouseRound {
    player: PlayerId,
    variant: Variant,
    server_nonce: Nonce,
    server_commitment: Commitment,
    /// Derived variant: the client's nonce hash from initiation
    client_commitment: Option<Commitment>,
    /// Guess variant: sent at initiation. Derived variant: sent at reveal.
    client_nonce: Option<Nonce>,
    server_roll: Option<Roll>,
    client_roll: Option<Roll>,
    status: GameStatus,
    outcome: Option<Outcome>,
    initiated_at: Instant,
    completed_at: Option<DateTime<Utc>>,
}

impl HouseRound {
    fn complete(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
        self.status = GameStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    fn outcome_label(&self) -> String {
        self.outcome.unwrap_or(Outcome::Expired).label().to_string()
    }

    fn roll_value(roll: Option<Roll>) -> i32 {
        roll.map(|r| i32::from(r.value())).unwrap_or(0)
    }

    fn reveal_response(&self) -> RevealResponse {
        RevealResponse {
            game_outcome: self.outcome_label(),
            server_roll: Self::roll_value(self.server_roll),
            client_roll: Self::roll_value(self.client_roll),
            server_nonce: self.server_nonce.to_hex(),
        }
    }

    fn guess_response(&self) -> GuessResponse {
        GuessResponse {
            game_outcome: self.outcome_label(),
            server_roll: Self::roll_value(self.server_roll),
            server_nonce: self.server_nonce.to_hex(),
        }
    }
}

/// A completed round as shown in a player's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub game_id: GameId,
    pub server_roll: Option<Roll>,
    pub client_roll: Option<Roll>,
    pub outcome: Outcome,
    pub completed_at: DateTime<Utc>,
}

pub struct Dealer {
    nonces: NonceGenerator,
    sampler: FairDieSampler,
    config: DealerConfig,
    rounds: Mutex<HashMap<GameId, HouseRound>>,
    next_id: AtomicU64,
}

impl Dealer {
    pub fn new(source: Arc<dyn SecureRandomSource>, config: DealerConfig) -> Self {
        Self {
            nonces: NonceGenerator::new(source.clone()),
            sampler: FairDieSampler::new(source),
            config,
            rounds: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn insert(&self, round: HouseRound) -> GameId {
        let game_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.rounds.lock().insert(game_id, round);
        game_id
    }

    /// Look up a round the player owns and run `f` on it under the lock
    fn with_round<T>(
        &self,
        player: PlayerId,
        game_id: GameId,
        variant: Variant,
        f: impl FnOnce(&mut HouseRound) -> Result<T>,
    ) -> Result<T> {
        let mut rounds = self.rounds.lock();
        let round = rounds
            .get_mut(&game_id)
            .ok_or(Error::RoundNotFound(game_id))?;
        if round.player != player {
            tracing::warn!(game_id, %player, "player tried to access another player's round");
            return Err(Error::AccessDenied(game_id));
        }
        if round.variant != variant {
            return Err(Error::InvalidState(format!(
                "round {} runs the {} variant",
                game_id, round.variant
            )));
        }
        f(round)
    }

    fn is_expired(&self, round: &HouseRound) -> bool {
        round.initiated_at.elapsed() > self.config.round_expiry
    }

    /// Derived variant, step 1
    pub fn initiate_derived(
        &self,
        player: PlayerId,
        request: &InitiateDerivedRequest,
    ) -> Result<InitiateDerivedResponse> {
        let client_commitment = request.client_commitment()?;
        let server_nonce = self.nonces.generate()?;
        let server_commitment = CommitmentHasher::commit_nonce(&server_nonce);

        let game_id = self.insert(HouseRound {
            player,
            variant: Variant::Derived,
            server_nonce,
            server_commitment,
            client_commitment: Some(client_commitment),
            client_nonce: None,
            server_roll: None,
            client_roll: None,
            status: GameStatus::InProgress,
            outcome: None,
            initiated_at: Instant::now(),
            completed_at: None,
        });
        tracing::info!(game_id, %player, "derived round initiated");

        Ok(InitiateDerivedResponse {
            game_id,
            server_nonce_hash: server_commitment.to_hex(),
        })
    }

    /// Derived variant, step 2: the client reveals, the house reveals back
    pub fn reveal(
        &self,
        player: PlayerId,
        game_id: GameId,
        request: &RevealRequest,
    ) -> Result<RevealResponse> {
        let client_nonce = request.client_nonce()?;

        let response = self.with_round(player, game_id, Variant::Derived, |round| {
            if round.status == GameStatus::Completed {
                return Ok(round.reveal_response());
            }

            let opens_commitment = round
                .client_commitment
                .as_ref()
                .map(|c| CommitmentVerifier::verify_nonce(&client_nonce, c))
                .unwrap_or(false);
            if !opens_commitment {
                tracing::warn!(game_id, "client nonce does not match its commitment");
                return Err(Error::InvalidData(
                    "client nonce does not match clientNonceHash".to_string(),
                ));
            }

            let (server_roll, client_roll) =
                RollDeriver::derive_pair(&round.server_nonce, &client_nonce);
            round.server_roll = Some(server_roll);
            round.client_roll = Some(client_roll);
            round.client_nonce = Some(client_nonce);

            let outcome = if self.is_expired(round) {
                Outcome::Expired
            } else {
                Outcome::decide(server_roll, client_roll)
            };
            round.complete(outcome);
            tracing::info!(game_id, %outcome, "derived round completed");

            Ok(round.reveal_response())
        })?;
        self.prune(player);
        Ok(response)
    }

    /// Guess variant, step 1: commit to a fair roll bound to both nonces
    pub fn initiate_guess(
        &self,
        player: PlayerId,
        request: &InitiateGuessRequest,
    ) -> Result<InitiateGuessResponse> {
        let client_nonce = request.client_nonce()?;
        let server_nonce = self.nonces.generate()?;
        let server_roll = self.sampler.sample()?;
        let hash_commitment =
            CommitmentHasher::commit_roll(server_roll, &server_nonce, &client_nonce);

        let game_id = self.insert(HouseRound {
            player,
            variant: Variant::Guess,
            server_nonce,
            server_commitment: hash_commitment,
            client_commitment: None,
            client_nonce: Some(client_nonce),
            server_roll: Some(server_roll),
            client_roll: None,
            status: GameStatus::InProgress,
            outcome: None,
            initiated_at: Instant::now(),
            completed_at: None,
        });
        tracing::info!(game_id, %player, "guess round initiated");

        Ok(InitiateGuessResponse {
            game_id,
            hash_commitment: hash_commitment.to_hex(),
        })
    }

    /// Guess variant, step 2: settle the client's guess and reveal
    pub fn guess(
        &self,
        player: PlayerId,
        game_id: GameId,
        request: &GuessRequest,
    ) -> Result<GuessResponse> {
        let client_roll = request.client_roll().map_err(|_| {
            Error::InvalidData("Client roll must be between 1 and 6.".to_string())
        })?;

        let response = self.with_round(player, game_id, Variant::Guess, |round| {
            if round.status == GameStatus::Completed {
                return Ok(round.guess_response());
            }

            let outcome = if self.is_expired(round) {
                Outcome::Expired
            } else {
                let server_roll = round
                    .server_roll
                    .ok_or_else(|| Error::InvalidState("guess round without a roll".into()))?;
                round.client_roll = Some(client_roll);
                Outcome::decide(server_roll, client_roll)
            };
            round.complete(outcome);
            tracing::info!(game_id, %outcome, "guess round completed");

            Ok(round.guess_response())
        })?;
        self.prune(player);
        Ok(response)
    }

    /// Forget the player's completed rounds that fell out of the history
    /// window. Evicted rounds no longer replay and answer `RoundNotFound`.
    fn prune(&self, player: PlayerId) {
        let mut rounds = self.rounds.lock();
        let mut completed: Vec<(DateTime<Utc>, GameId)> = rounds
            .iter()
            .filter(|(_, r)| r.player == player && r.status == GameStatus::Completed)
            .filter_map(|(&game_id, r)| r.completed_at.map(|at| (at, game_id)))
            .collect();
        if completed.len() <= self.config.history_limit {
            return;
        }

        completed.sort_unstable_by(|a, b| b.cmp(a));
        for (_, game_id) in completed.drain(self.config.history_limit..) {
            rounds.remove(&game_id);
        }
        tracing::debug!(%player, retained = self.config.history_limit, "evicted old rounds");
    }

    /// The player's most recent completed rounds, newest first
    pub fn recent(&self, player: PlayerId) -> Vec<HistoryEntry> {
        let rounds = self.rounds.lock();
        let mut entries: Vec<HistoryEntry> = rounds
            .iter()
            .filter(|(_, r)| r.player == player && r.status == GameStatus::Completed)
            .filter_map(|(&game_id, r)| {
                Some(HistoryEntry {
                    game_id,
                    server_roll: r.server_roll,
                    client_roll: r.client_roll,
                    outcome: r.outcome?,
                    completed_at: r.completed_at?,
                })
            })
            .collect();

        entries.sort_by(|a, b| {
            b.completed_at
                .cmp(&a.completed_at)
                .then(b.game_id.cmp(&a.game_id))
        });
        entries.truncate(self.config.history_limit);
        entries
    }

    /// The commitment the house issued for a round, for audit
    pub fn commitment(&self, game_id: GameId) -> Option<Commitment> {
        self.rounds.lock().get(&game_id).map(|r| r.server_commitment)
    }
}
