//! The round aggregate and its state machine
//!
//! A round is seen from the client's side: "local" is the client, "peer" is
//! the house. Only the orchestrator mutates a round, and every mutation goes
//! through [`RoundState::next`], which is total over (state, event).

use std::fmt;

use crate::crypto::{Commitment, Nonce};
use crate::error::VerificationFailure;
use crate::protocol::messages::GameId;
use crate::protocol::{CommitmentVerifier, Outcome, Roll, Variant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundState {
    Init,
    Committed,
    AwaitingReveal,
    Verified,
    VerificationFailed,
    Expired,
}

/// Things that can happen to a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundEvent {
    /// Both first-move commitments are exchanged
    CommitmentsExchanged,
    /// The guess or the reveal request was accepted by the peer
    CounterMoveSubmitted,
    /// The peer's reveal passed verification
    RevealVerified,
    /// The peer's reveal contradicted its commitment
    RevealRejected,
    /// Network error, non-success response, malformed reply, timeout, or a
    /// verified reveal the peer labelled EXPIRED
    TransportFailed,
}

impl RoundState {
    pub const ALL: [RoundState; 6] = [
        RoundState::Init,
        RoundState::Committed,
        RoundState::AwaitingReveal,
        RoundState::Verified,
        RoundState::VerificationFailed,
        RoundState::Expired,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RoundState::Verified | RoundState::VerificationFailed | RoundState::Expired
        )
    }

    /// Transition function.
    ///
    /// Terminal states absorb every event. In a live state an event that does
    /// not belong there means the exchange is out of order, which expires
    /// the round like any other protocol violation.
    pub fn next(self, event: RoundEvent) -> RoundState {
        use RoundEvent::*;
        use RoundState::*;

        if self.is_terminal() {
            return self;
        }
        match (self, event) {
            (Init, CommitmentsExchanged) => Committed,
            (Committed, CounterMoveSubmitted) => AwaitingReveal,
            (AwaitingReveal, RevealVerified) => Verified,
            (AwaitingReveal, RevealRejected) => VerificationFailed,
            _ => Expired,
        }
    }
}

impl fmt::Display for RoundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoundState::Init => "INIT",
            RoundState::Committed => "COMMITTED",
            RoundState::AwaitingReveal => "AWAITING_REVEAL",
            RoundState::Verified => "VERIFIED",
            RoundState::VerificationFailed => "VERIFICATION_FAILED",
            RoundState::Expired => "EXPIRED",
        };
        f.write_str(name)
    }
}

/// One play of the game
#[derive(Debug)]
pub struct Round {
    variant: Variant,
    round_id: Option<GameId>,
    local_nonce: Option<Nonce>,
    peer_nonce: Option<Nonce>,
    peer_commitment: Option<Commitment>,
    local_roll: Option<Roll>,
    peer_roll: Option<Roll>,
    claimed_outcome: Option<Outcome>,
    outcome: Option<Outcome>,
    failure: Option<VerificationFailure>,
    expiry_reason: Option<String>,
    state: RoundState,
}

impl Round {
    /// A fresh round holding the client's secret (and, guess variant, its guess)
    pub(crate) fn new(variant: Variant, local_nonce: Nonce, local_roll: Option<Roll>) -> Self {
        Self {
            variant,
            round_id: None,
            local_nonce: Some(local_nonce),
            peer_nonce: None,
            peer_commitment: None,
            local_roll,
            peer_roll: None,
            claimed_outcome: None,
            outcome: None,
            failure: None,
            expiry_reason: None,
            state: RoundState::Init,
        }
    }

    fn apply(&mut self, event: RoundEvent) -> RoundState {
        let from = self.state;
        let to = from.next(event);
        if from.is_terminal() {
            tracing::warn!(
                round_id = ?self.round_id,
                state = %from,
                ?event,
                "event after round ended"
            );
            return from;
        }

        tracing::debug!(round_id = ?self.round_id, %from, %to, ?event, "round transition");
        self.state = to;
        if to == RoundState::Expired {
            self.scrub();
            self.outcome = Some(Outcome::Expired);
        }
        to
    }

    /// Drop secrets and every roll value; dropping a nonce wipes it
    fn scrub(&mut self) {
        self.local_nonce = None;
        self.peer_nonce = None;
        self.local_roll = None;
        self.peer_roll = None;
        self.claimed_outcome = None;
    }

    pub(crate) fn record_commitment(
        &mut self,
        round_id: GameId,
        commitment: Commitment,
    ) -> RoundState {
        self.round_id = Some(round_id);
        self.peer_commitment = Some(commitment);
        self.apply(RoundEvent::CommitmentsExchanged)
    }

    pub(crate) fn record_counter_move(&mut self) -> RoundState {
        self.apply(RoundEvent::CounterMoveSubmitted)
    }

    /// Store the peer's unverified reveal. `client_roll` is the house's claim
    /// about the client's roll in the derived variant; in the guess variant
    /// the client's roll is its own guess and is left untouched.
    pub(crate) fn record_reveal(
        &mut self,
        server_nonce: Nonce,
        server_roll: Roll,
        client_roll: Option<Roll>,
        claimed_outcome: Outcome,
    ) {
        self.peer_nonce = Some(server_nonce);
        self.peer_roll = Some(server_roll);
        if client_roll.is_some() {
            self.local_roll = client_roll;
        }
        self.claimed_outcome = Some(claimed_outcome);
    }

    /// Verify the recorded reveal and settle the round.
    ///
    /// This is the only path to a non-EXPIRED outcome. A reveal labelled
    /// EXPIRED is still verified first: a broken reveal fails verification
    /// whatever the label says.
    pub(crate) fn conclude(&mut self) -> RoundState {
        if self.state != RoundState::AwaitingReveal {
            return self.apply(RoundEvent::RevealVerified);
        }

        match CommitmentVerifier::check_round(self) {
            Ok(()) if self.claimed_outcome == Some(Outcome::Expired) => {
                self.expire("house reported the round as expired")
            }
            Ok(()) => {
                let (server, client) = match (self.peer_roll, self.local_roll) {
                    (Some(server), Some(client)) => (server, client),
                    _ => return self.expire("reveal incomplete"),
                };
                self.outcome = Some(Outcome::decide(server, client));
                self.apply(RoundEvent::RevealVerified)
            }
            Err(failure) => {
                self.failure = Some(failure);
                self.outcome = None;
                self.apply(RoundEvent::RevealRejected)
            }
        }
    }

    /// Give up on the round. Held secrets are discarded.
    pub(crate) fn expire(&mut self, reason: impl Into<String>) -> RoundState {
        if self.state.is_terminal() {
            return self.state;
        }
        let reason = reason.into();
        tracing::info!(round_id = ?self.round_id, %reason, "round expired");
        self.expiry_reason = Some(reason);
        self.apply(RoundEvent::TransportFailed)
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn round_id(&self) -> Option<GameId> {
        self.round_id
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Verified outcome, or `Expired`. `None` while live and after a
    /// verification failure.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// `(server, client)` rolls, available only once verified
    pub fn verified_rolls(&self) -> Option<(Roll, Roll)> {
        match (self.state, self.peer_roll, self.local_roll) {
            (RoundState::Verified, Some(server), Some(client)) => Some((server, client)),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&VerificationFailure> {
        self.failure.as_ref()
    }

    pub fn expiry_reason(&self) -> Option<&str> {
        self.expiry_reason.as_deref()
    }

    pub fn peer_commitment(&self) -> Option<&Commitment> {
        self.peer_commitment.as_ref()
    }

    pub(crate) fn local_nonce(&self) -> Option<&Nonce> {
        self.local_nonce.as_ref()
    }

    pub(crate) fn peer_nonce(&self) -> Option<&Nonce> {
        self.peer_nonce.as_ref()
    }

    pub(crate) fn local_roll(&self) -> Option<Roll> {
        self.local_roll
    }

    pub(crate) fn peer_roll(&self) -> Option<Roll> {
        self.peer_roll
    }

    pub(crate) fn claimed_outcome(&self) -> Option<Outcome> {
        self.claimed_outcome
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self
            .round_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        match self.state {
            RoundState::Verified => match (self.verified_rolls(), self.outcome) {
                (Some((server, client)), Some(outcome)) => write!(
                    f,
                    "round {}: {} (client {} vs server {}), verified",
                    id, outcome, client, server
                ),
                _ => write!(f, "round {}: VERIFIED", id),
            },
            RoundState::VerificationFailed => match &self.failure {
                Some(failure) => write!(
                    f,
                    "round {}: commitment verification failed: {}",
                    id, failure
                ),
                None => write!(f, "round {}: commitment verification failed", id),
            },
            RoundState::Expired => write!(
                f,
                "round {}: EXPIRED ({})",
                id,
                self.expiry_reason.as_deref().unwrap_or("no reason given")
            ),
            state => write!(f, "round {}: {}", id, state),
        }
    }
}
