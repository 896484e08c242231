//! Client-side round driver
//!
//! Runs one round per call through commit, counter-move, reveal and
//! verification. Each exchange with the house is bounded by the configured
//! request timeout. Failures of the exchange (errors, timeouts, malformed
//! replies) end the round as EXPIRED and return it; only an environment
//! failure (no entropy) aborts with `Err`. An EXPIRED label from the house is
//! honoured only after its reveal verifies.
//!
//! Rounds are independent: `play*` takes `&self`, so one orchestrator can run
//! several rounds concurrently. Dropping a `play*` future mid-flight drops
//! the round with it, which wipes the client's nonce.

use std::future::Future;
use std::sync::Arc;

use super::round::Round;
use crate::config::ProtocolConfig;
use crate::crypto::{Commitment, CommitmentHasher, Nonce, NonceGenerator, SecureRandomSource};
use crate::error::{Error, Result};
use crate::protocol::messages::{
    GuessRequest, GuessResponse, InitiateDerivedRequest, InitiateGuessRequest, RevealRequest,
    RevealResponse,
};
use crate::protocol::{FairDieSampler, Outcome, Roll, Variant};
use crate::transport::DealerTransport;

/// Parsed derived-variant reveal
struct DerivedReveal {
    outcome: Outcome,
    server_nonce: Nonce,
    server_roll: Roll,
    client_roll: Roll,
}

impl TryFrom<&RevealResponse> for DerivedReveal {
    type Error = Error;

    fn try_from(response: &RevealResponse) -> Result<Self> {
        Ok(Self {
            outcome: response.outcome()?,
            server_nonce: response.server_nonce()?,
            server_roll: response.server_roll()?,
            client_roll: response.client_roll()?,
        })
    }
}

/// Parsed guess-variant reveal
struct GuessReveal {
    outcome: Outcome,
    server_nonce: Nonce,
    server_roll: Roll,
}

impl TryFrom<&GuessResponse> for GuessReveal {
    type Error = Error;

    fn try_from(response: &GuessResponse) -> Result<Self> {
        Ok(Self {
            outcome: response.outcome()?,
            server_nonce: response.server_nonce()?,
            server_roll: response.server_roll()?,
        })
    }
}

/// Expire the round for exchange failures; abort for anything else
fn expire_or_abort(mut round: Round, err: Error) -> Result<Round> {
    if err.expires_round() {
        round.expire(err.to_string());
        Ok(round)
    } else {
        Err(err)
    }
}

pub struct RoundOrchestrator<T> {
    transport: T,
    nonces: NonceGenerator,
    sampler: FairDieSampler,
    config: ProtocolConfig,
}

impl<T: DealerTransport> RoundOrchestrator<T> {
    pub fn new(transport: T, source: Arc<dyn SecureRandomSource>, config: ProtocolConfig) -> Self {
        Self {
            transport,
            nonces: NonceGenerator::new(source.clone()),
            sampler: FairDieSampler::new(source).with_max_draws(config.max_redraws),
            config,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Play one round with the configured variant
    pub async fn play(&self) -> Result<Round> {
        match self.config.variant {
            Variant::Derived => self.play_derived().await,
            Variant::Guess => self.play_guess().await,
        }
    }

    async fn exchange<R>(
        &self,
        endpoint: &'static str,
        call: impl Future<Output = Result<R>>,
    ) -> Result<R> {
        match tokio::time::timeout(self.config.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(
                    endpoint,
                    timeout = ?self.config.request_timeout,
                    "exchange timed out"
                );
                Err(Error::Timeout(self.config.request_timeout))
            }
        }
    }

    /// Derived variant: commit to a nonce hash, reveal the nonce, re-derive
    /// both rolls from the two nonces.
    pub async fn play_derived(&self) -> Result<Round> {
        let client_nonce = self.nonces.generate()?;
        let client_commitment = CommitmentHasher::commit_nonce(&client_nonce);
        let reveal_request = RevealRequest::new(&client_nonce);
        let mut round = Round::new(Variant::Derived, client_nonce, None);

        let initiated = self
            .exchange(
                "initiate",
                self.transport
                    .initiate_derived(InitiateDerivedRequest::new(&client_commitment)),
            )
            .await
            .and_then(|response| Ok((response.game_id, response.server_commitment()?)));
        let (game_id, server_commitment): (_, Commitment) = match initiated {
            Ok(initiated) => initiated,
            Err(err) => return expire_or_abort(round, err),
        };
        round.record_commitment(game_id, server_commitment);

        let revealed = self
            .exchange("reveal", self.transport.reveal(game_id, reveal_request))
            .await;
        let response = match revealed {
            Ok(response) => response,
            Err(err) => return expire_or_abort(round, err),
        };
        round.record_counter_move();

        let reveal = match DerivedReveal::try_from(&response) {
            Ok(reveal) => reveal,
            Err(err) => return expire_or_abort(round, err),
        };
        round.record_reveal(
            reveal.server_nonce,
            reveal.server_roll,
            Some(reveal.client_roll),
            reveal.outcome,
        );
        round.conclude();
        Ok(round)
    }

    /// Guess variant: send the nonce, receive a commitment to the house
    /// roll, submit a fairly sampled guess, check the opened commitment.
    pub async fn play_guess(&self) -> Result<Round> {
        let client_nonce = self.nonces.generate()?;
        let guess = self.sampler.sample()?;
        let initiate_request = InitiateGuessRequest::new(&client_nonce);
        let mut round = Round::new(Variant::Guess, client_nonce, Some(guess));

        let initiated = self
            .exchange("initiate", self.transport.initiate_guess(initiate_request))
            .await
            .and_then(|response| Ok((response.game_id, response.hash_commitment()?)));
        let (game_id, hash_commitment) = match initiated {
            Ok(initiated) => initiated,
            Err(err) => return expire_or_abort(round, err),
        };
        round.record_commitment(game_id, hash_commitment);

        let answered = self
            .exchange("guess", self.transport.guess(game_id, GuessRequest::new(guess)))
            .await;
        let response = match answered {
            Ok(response) => response,
            Err(err) => return expire_or_abort(round, err),
        };
        round.record_counter_move();

        let reveal = match GuessReveal::try_from(&response) {
            Ok(reveal) => reveal,
            Err(err) => return expire_or_abort(round, err),
        };
        round.record_reveal(reveal.server_nonce, reveal.server_roll, None, reveal.outcome);
        round.conclude();
        Ok(round)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DealerConfig;
    use crate::crypto::SeededRandom;
    use crate::gaming::{Dealer, RoundState};
    use crate::protocol::messages::{GameId, InitiateDerivedResponse, InitiateGuessResponse};
    use crate::transport::LocalDealer;
    use async_trait::async_trait;
    use std::time::Duration;
    use uuid::Uuid;

    fn orchestrator(seed: u64) -> RoundOrchestrator<LocalDealer> {
        let dealer = Dealer::new(Arc::new(SeededRandom::from_u64(seed)), DealerConfig::default());
        RoundOrchestrator::new(
            LocalDealer::new(Arc::new(dealer), Uuid::new_v4()),
            Arc::new(SeededRandom::from_u64(seed + 1)),
            ProtocolConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_honest_derived_round_verifies() {
        let round = orchestrator(11).play_derived().await.unwrap();
        assert_eq!(round.state(), RoundState::Verified);
        let (server, client) = round.verified_rolls().unwrap();
        assert_eq!(round.outcome(), Some(Outcome::decide(server, client)));
    }

    #[tokio::test]
    async fn test_honest_guess_round_verifies() {
        let round = orchestrator(12).play_guess().await.unwrap();
        assert_eq!(round.state(), RoundState::Verified);
        assert!(round.outcome().is_some());
    }

    /// House that never answers
    struct SilentHouse;

    #[async_trait]
    impl DealerTransport for SilentHouse {
        async fn initiate_derived(
            &self,
            _: InitiateDerivedRequest,
        ) -> Result<InitiateDerivedResponse> {
            std::future::pending().await
        }

        async fn reveal(&self, _: GameId, _: RevealRequest) -> Result<RevealResponse> {
            std::future::pending().await
        }

        async fn initiate_guess(&self, _: InitiateGuessRequest) -> Result<InitiateGuessResponse> {
            std::future::pending().await
        }

        async fn guess(&self, _: GameId, _: GuessRequest) -> Result<GuessResponse> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_expires_round() {
        let config = ProtocolConfig {
            request_timeout: Duration::from_millis(50),
            ..ProtocolConfig::default()
        };
        let orchestrator =
            RoundOrchestrator::new(SilentHouse, Arc::new(SeededRandom::from_u64(1)), config);

        let round = orchestrator.play().await.unwrap();
        assert_eq!(round.state(), RoundState::Expired);
        assert_eq!(round.outcome(), Some(Outcome::Expired));
        assert!(round.verified_rolls().is_none());
        assert!(round.expiry_reason().unwrap().contains("timed out"));
    }
}
