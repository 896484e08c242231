//! Transport between the client engine and the house
//!
//! The engine never speaks HTTP itself; a host application implements
//! [`DealerTransport`] over whatever RPC it uses. [`LocalDealer`] connects to
//! an in-process [`Dealer`] and pushes every message through JSON, so the
//! wire encoding is exercised exactly as it would be over a network.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::gaming::{Dealer, PlayerId};
use crate::protocol::messages::{
    GameId, GuessRequest, GuessResponse, InitiateDerivedRequest, InitiateDerivedResponse,
    InitiateGuessRequest, InitiateGuessResponse, RevealRequest, RevealResponse,
};

/// The four house endpoints
///
/// Any `Err` is treated by the orchestrator as a failed exchange and expires
/// the round. Implementations must not retry on their own behalf unless the
/// house guarantees idempotent replies.
#[async_trait]
pub trait DealerTransport: Send + Sync {
    async fn initiate_derived(&self, request: InitiateDerivedRequest)
        -> Result<InitiateDerivedResponse>;

    async fn reveal(&self, game_id: GameId, request: RevealRequest) -> Result<RevealResponse>;

    async fn initiate_guess(&self, request: InitiateGuessRequest) -> Result<InitiateGuessResponse>;

    async fn guess(&self, game_id: GameId, request: GuessRequest) -> Result<GuessResponse>;
}

#[async_trait]
impl<T: DealerTransport + ?Sized> DealerTransport for Arc<T> {
    async fn initiate_derived(
        &self,
        request: InitiateDerivedRequest,
    ) -> Result<InitiateDerivedResponse> {
        (**self).initiate_derived(request).await
    }

    async fn reveal(&self, game_id: GameId, request: RevealRequest) -> Result<RevealResponse> {
        (**self).reveal(game_id, request).await
    }

    async fn initiate_guess(&self, request: InitiateGuessRequest) -> Result<InitiateGuessResponse> {
        (**self).initiate_guess(request).await
    }

    async fn guess(&self, game_id: GameId, request: GuessRequest) -> Result<GuessResponse> {
        (**self).guess(game_id, request).await
    }
}

/// HTTP-like status for a house error, as a remote client would see it
fn status_of(err: &Error) -> u16 {
    match err {
        Error::InvalidData(_) | Error::ProtocolViolation(_) => 400,
        Error::AccessDenied(_) => 403,
        Error::RoundNotFound(_) => 404,
        Error::InvalidState(_) => 409,
        _ => 500,
    }
}

/// Round-trip a value through its JSON encoding
fn over_wire<T: Serialize + DeserializeOwned>(value: &T) -> Result<T> {
    let bytes = serde_json::to_vec(value)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// In-process transport to a local house, acting as one player
#[derive(Clone)]
pub struct LocalDealer {
    dealer: Arc<Dealer>,
    player: PlayerId,
}

impl LocalDealer {
    pub fn new(dealer: Arc<Dealer>, player: PlayerId) -> Self {
        Self { dealer, player }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn dealer(&self) -> &Arc<Dealer> {
        &self.dealer
    }

    fn exchange<Req, Resp>(
        &self,
        endpoint: &str,
        request: &Req,
        handler: impl FnOnce(&Req) -> Result<Resp>,
    ) -> Result<Resp>
    where
        Req: Serialize + DeserializeOwned,
        Resp: Serialize + DeserializeOwned,
    {
        let request = over_wire(request)?;
        match handler(&request) {
            Ok(response) => over_wire(&response),
            Err(err) => {
                let status = status_of(&err);
                tracing::debug!(endpoint, status, error = %err, "house rejected request");
                Err(Error::Transport(format!("{} returned {}: {}", endpoint, status, err)))
            }
        }
    }
}

#[async_trait]
impl DealerTransport for LocalDealer {
    async fn initiate_derived(
        &self,
        request: InitiateDerivedRequest,
    ) -> Result<InitiateDerivedResponse> {
        self.exchange("POST /game", &request, |req| {
            self.dealer.initiate_derived(self.player, req)
        })
    }

    async fn reveal(&self, game_id: GameId, request: RevealRequest) -> Result<RevealResponse> {
        self.exchange("POST /game/{id}/reveal", &request, |req| {
            self.dealer.reveal(self.player, game_id, req)
        })
    }

    async fn initiate_guess(&self, request: InitiateGuessRequest) -> Result<InitiateGuessResponse> {
        self.exchange("POST /game", &request, |req| {
            self.dealer.initiate_guess(self.player, req)
        })
    }

    async fn guess(&self, game_id: GameId, request: GuessRequest) -> Result<GuessResponse> {
        self.exchange("POST /game/{id}/guess", &request, |req| {
            self.dealer.guess(self.player, game_id, req)
        })
    }
}
