//! Command implementations for the Fairroll CLI

pub mod commands {
    use std::sync::Arc;

    use uuid::Uuid;

    use fairroll::config::Config;
    use fairroll::protocol::DerivedClaims;
    use fairroll::{
        Commitment, CommitmentHasher, CommitmentVerifier, Dealer, FairDieSampler, LocalDealer,
        Nonce, NonceGenerator, OsRandom, Outcome, Result, Roll, RollDeriver, RoundOrchestrator,
        RoundState, SecureRandomSource, Variant, VerificationFailure,
    };

    fn source() -> Arc<dyn SecureRandomSource> {
        Arc::new(OsRandom)
    }

    pub fn nonce_command() -> Result<()> {
        let nonce = NonceGenerator::new(source()).generate()?;
        println!("nonce:      {}", nonce.to_hex());
        println!("commitment: {}", CommitmentHasher::commit_nonce(&nonce));
        Ok(())
    }

    pub fn commit_command(nonce: &str) -> Result<()> {
        let nonce = Nonce::from_hex(nonce)?;
        println!("{}", CommitmentHasher::commit_nonce(&nonce));
        Ok(())
    }

    pub fn roll_command(config: &Config, count: u32) -> Result<()> {
        let sampler = FairDieSampler::new(source()).with_max_draws(config.protocol.max_redraws);
        let rolls = (0..count)
            .map(|_| sampler.sample().map(|r| r.to_string()))
            .collect::<Result<Vec<_>>>()?;
        println!("{}", rolls.join(" "));
        Ok(())
    }

    pub fn derive_command(server_nonce: &str, client_nonce: &str) -> Result<()> {
        let server_nonce = Nonce::from_hex(server_nonce)?;
        let client_nonce = Nonce::from_hex(client_nonce)?;
        let (server, client) = RollDeriver::derive_pair(&server_nonce, &client_nonce);

        println!("server roll: {}", server);
        println!("client roll: {}", client);
        println!("outcome:     {}", Outcome::decide(server, client));
        Ok(())
    }

    /// Returns whether the reveal verified
    pub fn verify_derived_command(
        server_nonce: &str,
        server_nonce_hash: &str,
        client_nonce: &str,
        server_roll: u8,
        client_roll: u8,
        outcome: Option<&str>,
    ) -> Result<bool> {
        let server_nonce = Nonce::from_hex(server_nonce)?;
        let commitment = Commitment::from_hex(server_nonce_hash)?;
        let client_nonce = Nonce::from_hex(client_nonce)?;
        let outcome = outcome.map(str::parse::<Outcome>).transpose()?;

        let claims = DerivedClaims {
            server_nonce_commitment: &commitment,
            server_nonce: &server_nonce,
            client_nonce: &client_nonce,
            server_roll: Roll::new(server_roll)?,
            client_roll: Roll::new(client_roll)?,
            outcome,
        };
        report(CommitmentVerifier::check_derived(&claims))
    }

    /// Returns whether the reveal verified
    pub fn verify_guess_command(
        server_roll: u8,
        server_nonce: &str,
        client_nonce: &str,
        commitment: &str,
    ) -> Result<bool> {
        let server_nonce = Nonce::from_hex(server_nonce)?;
        let client_nonce = Nonce::from_hex(client_nonce)?;
        let commitment = Commitment::from_hex(commitment)?;
        let server_roll = Roll::new(server_roll)?;

        let recomputed = CommitmentHasher::commit_roll(server_roll, &server_nonce, &client_nonce);
        println!("recomputed: {}", recomputed);
        let opens =
            CommitmentVerifier::verify_roll(server_roll, &server_nonce, &client_nonce, &commitment);
        let result = if opens {
            Ok(())
        } else {
            Err(VerificationFailure::RollCommitment)
        };
        report(result)
    }

    fn report(result: std::result::Result<(), VerificationFailure>) -> Result<bool> {
        match result {
            Ok(()) => {
                println!("verified: all commitments match");
                Ok(true)
            }
            Err(failure) => {
                println!("Commitment verification failed: {}", failure);
                Ok(false)
            }
        }
    }

    /// Play rounds against a local house; returns false if any round failed
    /// verification
    pub async fn play_command(
        config: &Config,
        variant: Option<Variant>,
        rounds: u32,
    ) -> Result<bool> {
        let dealer = Arc::new(Dealer::new(source(), config.dealer.clone()));
        let transport = LocalDealer::new(dealer.clone(), Uuid::new_v4());

        let mut protocol = config.protocol.clone();
        if let Some(variant) = variant {
            protocol.variant = variant;
        }
        println!("playing {} round(s), {} variant", rounds, protocol.variant);
        let orchestrator = RoundOrchestrator::new(transport.clone(), source(), protocol);

        let mut all_verified = true;
        for _ in 0..rounds {
            let round = orchestrator.play().await?;
            if round.state() == RoundState::VerificationFailed {
                all_verified = false;
            }
            println!("{}", round);
        }

        let history = dealer.recent(transport.player());
        if !history.is_empty() {
            println!();
            println!("recent games (house view):");
            for entry in history {
                println!(
                    "  #{:<4} client {} server {} {:<10} {}",
                    entry.game_id,
                    entry.client_roll.map(|r| r.to_string()).unwrap_or_else(|| "-".into()),
                    entry.server_roll.map(|r| r.to_string()).unwrap_or_else(|| "-".into()),
                    entry.outcome.label(),
                    entry.completed_at.format("%d/%m, %H:%M"),
                );
            }
        }
        Ok(all_verified)
    }
}
