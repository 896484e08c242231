//! Property-based tests for commitments, derivation and the round state machine

use proptest::prelude::*;

use fairroll::gaming::RoundEvent;
use fairroll::protocol::DerivedClaims;
use fairroll::{
    CommitmentHasher, CommitmentVerifier, Nonce, Outcome, Role, Roll, RollDeriver, RoundState,
    VerificationFailure,
};

fn arb_nonce() -> impl Strategy<Value = Nonce> {
    any::<[u8; 32]>().prop_map(Nonce::from_bytes)
}

fn arb_roll() -> impl Strategy<Value = Roll> {
    (1u8..=6).prop_map(|v| Roll::new(v).unwrap())
}

fn arb_event() -> impl Strategy<Value = RoundEvent> {
    prop_oneof![
        Just(RoundEvent::CommitmentsExchanged),
        Just(RoundEvent::CounterMoveSubmitted),
        Just(RoundEvent::RevealVerified),
        Just(RoundEvent::RevealRejected),
        Just(RoundEvent::TransportFailed),
    ]
}

proptest! {
    #[test]
    fn prop_hex_encoding_is_lossless(nonce in arb_nonce()) {
        let hex = nonce.to_hex();
        prop_assert_eq!(hex.len(), 64);
        prop_assert!(hex.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
        prop_assert_eq!(Nonce::from_hex(&hex).unwrap(), nonce);
    }

    #[test]
    fn prop_commitment_opens_only_with_its_nonce(a in arb_nonce(), b in arb_nonce()) {
        let commitment = CommitmentHasher::commit_nonce(&a);
        prop_assert!(CommitmentVerifier::verify_nonce(&a, &commitment));
        prop_assert_eq!(CommitmentVerifier::verify_nonce(&b, &commitment), a == b);
    }

    #[test]
    fn prop_derivation_is_deterministic(server in arb_nonce(), client in arb_nonce()) {
        let first = RollDeriver::derive_pair(&server, &client);
        let second = RollDeriver::derive_pair(&server.clone(), &client.clone());
        prop_assert_eq!(first, second);
        prop_assert_eq!(first.0, RollDeriver::derive(Role::Server, &server, &client));
        prop_assert_eq!(first.1, RollDeriver::derive(Role::Client, &server, &client));
    }

    #[test]
    fn prop_outcome_rule(server in arb_roll(), client in arb_roll()) {
        let expected = match server.value().cmp(&client.value()) {
            std::cmp::Ordering::Greater => Outcome::ServerWin,
            std::cmp::Ordering::Equal => Outcome::Tie,
            std::cmp::Ordering::Less => Outcome::ClientWin,
        };
        prop_assert_eq!(Outcome::decide(server, client), expected);
    }

    #[test]
    fn prop_honest_reveal_always_verifies(server in arb_nonce(), client in arb_nonce()) {
        let commitment = CommitmentHasher::commit_nonce(&server);
        let (server_roll, client_roll) = RollDeriver::derive_pair(&server, &client);
        let claims = DerivedClaims {
            server_nonce_commitment: &commitment,
            server_nonce: &server,
            client_nonce: &client,
            server_roll,
            client_roll,
            outcome: Some(Outcome::decide(server_roll, client_roll)),
        };
        prop_assert_eq!(CommitmentVerifier::check_derived(&claims), Ok(()));
    }

    #[test]
    fn prop_substituted_nonce_never_verifies(
        committed in arb_nonce(),
        revealed in arb_nonce(),
        client in arb_nonce(),
    ) {
        prop_assume!(committed != revealed);
        let commitment = CommitmentHasher::commit_nonce(&committed);
        let (server_roll, client_roll) = RollDeriver::derive_pair(&revealed, &client);
        let claims = DerivedClaims {
            server_nonce_commitment: &commitment,
            server_nonce: &revealed,
            client_nonce: &client,
            server_roll,
            client_roll,
            outcome: None,
        };
        prop_assert_eq!(
            CommitmentVerifier::check_derived(&claims),
            Err(VerificationFailure::NonceCommitment)
        );
    }

    #[test]
    fn prop_changed_roll_breaks_roll_commitment(
        roll in arb_roll(),
        other in arb_roll(),
        server in arb_nonce(),
        client in arb_nonce(),
    ) {
        prop_assume!(roll != other);
        let commitment = CommitmentHasher::commit_roll(roll, &server, &client);
        prop_assert!(CommitmentVerifier::verify_roll(roll, &server, &client, &commitment));
        prop_assert!(!CommitmentVerifier::verify_roll(other, &server, &client, &commitment));
    }

    #[test]
    fn prop_terminal_states_absorb(events in prop::collection::vec(arb_event(), 0..32)) {
        let mut state = RoundState::Init;
        let mut ended_in = None;
        for event in events {
            state = state.next(event);
            match ended_in {
                Some(terminal) => prop_assert_eq!(state, terminal),
                None if state.is_terminal() => ended_in = Some(state),
                None => {}
            }
        }
    }
}
