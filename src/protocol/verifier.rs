//! Independent re-verification of the server's reveal
//!
//! This is the trust boundary of the protocol: nothing the server says about
//! rolls or outcomes is accepted until it has been recomputed here from the
//! revealed nonces and checked against the commitment received before the
//! reveal. A failed check is a security signal, never a transport error.
//! Verification only reads; it never mutates the round.

use super::{Outcome, Roll, RollDeriver};
use crate::crypto::{Commitment, CommitmentHasher, Nonce};
use crate::error::VerificationFailure;
use crate::gaming::Round;
use crate::protocol::Variant;

type Check = std::result::Result<(), VerificationFailure>;

/// What the server committed to and then revealed in the derived variant
#[derive(Debug, Clone, Copy)]
pub struct DerivedClaims<'a> {
    pub server_nonce_commitment: &'a Commitment,
    pub server_nonce: &'a Nonce,
    /// The client's own nonce, held locally since the start of the round
    pub client_nonce: &'a Nonce,
    pub server_roll: Roll,
    pub client_roll: Roll,
    /// Outcome label the server computed, if it sent one
    pub outcome: Option<Outcome>,
}

/// What the server committed to and then revealed in the guess variant
#[derive(Debug, Clone, Copy)]
pub struct GuessClaims<'a> {
    pub hash_commitment: &'a Commitment,
    pub server_roll: Roll,
    pub server_nonce: &'a Nonce,
    pub client_nonce: &'a Nonce,
    /// The client's guess
    pub client_roll: Roll,
    pub outcome: Option<Outcome>,
}

pub struct CommitmentVerifier;

impl CommitmentVerifier {
    /// Does `nonce` open `commitment`?
    pub fn verify_nonce(nonce: &Nonce, commitment: &Commitment) -> bool {
        CommitmentHasher::commit_nonce(nonce) == *commitment
    }

    /// Does `roll` with both nonces open a guess-variant `commitment`?
    pub fn verify_roll(
        server_roll: Roll,
        server_nonce: &Nonce,
        client_nonce: &Nonce,
        commitment: &Commitment,
    ) -> bool {
        CommitmentHasher::commit_roll(server_roll, server_nonce, client_nonce) == *commitment
    }

    /// Check every claim of a derived-variant reveal
    pub fn check_derived(claims: &DerivedClaims<'_>) -> Check {
        if !Self::verify_nonce(claims.server_nonce, claims.server_nonce_commitment) {
            return Err(VerificationFailure::NonceCommitment);
        }

        let (server_roll, client_roll) =
            RollDeriver::derive_pair(claims.server_nonce, claims.client_nonce);
        if server_roll != claims.server_roll {
            return Err(VerificationFailure::ServerRoll {
                claimed: claims.server_roll,
                derived: server_roll,
            });
        }
        if client_roll != claims.client_roll {
            return Err(VerificationFailure::ClientRoll {
                claimed: claims.client_roll,
                derived: client_roll,
            });
        }

        Self::check_outcome(claims.outcome, server_roll, client_roll)
    }

    /// Check every claim of a guess-variant reveal
    pub fn check_guess(claims: &GuessClaims<'_>) -> Check {
        if !Self::verify_roll(
            claims.server_roll,
            claims.server_nonce,
            claims.client_nonce,
            claims.hash_commitment,
        ) {
            return Err(VerificationFailure::RollCommitment);
        }

        Self::check_outcome(claims.outcome, claims.server_roll, claims.client_roll)
    }

    fn check_outcome(claimed: Option<Outcome>, server_roll: Roll, client_roll: Roll) -> Check {
        let computed = Outcome::decide(server_roll, client_roll);
        match claimed {
            // EXPIRED makes no claim about the rolls
            Some(Outcome::Expired) => Ok(()),
            Some(claimed) if claimed != computed => {
                Err(VerificationFailure::OutcomeLabel { claimed, computed })
            }
            _ => Ok(()),
        }
    }

    /// Check a round whose reveal has been recorded
    pub fn check_round(round: &Round) -> Check {
        use VerificationFailure::MissingReveal;

        let commitment = round
            .peer_commitment()
            .ok_or(MissingReveal("server commitment"))?;
        let server_nonce = round.peer_nonce().ok_or(MissingReveal("server nonce"))?;
        let client_nonce = round.local_nonce().ok_or(MissingReveal("client nonce"))?;
        let server_roll = round.peer_roll().ok_or(MissingReveal("server roll"))?;
        let client_roll = round.local_roll().ok_or(MissingReveal("client roll"))?;

        let result = match round.variant() {
            Variant::Derived => Self::check_derived(&DerivedClaims {
                server_nonce_commitment: commitment,
                server_nonce,
                client_nonce,
                server_roll,
                client_roll,
                outcome: round.claimed_outcome(),
            }),
            Variant::Guess => Self::check_guess(&GuessClaims {
                hash_commitment: commitment,
                server_roll,
                server_nonce,
                client_nonce,
                client_roll,
                outcome: round.claimed_outcome(),
            }),
        };

        if let Err(failure) = &result {
            tracing::warn!(
                round_id = ?round.round_id(),
                variant = %round.variant(),
                %failure,
                "commitment verification failed"
            );
        }
        result
    }

    /// `true` only if every commitment the server made is confirmed
    pub fn verify(round: &Round) -> bool {
        Self::check_round(round).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nonce(byte: u8) -> Nonce {
        Nonce::from_bytes([byte; 32])
    }

    fn roll(v: u8) -> Roll {
        Roll::new(v).unwrap()
    }

    #[test]
    fn test_nonce_reveal_scenario() {
        let committed = CommitmentHasher::commit_nonce(&nonce(0xaa));
        assert!(CommitmentVerifier::verify_nonce(&nonce(0xaa), &committed));
        assert!(!CommitmentVerifier::verify_nonce(&nonce(0xab), &committed));
    }

    #[test]
    fn test_verification_is_repeatable() {
        let committed = CommitmentHasher::commit_nonce(&nonce(0x10));
        let first = CommitmentVerifier::verify_nonce(&nonce(0x10), &committed);
        let second = CommitmentVerifier::verify_nonce(&nonce(0x10), &committed);
        assert_eq!(first, second);
    }

    #[test]
    fn test_honest_derived_reveal() {
        let server = nonce(0xaa);
        let client = nonce(0xbb);
        let commitment = CommitmentHasher::commit_nonce(&server);
        let claims = DerivedClaims {
            server_nonce_commitment: &commitment,
            server_nonce: &server,
            client_nonce: &client,
            server_roll: roll(3),
            client_roll: roll(6),
            outcome: Some(Outcome::ClientWin),
        };
        assert_eq!(CommitmentVerifier::check_derived(&claims), Ok(()));
    }

    #[test]
    fn test_swapped_server_nonce_fails_even_with_consistent_rolls() {
        let committed_nonce = nonce(0xaa);
        let revealed = nonce(0xab);
        let client = nonce(0xbb);
        let commitment = CommitmentHasher::commit_nonce(&committed_nonce);
        let (server_roll, client_roll) = RollDeriver::derive_pair(&revealed, &client);

        let claims = DerivedClaims {
            server_nonce_commitment: &commitment,
            server_nonce: &revealed,
            client_nonce: &client,
            server_roll,
            client_roll,
            outcome: None,
        };
        assert_eq!(
            CommitmentVerifier::check_derived(&claims),
            Err(VerificationFailure::NonceCommitment)
        );
    }

    #[test]
    fn test_lied_server_roll_detected() {
        let server = nonce(0xaa);
        let client = nonce(0xbb);
        let commitment = CommitmentHasher::commit_nonce(&server);
        let claims = DerivedClaims {
            server_nonce_commitment: &commitment,
            server_nonce: &server,
            client_nonce: &client,
            server_roll: roll(6),
            client_roll: roll(6),
            outcome: Some(Outcome::Tie),
        };
        assert_eq!(
            CommitmentVerifier::check_derived(&claims),
            Err(VerificationFailure::ServerRoll {
                claimed: roll(6),
                derived: roll(3)
            })
        );
    }

    #[test]
    fn test_wrong_outcome_label_detected() {
        let server = nonce(0xaa);
        let client = nonce(0xbb);
        let commitment = CommitmentHasher::commit_nonce(&server);
        let claims = DerivedClaims {
            server_nonce_commitment: &commitment,
            server_nonce: &server,
            client_nonce: &client,
            server_roll: roll(3),
            client_roll: roll(6),
            outcome: Some(Outcome::ServerWin),
        };
        assert!(matches!(
            CommitmentVerifier::check_derived(&claims),
            Err(VerificationFailure::OutcomeLabel { .. })
        ));
    }

    #[test]
    fn test_guess_commitment() {
        let server = nonce(0xaa);
        let client = nonce(0xbb);
        let commitment = CommitmentHasher::commit_roll(roll(3), &server, &client);

        let honest = GuessClaims {
            hash_commitment: &commitment,
            server_roll: roll(3),
            server_nonce: &server,
            client_nonce: &client,
            client_roll: roll(5),
            outcome: Some(Outcome::ClientWin),
        };
        assert_eq!(CommitmentVerifier::check_guess(&honest), Ok(()));

        let changed_roll = GuessClaims {
            server_roll: roll(6),
            outcome: Some(Outcome::ServerWin),
            ..honest
        };
        assert_eq!(
            CommitmentVerifier::check_guess(&changed_roll),
            Err(VerificationFailure::RollCommitment)
        );
    }

    fn revealed_round(server_nonce: Nonce, claimed: Outcome) -> Round {
        let mut round = Round::new(Variant::Derived, nonce(0xbb), None);
        round.record_commitment(1, CommitmentHasher::commit_nonce(&nonce(0xaa)));
        round.record_counter_move();
        round.record_reveal(server_nonce, roll(3), Some(roll(6)), claimed);
        round
    }

    #[test]
    fn test_verify_round() {
        assert!(CommitmentVerifier::verify(&revealed_round(nonce(0xaa), Outcome::ClientWin)));
        assert!(!CommitmentVerifier::verify(&revealed_round(nonce(0xab), Outcome::ClientWin)));
        assert!(!CommitmentVerifier::verify(&revealed_round(nonce(0xaa), Outcome::Tie)));
    }

    #[test]
    fn test_expired_label_still_checks_commitments() {
        assert!(CommitmentVerifier::verify(&revealed_round(nonce(0xaa), Outcome::Expired)));
        assert_eq!(
            CommitmentVerifier::check_round(&revealed_round(nonce(0xab), Outcome::Expired)),
            Err(VerificationFailure::NonceCommitment)
        );
    }
}

