//! Roll derivation for the derived-roll variant
//!
//! `roll = (be_u32(sha256(role || server_nonce_hex || client_nonce_hex)[0..4]) mod 6) + 1`
//!
//! Plain modulo is part of the wire protocol: 2^32 is not a multiple of 6, so
//! faces 1-4 are favoured by 4 in 2^32. Switching to rejection sampling here
//! would make honest servers fail verification.

use sha2::{Digest, Sha256};

use super::{Role, Roll};
use crate::crypto::Nonce;

pub struct RollDeriver;

impl RollDeriver {
    /// Derive the roll for `role` from both revealed nonces
    pub fn derive(role: Role, server_nonce: &Nonce, client_nonce: &Nonce) -> Roll {
        let mut hasher = Sha256::new();
        hasher.update(role.label().as_bytes());
        hasher.update(server_nonce.to_hex().as_bytes());
        hasher.update(client_nonce.to_hex().as_bytes());
        let digest = hasher.finalize();

        let value = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
        Roll((value % 6) as u8 + 1)
    }

    /// Both rolls at once, `(server, client)`
    pub fn derive_pair(server_nonce: &Nonce, client_nonce: &Nonce) -> (Roll, Roll) {
        (
            Self::derive(Role::Server, server_nonce, client_nonce),
            Self::derive(Role::Client, server_nonce, client_nonce),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        let server = Nonce::from_bytes([0xaa; 32]);
        let client = Nonce::from_bytes([0xbb; 32]);

        // sha256("server" || aa.. || bb..) starts e405fada
        assert_eq!(RollDeriver::derive(Role::Server, &server, &client).value(), 3);
        // sha256("client" || aa.. || bb..) starts cecb8749
        assert_eq!(RollDeriver::derive(Role::Client, &server, &client).value(), 6);
    }

    #[test]
    fn test_determinism() {
        let server = Nonce::from_bytes([0x42; 32]);
        let client = Nonce::from_bytes([0x17; 32]);
        assert_eq!(
            RollDeriver::derive_pair(&server, &client),
            RollDeriver::derive_pair(&server.clone(), &client.clone())
        );
    }

    #[test]
    fn test_different_server_nonce_changes_rolls() {
        let client = Nonce::from_bytes([0xbb; 32]);
        let honest = RollDeriver::derive_pair(&Nonce::from_bytes([0xaa; 32]), &client);
        let swapped = RollDeriver::derive_pair(&Nonce::from_bytes([0xab; 32]), &client);
        assert_eq!((honest.0.value(), honest.1.value()), (3, 6));
        assert_eq!((swapped.0.value(), swapped.1.value()), (6, 3));
    }
}
