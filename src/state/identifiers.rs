//! Random codes used as party identifiers and admin tokens.

use rand::{Rng, rng};

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a party identifier.
pub const PARTY_ID_LEN: usize = 6;
/// Length of a party admin token.
pub const ADMIN_TOKEN_LEN: usize = 12;

/// Short code shared with participants to join a party.
pub fn new_party_id() -> String {
    random_code(&mut rng(), PARTY_ID_LEN)
}

/// Secret handed to the party creator for admin-only operations.
pub fn new_admin_token() -> String {
    random_code(&mut rng(), ADMIN_TOKEN_LEN)
}

/// Draw `len` symbols uniformly from the upper-case alphanumeric alphabet.
pub fn random_code<R>(rng: &mut R, len: usize) -> String
where
    R: Rng + ?Sized,
{
    (0..len)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect()
}
