//! Opaque bearer tokens

use rand::Rng;

/// Number of random bytes behind a token; the hex form is twice as long.
pub const TOKEN_BYTES: usize = 32;

pub fn generate_session_token() -> String {
    let token: [u8; TOKEN_BYTES] = rand::rng().random();
    hex::encode(token)
}
