//! Opaque reset tokens: random on issue, stored only as a digest.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// 32 random bytes, hex encoded.
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Digest stored in place of the token so a database leak does not hand out
/// working reset links.
pub fn digest_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
