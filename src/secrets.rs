//! Random secret generation
//!
//! Produces cryptographically secure strings from caller-supplied character
//! alphabets. Used for proxy usernames, passwords, and CSRF nonces.

use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::{Error, Result};

/// Lowercase letters
pub const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";

/// Uppercase letters
pub const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Decimal digits
pub const DIGITS: &str = "0123456789";

/// Punctuation characters safe for proxy-auth passwords
pub const SYMBOLS: &str = "!#$%'()*+,-./:;=?@[]^_`{|}~";

/// Generate a random string of `length` characters drawn uniformly from the
/// concatenation of `alphabets`.
///
/// Each output byte comes from the OS secure-random source and is mapped into
/// the alphabet by modulo reduction. No RNG state is shared across calls.
///
/// # Errors
///
/// Returns [`Error::RandomnessUnavailable`] when the entropy source fails and
/// [`Error::Internal`] when the combined alphabet is empty.
pub fn random_string(length: usize, alphabets: &[&str]) -> Result<String> {
    let letters = alphabets.concat().into_bytes();
    if letters.is_empty() {
        return Err(Error::Internal(
            "random_string requires a non-empty alphabet".to_string(),
        ));
    }

    let mut bytes = vec![0u8; length];
    let mut rng = OsRng;
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| Error::RandomnessUnavailable(e.to_string()))?;

    Ok(bytes
        .into_iter()
        .map(|b| letters[b as usize % letters.len()] as char)
        .collect())
}

/// Mint a CSRF nonce for a login attempt
pub fn nonce(length: usize) -> Result<String> {
    random_string(length, &[UPPER, LOWER, DIGITS])
}
