// src/token.rs
//! Token generation
//!
//! A token is `tk_` + a fixed-width base-32 millisecond timestamp + a random
//! suffix. Tokens from different milliseconds never collide and sort by
//! creation time; tokens from the same millisecond rely on the suffix.

use chrono::Utc;
use rand::RngCore;

use crate::consts::{
    MAX_TOKEN_LENGTH, MIN_RANDOM_LEN, MIN_TIMESTAMP_LEN, MIN_TOKEN_LENGTH, RANDOM_ALPHABET,
    TIMESTAMP_ALPHABET, TIMESTAMP_WIDTH, TOKEN_PREFIX,
};
use crate::error::TokenError;

/// Shortest length that still fits prefix + minimum timestamp + minimum suffix
pub const TOKEN_LENGTH_FLOOR: usize = TOKEN_PREFIX.len() + MIN_TIMESTAMP_LEN + MIN_RANDOM_LEN;

/// Anything that can hand out candidate tokens to [`TokenVault`](crate::TokenVault)
pub trait TokenSource: Send + Sync {
    fn generate(&self, total_length: usize) -> Result<String, TokenError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenGenerator {
    min_length: usize,
    max_length: usize,
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new(MIN_TOKEN_LENGTH, MAX_TOKEN_LENGTH)
    }
}

impl TokenGenerator {
    /// Bounds are inclusive; `min_length` is raised to [`TOKEN_LENGTH_FLOOR`] if lower
    pub fn new(min_length: usize, max_length: usize) -> Self {
        let min_length = min_length.max(TOKEN_LENGTH_FLOOR);
        Self {
            min_length,
            max_length: max_length.max(min_length),
        }
    }

    pub fn bounds(&self) -> (usize, usize) {
        (self.min_length, self.max_length)
    }

    /// Generate a token stamped with an explicit millisecond timestamp
    pub fn generate_at(&self, total_length: usize, unix_millis: u64) -> Result<String, TokenError> {
        if !(self.min_length..=self.max_length).contains(&total_length) {
            return Err(TokenError::LengthOutOfBounds {
                requested: total_length,
                min: self.min_length,
                max: self.max_length,
            });
        }

        let available = total_length - TOKEN_PREFIX.len();
        let timestamp_len = TIMESTAMP_WIDTH.min(available - MIN_RANDOM_LEN);
        let random_len = available - timestamp_len;

        let stamp = encode_timestamp(unix_millis);
        // Short tokens keep the fast-moving low-order characters
        let stamp = &stamp[TIMESTAMP_WIDTH - timestamp_len..];

        let mut token = String::with_capacity(total_length);
        token.push_str(TOKEN_PREFIX);
        token.extend(stamp.iter().map(|&b| char::from(b)));
        token.push_str(&random_suffix(random_len));
        Ok(token)
    }
}

impl TokenSource for TokenGenerator {
    fn generate(&self, total_length: usize) -> Result<String, TokenError> {
        let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        self.generate_at(total_length, millis)
    }
}

/// Fixed-width big-endian base-32, zero padded
fn encode_timestamp(mut millis: u64) -> [u8; TIMESTAMP_WIDTH] {
    let mut out = [TIMESTAMP_ALPHABET[0]; TIMESTAMP_WIDTH];
    for slot in out.iter_mut().rev() {
        *slot = TIMESTAMP_ALPHABET[(millis % 32) as usize];
        millis /= 32;
    }
    out
}

/// CSPRNG suffix over [`RANDOM_ALPHABET`] using rejection sampling
fn random_suffix(len: usize) -> String {
    let alphabet_len = RANDOM_ALPHABET.len();
    // Largest multiple of the alphabet size that fits in a byte
    let limit = 256 - (256 % alphabet_len);

    let mut rng = rand::rng();
    let mut out = String::with_capacity(len);
    let mut pool = [0u8; 64];
    while out.len() < len {
        rng.fill_bytes(&mut pool);
        for &byte in pool.iter().filter(|&&b| usize::from(b) < limit) {
            if out.len() == len {
                break;
            }
            out.push(char::from(RANDOM_ALPHABET[usize::from(byte) % alphabet_len]));
        }
    }
    out
}
