//! Short codes for shareable photo links.
//!
//! A code is the base-62 rendering of the creation instant in milliseconds
//! followed by three random base-62 characters. Codes are compact but not
//! unique: registration may be rejected as a collision and the caller decides
//! whether to try again with a fresh code.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Digits of the base-62 alphabet, in value order.
pub const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

const RANDOM_SUFFIX_LEN: usize = 3;

/// A validated short code: non-empty, ASCII alphanumeric only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShortCode(String);

impl ShortCode {
    pub fn parse(value: &str) -> Result<Self, AppError> {
        if value.is_empty() {
            return Err(AppError::InvalidInput(
                "Short code must not be empty".to_string(),
            ));
        }
        if !value.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(AppError::InvalidInput(format!(
                "Short code contains invalid characters: {}",
                value
            )));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShortCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ShortCode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShortCode {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShortCode> for String {
    fn from(code: ShortCode) -> Self {
        code.0
    }
}

/// Base-62 rendering of `value`, most significant digit first.
/// Zero renders as "0"; no other value has a leading zero digit.
pub fn encode_base62(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ALPHABET[(value % 62) as usize]);
        value /= 62;
    }
    digits.reverse();

    // ALPHABET is pure ASCII
    digits.into_iter().map(char::from).collect()
}

/// Generate a code for the current instant using the thread-local RNG.
pub fn generate() -> ShortCode {
    let now = Utc::now().timestamp_millis().max(0) as u64;
    generate_with(now, &mut rand::rng())
}

/// Generate a code for `timestamp_ms` drawing the suffix from `rng`.
pub fn generate_with<R: Rng + ?Sized>(timestamp_ms: u64, rng: &mut R) -> ShortCode {
    let mut code = encode_base62(timestamp_ms);
    for _ in 0..RANDOM_SUFFIX_LEN {
        code.push(char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]));
    }
    ShortCode(code)
}
