//! Cryptographic utilities for one-time codes and admin session tokens.

use rand::distributions::{Alphanumeric, DistString};
use rand::Rng;
use sha2::{Digest, Sha256};

/// Number of digits in a login code.
pub const OTP_CODE_DIGITS: u32 = 6;

/// Length of an admin session bearer token.
pub const SESSION_TOKEN_LENGTH: usize = 64;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates a zero-padded numeric login code with `OTP_CODE_DIGITS` digits.
pub fn generate_otp_code() -> String {
    let upper = 10u32.pow(OTP_CODE_DIGITS);
    let value = rand::thread_rng().gen_range(0..upper);
    format!("{:0width$}", value, width = OTP_CODE_DIGITS as usize)
}

/// Generates an opaque alphanumeric session token.
///
/// Uses the thread-local CSPRNG; 64 characters from a 62-symbol alphabet
/// gives roughly 381 bits of entropy.
pub fn generate_session_token() -> String {
    Alphanumeric.sample_string(&mut rand::thread_rng(), SESSION_TOKEN_LENGTH)
}
