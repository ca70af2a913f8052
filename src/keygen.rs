use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::TryRngCore;
use rand::rngs::OsRng;
use secrecy::SecretString;

use crate::error::{EnvsyncError, Result};

pub const MIN_KEY_LENGTH: usize = 32;
/// Upper bound on generated keys; well inside the 64 KiB Secrets Manager value limit.
pub const MAX_KEY_LENGTH: usize = 4096;

/// Raw bytes needed for `length` base64 characters at 6 bits each, or `None`
/// if the count overflows.
pub fn raw_byte_len(length: usize) -> Option<usize> {
    length.checked_mul(6).map(|bits| bits.div_ceil(8))
}

/// Generates a URL-safe API key of exactly `length` characters from the OS CSPRNG.
pub fn generate(length: usize) -> Result<SecretString> {
    if length < MIN_KEY_LENGTH {
        return Err(EnvsyncError::Validation(format!(
            "API key length must be at least {MIN_KEY_LENGTH} characters, got {length}"
        )));
    }
    if length > MAX_KEY_LENGTH {
        return Err(EnvsyncError::Validation(format!(
            "API key length must be at most {MAX_KEY_LENGTH} characters, got {length}"
        )));
    }

    let byte_len = raw_byte_len(length).ok_or_else(|| {
        EnvsyncError::Validation(format!("API key length {length} is too large"))
    })?;
    let mut bytes = vec![0u8; byte_len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|err| EnvsyncError::message(format!("failed to read OS randomness: {err}")))?;

    let mut encoded = URL_SAFE_NO_PAD.encode(&bytes);
    encoded.truncate(length);
    Ok(encoded.into())
}
