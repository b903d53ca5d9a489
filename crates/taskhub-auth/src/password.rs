//! Password policy and Argon2id verification.

use argon2::{Argon2, PasswordVerifier};

use crate::error::AuthError;

/// Reject passwords shorter than `min_len` characters.
pub fn check_policy(password: &str, min_len: usize) -> Result<(), AuthError> {
    if password.chars().count() < min_len {
        return Err(AuthError::WeakPassword { min: min_len });
    }
    Ok(())
}

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// `pepper` must match the one used at hashing time. A malformed hash
/// is an error, a mismatch is `Ok(false)`.
pub fn verify_password(
    password: &str,
    hash: &str,
    pepper: Option<&str>,
) -> Result<bool, AuthError> {
    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}
