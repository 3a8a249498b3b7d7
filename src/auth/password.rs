use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct HashingError(String);

/// Hashes `plain` with Argon2id and a fresh random salt. Returns a PHC string.
pub fn hash_password(plain: &str) -> Result<String, HashingError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            HashingError(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// True iff `hash` was derived from `plain`. Errors only when `hash` is not a PHC string.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, HashingError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        HashingError(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
