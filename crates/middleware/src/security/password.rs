use app_error::{AppError, AppResult};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::{debug, error};

/// Argon2id hash in PHC string form, fresh salt per call
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {}", e);
            AppError::ServerError(anyhow::anyhow!("Failed to hash password: {}", e))
        })
}

/// A stored hash that cannot be parsed is a server fault, not a mismatch
pub fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| {
        error!("Stored password hash is malformed: {}", e);
        AppError::ServerError(anyhow::anyhow!("Invalid password hash: {}", e))
    })?;

    let matches = Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok();

    debug!("Password verification result: {}", matches);
    Ok(matches)
}
