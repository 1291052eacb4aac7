use crate::error::ApiError;

/// hash_password
///
/// One-way bcrypt hash of `password` at the given cost. Runs on the blocking pool
/// since bcrypt is CPU-bound.
pub async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hashed)
}

/// verify_password
///
/// Compares a plaintext candidate against a stored bcrypt hash. A malformed hash
/// is treated as a mismatch.
pub async fn verify_password(candidate: String, hash: String) -> Result<bool, ApiError> {
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(candidate, &hash)).await?;
    Ok(matches.unwrap_or_else(|e| {
        tracing::warn!("stored password hash could not be verified: {}", e);
        false
    }))
}
