//! bcrypt hashing and verification.
//!
//! Both operations are CPU-bound and run on the blocking pool so they do
//! not starve the task scheduler. Inputs are trimmed before hashing, so a
//! password pasted with whitespace verifies either way.

use crate::error::SecurityError;

/// Hash a password with the default bcrypt cost. Returns the hash bytes
/// as stored in `users.p_hash`.
pub async fn hash_password(password: &str) -> Result<Vec<u8>, SecurityError> {
    let trimmed = password.trim().to_owned();
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(trimmed, bcrypt::DEFAULT_COST))
        .await
        .map_err(|_| SecurityError::TaskCancelled)??;
    Ok(hash.into_bytes())
}

/// Verify a password against a stored hash. bcrypt's comparison is
/// constant-time with respect to the candidate.
pub async fn verify_password(password: &str, stored: &[u8]) -> Result<bool, SecurityError> {
    let trimmed = password.trim().to_owned();
    let stored =
        String::from_utf8(stored.to_vec()).map_err(|_| SecurityError::CorruptStoredHash)?;
    let ok = tokio::task::spawn_blocking(move || bcrypt::verify(trimmed, &stored))
        .await
        .map_err(|_| SecurityError::TaskCancelled)??;
    Ok(ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify_round_trip() {
        let hash = hash_password("hunter2").await.unwrap();
        assert!(verify_password("hunter2", &hash).await.unwrap());
        assert!(!verify_password("hunter3", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn input_is_trimmed() {
        let hash = hash_password("  hunter2  ").await.unwrap();
        assert!(verify_password("hunter2", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn corrupt_hash_is_an_error() {
        let result = verify_password("x", &[0xff, 0xfe]).await;
        assert!(matches!(result, Err(SecurityError::CorruptStoredHash)));
    }
}
