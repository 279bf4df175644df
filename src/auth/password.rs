/// Password Hashing and Verification
///
/// bcrypt with a fixed cost. Both operations are CPU-heavy and run on the
/// blocking thread pool so they never stall the async workers.

use bcrypt::{hash, verify};

use crate::error::AppError;

/// bcrypt cost factor used for every stored credential
pub const BCRYPT_COST: u32 = 10;

/// Hash a password using bcrypt
///
/// # Errors
/// Returns error if bcrypt hashing fails
pub async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash(password, BCRYPT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Compare a password against a stored hash
///
/// An unparsable stored hash counts as a mismatch.
pub async fn verify_password(password: String, stored_hash: String) -> Result<bool, AppError> {
    let outcome = tokio::task::spawn_blocking(move || verify(password, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?;

    match outcome {
        Ok(matches) => Ok(matches),
        Err(e) => {
            tracing::warn!("Stored password hash could not be checked: {}", e);
            Ok(false)
        }
    }
}
