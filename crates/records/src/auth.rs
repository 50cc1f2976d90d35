use bcrypt::Version;

use crate::errors::AppError;

/// Work factor expected by the web backend's password encoder.
pub const BCRYPT_COST: u32 = 10;

/// Hashes `password` as a `$2a$` bcrypt string, the variant the web backend verifies.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let parts = bcrypt::hash_with_result(password, BCRYPT_COST)
        .map_err(|e| AppError::InvalidInput(format!("Failed to hash password: {e}")))?;
    Ok(parts.format_for_version(Version::TwoA))
}
