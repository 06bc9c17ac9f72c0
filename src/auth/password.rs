/// Password Hashing and Verification
///
/// One-way credential hashing with bcrypt. Each hash embeds its own random
/// salt and work factor, so two hashes of the same password differ while
/// both verify.

use bcrypt::{hash, verify};

use crate::error::AuthError;

/// bcrypt only consumes the first 72 bytes of its input. Longer passwords are
/// rejected instead of being silently truncated.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Lowest work factor bcrypt accepts
pub const MIN_PASSWORD_COST: u32 = 4;
/// Highest work factor bcrypt accepts
pub const MAX_PASSWORD_COST: u32 = 31;

/// Hash a password using bcrypt
///
/// # Arguments
/// * `password` - Plain text password to hash
/// * `cost` - bcrypt work factor (`MIN_PASSWORD_COST..=MAX_PASSWORD_COST`)
///
/// # Errors
/// Returns `AuthError::Hashing` if the password is too long or bcrypt
/// rejects the input or cost
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AuthError::Hashing(format!(
            "password exceeds {} bytes",
            MAX_PASSWORD_BYTES
        )));
    }

    hash(password, cost).map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Verify a password against its stored hash
///
/// The digest comparison inside bcrypt is constant-time.
///
/// # Errors
/// - `AuthError::PasswordMismatch` if the password does not match
/// - `AuthError::Hashing` if the stored hash is malformed
pub fn verify_password(password: &str, hashed_password: &str) -> Result<(), AuthError> {
    match verify(password, hashed_password) {
        Ok(true) => Ok(()),
        Ok(false) => Err(AuthError::PasswordMismatch),
        Err(e) => Err(AuthError::Hashing(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum cost keeps the suite fast; the algorithm is identical
    const TEST_COST: u32 = MIN_PASSWORD_COST;

    #[test]
    fn test_hash_password() {
        let password = "test";
        let hashed = hash_password(password, TEST_COST).expect("Failed to hash password");

        assert_ne!(password, hashed);
        assert_eq!(hashed.len(), 60);
        assert!(hashed.starts_with("$2"));
    }

    #[test]
    fn test_verify_password() {
        let hashed = hash_password("s3cret!", TEST_COST).expect("Failed to hash password");
        assert!(verify_password("s3cret!", &hashed).is_ok());
    }

    #[test]
    fn test_verify_wrong_password() {
        let hashed = hash_password("s3cret!", TEST_COST).expect("Failed to hash password");
        assert_eq!(
            verify_password("wrong", &hashed),
            Err(AuthError::PasswordMismatch)
        );
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("same password", TEST_COST).unwrap();
        let second = hash_password("same password", TEST_COST).unwrap();

        assert_ne!(first, second);
        assert!(verify_password("same password", &first).is_ok());
        assert!(verify_password("same password", &second).is_ok());
    }

    #[test]
    fn test_empty_password_round_trips() {
        let hashed = hash_password("", TEST_COST).unwrap();
        assert!(verify_password("", &hashed).is_ok());
        assert!(verify_password("x", &hashed).is_err());
    }

    #[test]
    fn test_too_long_password_is_hashing_error() {
        let long_password = "a".repeat(MAX_PASSWORD_BYTES + 1);
        let result = hash_password(&long_password, TEST_COST);
        assert!(matches!(result, Err(AuthError::Hashing(_))));
    }

    #[test]
    fn test_max_length_password_accepted() {
        let password = "b".repeat(MAX_PASSWORD_BYTES);
        let hashed = hash_password(&password, TEST_COST).unwrap();
        assert!(verify_password(&password, &hashed).is_ok());
    }

    #[test]
    fn test_invalid_cost_is_hashing_error() {
        let result = hash_password("s3cret!", MIN_PASSWORD_COST - 1);
        assert!(matches!(result, Err(AuthError::Hashing(_))));
    }

    #[test]
    fn test_cost_above_maximum_is_hashing_error() {
        let result = hash_password("s3cret!", MAX_PASSWORD_COST + 1);
        assert!(matches!(result, Err(AuthError::Hashing(_))));
    }

    #[test]
    fn test_malformed_hash_is_not_a_mismatch() {
        let result = verify_password("s3cret!", "not-a-bcrypt-hash");
        assert!(matches!(result, Err(AuthError::Hashing(_))));
    }
}
