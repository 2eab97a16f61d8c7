// Password hashing utilities
// Uses bcrypt for secure password hashing

use bcrypt::{hash, verify};

use super::AuthError;

/// Hashes a password using bcrypt
///
/// # Arguments
/// * `password` - The plaintext password to hash
/// * `cost` - bcrypt work factor (`bcrypt::DEFAULT_COST` in production)
///
/// # Example
/// ```
/// use agrotrade_api::auth::password::hash_password;
///
/// let hash = hash_password("my_password", 4).expect("valid hash");
/// assert!(hash.starts_with("$2"));
/// ```
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    hash(password, cost).map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Verifies a password against a bcrypt hash
///
/// # Returns
/// * `Ok(bool)` - True if password matches, false otherwise
/// * `Err(AuthError)` - If the stored hash is malformed
///
/// # Example
/// ```
/// use agrotrade_api::auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("my_password", 4).unwrap();
/// let valid = verify_password("my_password", &hash).unwrap();
/// assert!(valid);
/// ```
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    verify(password, hash).map_err(|e| AuthError::Hashing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const COST: u32 = 4;

    #[test]
    fn hash_and_verify_password() {
        let password = "test_password_123";
        let hash = hash_password(password, COST).expect("valid hash");

        let valid = verify_password(password, &hash).expect("valid verification");
        assert!(valid);
    }

    #[test]
    fn verify_wrong_password() {
        let hash = hash_password("test_password_123", COST).expect("valid hash");

        let valid = verify_password("wrong_password", &hash).expect("valid verification");
        assert!(!valid);
    }

    #[test]
    fn hash_different_outputs() {
        let password = "test_password_123";
        let hash1 = hash_password(password, COST).expect("valid hash");
        let hash2 = hash_password(password, COST).expect("valid hash");

        // Salted
        assert_ne!(hash1, hash2);
        assert!(verify_password(password, &hash1).unwrap());
        assert!(verify_password(password, &hash2).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("whatever", "not-a-bcrypt-hash").is_err());
    }
}
