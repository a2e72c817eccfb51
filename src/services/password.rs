//! Credential hashing
//!
//! Argon2id with the crate defaults and a fresh random salt per hash. The
//! stored value is a PHC string, so parameters travel with the hash and can
//! be raised later without invalidating existing accounts.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, Error as HashError, PasswordHash, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};

/// Hash a plaintext password into a PHC string.
pub fn hash_password(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hashed = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {}", e))?;
    Ok(hashed.to_string())
}

/// Check a plaintext password against a stored PHC string.
///
/// A mismatch is `Ok(false)`; only an unparseable stored hash is an error.
pub fn verify_password(plaintext: &str, stored: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(stored).map_err(|e| anyhow!("stored hash is not valid PHC: {}", e))?;

    match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(HashError::Password) => Ok(false),
        Err(e) => Err(anyhow!("password verification failed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_argon2id_phc() {
        let hash = hash_password("s3cret-enough").expect("hashing failed");
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_salting_makes_hashes_unique() {
        let a = hash_password("repeated").expect("hashing failed");
        let b = hash_password("repeated").expect("hashing failed");
        assert_ne!(a, b);
    }

    #[test]
    fn test_round_trip_accepts_right_password() {
        let hash = hash_password("letmein-Aa1").expect("hashing failed");
        assert!(verify_password("letmein-Aa1", &hash).expect("verify errored"));
    }

    #[test]
    fn test_wrong_password_is_false_not_error() {
        let hash = hash_password("letmein-Aa1").expect("hashing failed");
        assert!(!verify_password("not-it", &hash).expect("verify errored"));
    }

    #[test]
    fn test_garbage_stored_hash_is_error() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_non_ascii_passwords_round_trip() {
        let password = "пароль测试🔐";
        let hash = hash_password(password).expect("hashing failed");
        assert!(verify_password(password, &hash).expect("verify errored"));
    }

    #[test]
    fn test_plaintext_never_appears_in_hash() {
        let hash = hash_password("visible-secret").expect("hashing failed");
        assert!(!hash.contains("visible-secret"));
    }
}
