//! PIN and password hashing for flat logins and staff credentials.
//!
//! Hashes are produced with argon2 and stored in the `flats.pin_hash` column
//! and the password/PIN settings keys. Authentication itself happens outside
//! this crate; these helpers exist so every credential the admin writes is
//! hashed before it reaches storage.

use crate::errors::{Error, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Minimum accepted admin password length.
pub const MIN_PASSWORD_LEN: usize = 6;
/// Exact PIN length for flats and the security guard.
pub const PIN_LEN: usize = 4;

/// Hashes a secret with a fresh random salt.
pub fn hash_secret(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Internal {
            message: format!("Failed to hash secret: {e}"),
        })
}

/// Verifies a secret against a stored argon2 hash.
pub fn verify_secret(secret: &str, stored_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(stored_hash).map_err(|e| Error::Internal {
        message: format!("Stored hash is not a valid argon2 hash: {e}"),
    })?;
    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Validates a PIN: exactly [`PIN_LEN`] ASCII digits.
pub fn validate_pin(pin: &str) -> Result<()> {
    if pin.len() != PIN_LEN || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::Validation {
            message: format!("PIN must be exactly {PIN_LEN} digits"),
        });
    }
    Ok(())
}

/// Validates an admin password: at least [`MIN_PASSWORD_LEN`] characters.
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::Validation {
            message: format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_secret("0000").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_secret("0000", &hash).unwrap());
        assert!(!verify_secret("1234", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_secret("admin123").unwrap();
        let second = hash_secret("admin123").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        let result = verify_secret("0000", "not-a-hash");
        assert!(matches!(
            result.unwrap_err(),
            Error::Internal { message: _ }
        ));
    }

    #[test]
    fn test_validate_pin() {
        assert!(validate_pin("0000").is_ok());
        assert!(validate_pin("9481").is_ok());
        assert!(validate_pin("123").is_err());
        assert!(validate_pin("12345").is_err());
        assert!(validate_pin("12a4").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("admin123").is_ok());
        assert!(validate_password("short").is_err());
    }
}
