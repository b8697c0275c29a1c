use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use rand_core::OsRng;

use crate::errors::AppError;

const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_NAME_LENGTH: usize = 64;

pub fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() || name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::bad_request(format!(
            "name must be between 1 and {} characters",
            MAX_NAME_LENGTH
        )));
    }

    Ok(())
}


/// At least eight characters, each an ASCII letter, digit, punctuation mark or space.
pub fn validate_password(password: &str) -> Result<(), AppError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || c.is_ascii_punctuation() || c == ' ';

    if password.chars().count() < MIN_PASSWORD_LENGTH || !password.chars().all(allowed) {
        return Err(AppError::bad_request(
            "password is too short or contains forbidden characters",
        ));
    }

    Ok(())
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AppError::internal(format!("failed to hash password: {err}")))
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|err| AppError::internal(format!("invalid password hash: {err}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn utc_now() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_rules() {
        assert!(validate_password("password").is_ok());
        assert!(validate_password("with space!").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password("pässwörd123").is_err());
        assert!(validate_password("tab\tseparated").is_err());
    }

    #[test]
    fn name_rules() {
        assert!(validate_name("alice").is_ok());
        assert!(validate_name(&"n".repeat(MAX_NAME_LENGTH)).is_ok());
        assert!(validate_name(&"n".repeat(MAX_NAME_LENGTH + 1)).is_err());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
    }

    #[test]
    fn hashes_verify_only_their_password() {
        let hash = hash_password("password123").unwrap();
        assert_ne!(hash, "password123");
        assert!(verify_password("password123", &hash).unwrap());
        assert!(!verify_password("password124", &hash).unwrap());
    }

    #[test]
    fn malformed_digest_is_an_error() {
        assert!(verify_password("password123", "not-a-phc-string").is_err());
    }
}
