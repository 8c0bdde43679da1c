//! Password hashing for the login collaborator (argon2id, PHC strings).

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};

use super::AuthError;

/// Hash a password into a PHC string.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if argon2 rejects the input.
pub fn hash_password(password: &SecretString) -> Result<String, AuthError> {
    let mut salt_bytes = [0_u8; 16];
    rand::rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?;

    Argon2::default()
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!(error = %e, "argon2 hash_password error");
            AuthError::PasswordHash(e.to_string())
        })
}

/// Check a password against a stored PHC string.
///
/// A malformed stored hash is logged and treated as a mismatch.
#[must_use]
pub fn verify_password(password: &SecretString, stored_hash: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::error!(error = %e, "stored password hash is malformed");
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.expose_secret().as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let password = SecretString::from("correct-horse-battery-staple");
        let hash = hash_password(&password).unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&password, &hash));
        assert!(!verify_password(&SecretString::from("wrong"), &hash));
    }

    #[test]
    fn test_malformed_hash_is_a_mismatch() {
        assert!(!verify_password(
            &SecretString::from("anything"),
            "not-a-phc-string"
        ));
    }
}
