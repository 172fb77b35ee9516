//! Password hashing with Argon2

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Hash error: {0}")]
    HashError(String),
}

pub struct PasswordService;

impl PasswordService {
    pub fn hash(password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PasswordError::HashError(e.to_string()))
    }

    pub fn verify(password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PasswordError::HashError(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

/// The one e-mail/password pair the server accepts. Only the hash of the
/// password is kept after construction.
#[derive(Debug, Clone)]
pub struct CredentialPair {
    email: String,
    password_hash: String,
}

impl CredentialPair {
    pub fn new(email: &str, password: &str) -> Result<Self, PasswordError> {
        Ok(Self {
            email: email.to_string(),
            password_hash: PasswordService::hash(password)?,
        })
    }

    /// Exact, case-sensitive match on both halves.
    pub fn matches(&self, email: &str, password: &str) -> bool {
        if email != self.email {
            return false;
        }
        PasswordService::verify(password, &self.password_hash).unwrap_or(false)
    }
}
