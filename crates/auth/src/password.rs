//! Credential verification (password hashing).
//!
//! The hashing algorithm is an implementation detail behind
//! [`CredentialVerifier`]; callers only rely on "hash produces a salted
//! digest" and "verify returns a boolean".

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

use orgadmin_core::{DomainError, DomainResult};

/// Accepted password length, in characters.
pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 100;

/// Plaintext secret (password). `Debug` is redacted so it cannot leak into logs.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Enforce the password length policy.
    pub fn validate_length(&self) -> DomainResult<()> {
        let len = self.0.chars().count();
        if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
            return Err(DomainError::validation(format!(
                "password must be between {PASSWORD_MIN_LEN} and {PASSWORD_MAX_LEN} characters"
            )));
        }
        Ok(())
    }
}

impl core::fmt::Debug for Secret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

/// Stored one-way digest of a secret (PHC string).
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    pub fn new(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("PasswordDigest([REDACTED])")
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("failed to hash secret: {0}")]
    Hashing(String),
}

impl From<CredentialError> for DomainError {
    fn from(value: CredentialError) -> Self {
        DomainError::storage(value.to_string())
    }
}

/// Credential verifier contract.
pub trait CredentialVerifier: Send + Sync {
    /// Produce a new salted digest for `secret`.
    fn hash(&self, secret: &Secret) -> Result<PasswordDigest, CredentialError>;

    /// Check `secret` against a stored digest. Malformed digests never match.
    fn verify(&self, secret: &Secret, digest: &PasswordDigest) -> bool;
}

/// Argon2id with the crate's default parameters and a random salt per digest.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Verifier;

impl Argon2Verifier {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialVerifier for Argon2Verifier {
    fn hash(&self, secret: &Secret) -> Result<PasswordDigest, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        let digest = Argon2::default()
            .hash_password(secret.expose().as_bytes(), &salt)
            .map_err(|e| CredentialError::Hashing(e.to_string()))?
            .to_string();
        Ok(PasswordDigest::new(digest))
    }

    fn verify(&self, secret: &Secret, digest: &PasswordDigest) -> bool {
        let Ok(parsed) = PasswordHash::new(digest.as_str()) else {
            return false;
        };
        // Constant-time comparison happens inside the argon2 crate.
        Argon2::default()
            .verify_password(secret.expose().as_bytes(), &parsed)
            .is_ok()
    }
}
