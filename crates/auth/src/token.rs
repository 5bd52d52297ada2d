//! Token service: issues and verifies signed, time-limited identity assertions.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use orgadmin_core::UserId;

use crate::claims::{validate_claims, AccessClaims, RefreshClaims, TokenUse, TokenValidationError};
use crate::config::TokenConfig;
use crate::Principal;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Current time is at or past the encoded expiry.
    #[error("token has expired")]
    Expired,

    /// Signature, structure, token kind or time window is invalid.
    #[error("token is malformed or has an invalid signature")]
    Malformed,

    #[error("failed to encode token: {0}")]
    Encoding(String),
}

impl From<TokenValidationError> for TokenError {
    fn from(value: TokenValidationError) -> Self {
        match value {
            TokenValidationError::Expired => TokenError::Expired,
            TokenValidationError::NotYetValid | TokenValidationError::InvalidTimeWindow => {
                TokenError::Malformed
            }
        }
    }
}

/// Access + refresh tokens returned on login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Verification seam consumed by the identity resolver.
pub trait TokenVerifier: Send + Sync {
    fn verify_access_token(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, TokenError>;
    fn verify_refresh_token(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, TokenError>;
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn hs256(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// HS256 token service.
///
/// Issue and verify are pure functions of (input, configuration, `now`): the
/// caller supplies the clock, so instances with distinct secrets can coexist
/// in one process.
pub struct TokenService {
    access: KeyPair,
    refresh: KeyPair,
    config: TokenConfig,
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService").field("config", &self.config).finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        let access = KeyPair::hs256(config.access_secret.as_bytes());
        let refresh = KeyPair::hs256(config.effective_refresh_secret().as_bytes());
        Self {
            access,
            refresh,
            config,
        }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    pub fn issue_access_token(&self, principal: &Principal, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = AccessClaims {
            sub: principal.id,
            token_use: TokenUse::Access,
            role: principal.role,
            company_id: principal.company_id,
            issued_at: now,
            expires_at: now + self.config.access_ttl,
        };
        sign(&claims, &self.access.encoding)
    }

    pub fn issue_refresh_token(&self, subject: UserId, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = RefreshClaims {
            sub: subject,
            token_use: TokenUse::Refresh,
            issued_at: now,
            expires_at: now + self.config.refresh_ttl,
        };
        sign(&claims, &self.refresh.encoding)
    }

    pub fn issue_pair(&self, principal: &Principal, now: DateTime<Utc>) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(principal, now)?,
            refresh_token: self.issue_refresh_token(principal.id, now)?,
            token_type: "Bearer",
            expires_in: self.config.access_ttl.num_seconds(),
        })
    }

    /// Decode and validate access claims without collapsing them to a principal.
    pub fn decode_access_claims(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, TokenError> {
        let claims: AccessClaims = open(token, &self.access.decoding)?;
        if claims.token_use != TokenUse::Access {
            return Err(TokenError::Malformed);
        }
        validate_claims(&claims, now, self.config.clock_skew)?;
        Ok(claims)
    }

    pub fn decode_refresh_claims(&self, token: &str, now: DateTime<Utc>) -> Result<RefreshClaims, TokenError> {
        let claims: RefreshClaims = open(token, &self.refresh.decoding)?;
        if claims.token_use != TokenUse::Refresh {
            return Err(TokenError::Malformed);
        }
        validate_claims(&claims, now, self.config.clock_skew)?;
        Ok(claims)
    }
}

impl TokenVerifier for TokenService {
    fn verify_access_token(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, TokenError> {
        self.decode_access_claims(token, now).map(|c| c.principal())
    }

    fn verify_refresh_token(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, TokenError> {
        self.decode_refresh_claims(token, now).map(|c| c.sub)
    }
}

fn sign<C: Serialize>(claims: &C, key: &EncodingKey) -> Result<String, TokenError> {
    encode(&Header::new(Algorithm::HS256), claims, key).map_err(|e| TokenError::Encoding(e.to_string()))
}

/// Verify the signature and deserialize; expiry is checked by `validate_claims`
/// with sub-second precision instead of the registered `exp` claim.
fn open<C: DeserializeOwned>(token: &str, key: &DecodingKey) -> Result<C, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    decode::<C>(token, key, &validation)
        .map(|data| data.claims)
        .map_err(|_| TokenError::Malformed)
}
