//! Identity resolution: bearer header → live [`Principal`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use orgadmin_core::UserId;

use crate::directory::SubjectLookup;
use crate::token::{TokenError, TokenVerifier};
use crate::Principal;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    #[error("you are not logged in; please log in to get access")]
    NoToken,

    #[error("your token has expired; please log in again")]
    TokenExpired,

    #[error("invalid token; please log in again")]
    TokenInvalid,

    #[error("the user belonging to this token no longer exists")]
    SubjectNotFound,
}

impl ResolveError {
    /// Stable reason code surfaced to clients.
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::NoToken => "NO_TOKEN",
            ResolveError::TokenExpired => "TOKEN_EXPIRED",
            ResolveError::TokenInvalid => "TOKEN_INVALID",
            ResolveError::SubjectNotFound => "SUBJECT_NOT_FOUND",
        }
    }
}

impl From<TokenError> for ResolveError {
    fn from(value: TokenError) -> Self {
        match value {
            TokenError::Expired => ResolveError::TokenExpired,
            TokenError::Malformed | TokenError::Encoding(_) => ResolveError::TokenInvalid,
        }
    }
}

/// Extract the token from an `Authorization` header value.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, ResolveError> {
    let token = header
        .ok_or(ResolveError::NoToken)?
        .strip_prefix(BEARER_PREFIX)
        .ok_or(ResolveError::NoToken)?
        .trim();

    if token.is_empty() {
        return Err(ResolveError::NoToken);
    }
    Ok(token)
}

/// Resolves requests to principals reflecting *current* account state.
///
/// Token claims only establish who the caller is; role and company are always
/// re-read through [`SubjectLookup`], so a role change takes effect on the
/// next request rather than when the token expires.
#[derive(Clone)]
pub struct IdentityResolver {
    tokens: Arc<dyn TokenVerifier>,
    subjects: Arc<dyn SubjectLookup>,
}

impl IdentityResolver {
    pub fn new(tokens: Arc<dyn TokenVerifier>, subjects: Arc<dyn SubjectLookup>) -> Self {
        Self { tokens, subjects }
    }

    pub fn resolve(&self, authorization: Option<&str>, now: DateTime<Utc>) -> Result<Principal, ResolveError> {
        let token = extract_bearer(authorization)?;
        let claimed = self.tokens.verify_access_token(token, now)?;
        let live = self.load(claimed.id)?;

        if live.role != claimed.role || live.company_id != claimed.company_id {
            tracing::debug!(
                user_id = %live.id,
                token_role = %claimed.role,
                live_role = %live.role,
                "token claims are stale; using live account state"
            );
        }

        Ok(live)
    }

    /// Verify a refresh token and return the live principal it belongs to.
    pub fn resolve_refresh(&self, refresh_token: &str, now: DateTime<Utc>) -> Result<Principal, ResolveError> {
        let token = refresh_token.trim();
        if token.is_empty() {
            return Err(ResolveError::NoToken);
        }
        let subject = self.tokens.verify_refresh_token(token, now)?;
        self.load(subject)
    }

    fn load(&self, id: UserId) -> Result<Principal, ResolveError> {
        match self.subjects.get_subject(id) {
            Ok(Some(subject)) => Ok(subject.into()),
            Ok(None) => Err(ResolveError::SubjectNotFound),
            Err(e) => {
                tracing::warn!(user_id = %id, error = %e, "subject lookup failed during resolution");
                Err(ResolveError::SubjectNotFound)
            }
        }
    }
}
