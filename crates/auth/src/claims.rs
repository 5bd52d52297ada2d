use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use orgadmin_core::{CompanyId, UserId};

use crate::{Principal, Role};

/// Which kind of token a set of claims belongs to.
///
/// Carried inside the signed payload so a refresh token can never be replayed
/// as an access token (and vice versa), even when both share a secret.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenUse {
    Access,
    Refresh,
}

/// Claims of a short-lived access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject / account identifier.
    pub sub: UserId,

    pub token_use: TokenUse,

    /// Role at issuance. Informational only: the identity resolver re-reads
    /// the live role before authorizing anything.
    pub role: Role,

    /// Company affiliation at issuance.
    pub company_id: Option<CompanyId>,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

impl AccessClaims {
    pub fn principal(&self) -> Principal {
        Principal::new(self.sub, self.role, self.company_id)
    }
}

/// Claims of a long-lived refresh token (subject only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: UserId,
    pub token_use: TokenUse,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Common time window shared by every claims type.
pub trait TimeWindow {
    fn issued_at(&self) -> DateTime<Utc>;
    fn expires_at(&self) -> DateTime<Utc>;
}

impl TimeWindow for AccessClaims {
    fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl TimeWindow for RefreshClaims {
    fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate a claims time window.
///
/// The expiry boundary is inclusive: a token checked exactly at `expires_at`
/// is already expired. `leeway` only relaxes the `issued_at` check, so a token
/// minted by a host whose clock runs slightly ahead is still accepted; expiry
/// is never extended.
///
/// Note: this validates the *claims* only. Signature verification happens in
/// [`crate::TokenService`].
pub fn validate_claims<C: TimeWindow>(
    claims: &C,
    now: DateTime<Utc>,
    leeway: Duration,
) -> Result<(), TokenValidationError> {
    if claims.expires_at() <= claims.issued_at() {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now + leeway < claims.issued_at() {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at() {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn refresh(issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> RefreshClaims {
        RefreshClaims {
            sub: UserId::new(),
            token_use: TokenUse::Refresh,
            issued_at,
            expires_at,
        }
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let claims = refresh(t, t + Duration::days(1));

        assert_eq!(
            validate_claims(&claims, t + Duration::days(1), Duration::zero()),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            validate_claims(&claims, t + Duration::days(1) - Duration::milliseconds(1), Duration::zero()),
            Ok(())
        );
        assert_eq!(
            validate_claims(&claims, t + Duration::days(1), Duration::minutes(5)),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn future_issued_at_is_rejected() {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let claims = refresh(t, t + Duration::hours(1));
        assert_eq!(
            validate_claims(&claims, t - Duration::seconds(1), Duration::zero()),
            Err(TokenValidationError::NotYetValid)
        );
    }

    #[test]
    fn leeway_tolerates_small_clock_skew() {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let claims = refresh(t, t + Duration::hours(1));
        let skew = Duration::seconds(5);

        assert_eq!(validate_claims(&claims, t - Duration::seconds(2), skew), Ok(()));
        assert_eq!(validate_claims(&claims, t - skew, skew), Ok(()));
        assert_eq!(
            validate_claims(&claims, t - Duration::seconds(6), skew),
            Err(TokenValidationError::NotYetValid)
        );
    }

    #[test]
    fn inverted_window_is_rejected() {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let claims = refresh(t, t);
        assert_eq!(
            validate_claims(&claims, t, Duration::hours(1)),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }
}
