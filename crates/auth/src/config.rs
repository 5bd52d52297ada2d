//! Token service configuration.
//!
//! Configuration is an explicit value handed to [`crate::TokenService::new`];
//! nothing in this crate reads process-wide state on its own.

use chrono::Duration;
use thiserror::Error;

pub const DEFAULT_ACCESS_TTL_SECS: i64 = 24 * 60 * 60;
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// HMAC signing secret. `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(secret.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl core::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SigningSecret([REDACTED])")
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("signing secret must not be empty")]
    EmptySecret,

    #[error("invalid duration for {key}: '{value}'")]
    InvalidDuration { key: &'static str, value: String },
}

/// Recognized options: access secret, refresh secret (defaults to the access
/// secret), access TTL (default 1 day), refresh TTL (default 7 days) and the
/// tolerated clock skew for future `issued_at` values (default none).
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: SigningSecret,
    pub refresh_secret: Option<SigningSecret>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub clock_skew: Duration,
}

impl TokenConfig {
    pub fn new(access_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            access_secret: SigningSecret::new(access_secret),
            refresh_secret: None,
            access_ttl: Duration::seconds(DEFAULT_ACCESS_TTL_SECS),
            refresh_ttl: Duration::seconds(DEFAULT_REFRESH_TTL_SECS),
            clock_skew: Duration::zero(),
        }
    }

    pub fn with_refresh_secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.refresh_secret = Some(SigningSecret::new(secret));
        self
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    /// Accept tokens whose `issued_at` is up to `skew` ahead of the verifier's clock.
    pub fn with_clock_skew(mut self, skew: Duration) -> Self {
        self.clock_skew = skew;
        self
    }

    /// Secret used for refresh tokens (falls back to the access secret).
    pub fn effective_refresh_secret(&self) -> &SigningSecret {
        self.refresh_secret.as_ref().unwrap_or(&self.access_secret)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_secret.as_bytes().is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if matches!(&self.refresh_secret, Some(s) if s.as_bytes().is_empty()) {
            return Err(ConfigError::EmptySecret);
        }
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    ///
    /// Reads `REFRESH_TOKEN_SECRET`, `ACCESS_TOKEN_TTL` (or `JWT_EXPIRE`) and
    /// `REFRESH_TOKEN_TTL` (or `REFRESH_TOKEN_EXPIRE`) and `TOKEN_CLOCK_SKEW`.
    pub fn apply_vars<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup("REFRESH_TOKEN_SECRET").filter(|s| !s.is_empty()) {
            self = self.with_refresh_secret(secret.into_bytes());
        }

        if let Some(value) = lookup("ACCESS_TOKEN_TTL").or_else(|| lookup("JWT_EXPIRE")) {
            self.access_ttl = parse_ttl("ACCESS_TOKEN_TTL", &value)?;
        }

        if let Some(value) = lookup("REFRESH_TOKEN_TTL").or_else(|| lookup("REFRESH_TOKEN_EXPIRE")) {
            self.refresh_ttl = parse_ttl("REFRESH_TOKEN_TTL", &value)?;
        }

        if let Some(value) = lookup("TOKEN_CLOCK_SKEW") {
            self.clock_skew = parse_ttl("TOKEN_CLOCK_SKEW", &value)?;
        }

        self.validate()?;
        Ok(self)
    }
}

/// Parse `<n>d`, `<n>h`, `<n>m`, `<n>s` or bare seconds into a positive duration.
pub fn parse_ttl(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration {
        key,
        value: value.to_string(),
    };

    let trimmed = value.trim();
    let (digits, unit) = match trimmed.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&trimmed[..idx], Some(c.to_ascii_lowercase())),
        Some(_) => (trimmed, None),
        None => return Err(invalid()),
    };

    let n: i64 = digits.parse().map_err(|_| invalid())?;
    if n <= 0 {
        return Err(invalid());
    }

    let duration = match unit {
        Some('d') => Duration::try_days(n),
        Some('h') => Duration::try_hours(n),
        Some('m') => Duration::try_minutes(n),
        Some('s') | None => Duration::try_seconds(n),
        Some(_) => None,
    };

    duration.ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_match_policy() {
        let cfg = TokenConfig::new("s3cret");
        assert_eq!(cfg.access_ttl, Duration::days(1));
        assert_eq!(cfg.refresh_ttl, Duration::days(7));
        assert_eq!(cfg.effective_refresh_secret(), &cfg.access_secret);
        assert_eq!(cfg.clock_skew, Duration::zero());
    }

    #[test]
    fn parse_ttl_units() {
        assert_eq!(parse_ttl("k", "1d").unwrap(), Duration::days(1));
        assert_eq!(parse_ttl("k", "24h").unwrap(), Duration::hours(24));
        assert_eq!(parse_ttl("k", "15m").unwrap(), Duration::minutes(15));
        assert_eq!(parse_ttl("k", "90").unwrap(), Duration::seconds(90));
        assert!(parse_ttl("k", "").is_err());
        assert!(parse_ttl("k", "0d").is_err());
        assert!(parse_ttl("k", "7w").is_err());
        assert!(parse_ttl("k", "d").is_err());
    }

    #[test]
    fn vars_override_defaults() {
        let vars: HashMap<&str, &str> = [
            ("REFRESH_TOKEN_SECRET", "other"),
            ("JWT_EXPIRE", "2h"),
            ("REFRESH_TOKEN_TTL", "30d"),
            ("TOKEN_CLOCK_SKEW", "5s"),
        ]
        .into_iter()
        .collect();

        let cfg = TokenConfig::new("s3cret")
            .apply_vars(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(cfg.access_ttl, Duration::hours(2));
        assert_eq!(cfg.refresh_ttl, Duration::days(30));
        assert_eq!(cfg.effective_refresh_secret().as_bytes(), b"other");
        assert_eq!(cfg.clock_skew, Duration::seconds(5));
    }

    #[test]
    fn empty_secret_is_rejected() {
        let err = TokenConfig::new("").apply_vars(|_| None).unwrap_err();
        assert_eq!(err, ConfigError::EmptySecret);
    }

    #[test]
    fn secret_debug_is_redacted() {
        let cfg = TokenConfig::new("s3cret");
        assert!(!format!("{cfg:?}").contains("s3cret"));
    }
}
