//! Process configuration for the HTTP binary.

use std::net::SocketAddr;

use thiserror::Error;

use orgadmin_auth::{ConfigError, Secret, TokenConfig};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_SECRET: &str = "dev-secret";

#[derive(Debug, Error)]
pub enum ApiConfigError {
    #[error(transparent)]
    Token(#[from] ConfigError),

    #[error("invalid BIND_ADDR `{0}`")]
    BindAddr(String),
}

/// Credentials for the SUPERADMIN seeded at startup.
#[derive(Debug, Clone)]
pub struct SuperadminSeed {
    pub email: String,
    pub password: Secret,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub tokens: TokenConfig,
    pub superadmin: Option<SuperadminSeed>,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ApiConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Reads `JWT_SECRET` (or `ACCESS_TOKEN_SECRET`), `BIND_ADDR`,
    /// `SUPERADMIN_EMAIL`/`SUPERADMIN_PASSWORD` plus the token overrides
    /// understood by [`TokenConfig::apply_vars`].
    pub fn from_vars<F>(lookup: F) -> Result<Self, ApiConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("JWT_SECRET")
            .or_else(|| lookup("ACCESS_TOKEN_SECRET"))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                DEV_SECRET.to_string()
            });
        let tokens = TokenConfig::new(secret.into_bytes()).apply_vars(&lookup)?;

        let raw_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .parse()
            .map_err(|_| ApiConfigError::BindAddr(raw_addr.clone()))?;

        let superadmin = match (lookup("SUPERADMIN_EMAIL"), lookup("SUPERADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(SuperadminSeed {
                email,
                password: Secret::new(password),
            }),
            _ => None,
        };

        Ok(Self {
            bind_addr,
            tokens,
            superadmin,
        })
    }
}
