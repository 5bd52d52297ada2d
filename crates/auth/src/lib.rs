//! `orgadmin-auth`: pure authentication/authorization boundary.
//!
//! This crate is decoupled from HTTP and storage: account data
//! arrives through the lookup traits in [`directory`], and every decision is a
//! value the caller branches on.

pub mod authorize;
pub mod claims;
pub mod config;
pub mod directory;
pub mod password;
pub mod principal;
pub mod resolver;
pub mod roles;
pub mod token;

pub use authorize::{authorize, authorize_reassignment, Action, Decision, DenyReason, Resource, ResourceKind};
pub use claims::{validate_claims, AccessClaims, RefreshClaims, TokenUse, TokenValidationError};
pub use config::{ConfigError, SigningSecret, TokenConfig};
pub use directory::{CompanyLookup, CompanySummary, LookupError, Subject, SubjectLookup};
pub use password::{Argon2Verifier, CredentialError, CredentialVerifier, PasswordDigest, Secret};
pub use principal::{validate_affiliation, Principal};
pub use resolver::{extract_bearer, IdentityResolver, ResolveError};
pub use roles::{Role, UnknownRole};
pub use token::{TokenError, TokenPair, TokenService, TokenVerifier};
