//! Persisted account and company records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use orgadmin_auth::{CompanySummary, PasswordDigest, Resource, Role, Subject};
use orgadmin_core::{CompanyId, Entity, UserId};

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// User account.
///
/// # Invariants
/// - `email` is unique (case-insensitive, stored lower-cased).
/// - SUPERADMIN accounts have no company; other roles have one, except users
///   detached by a company deletion, who keep `company_id = None` until
///   reassigned.
/// - SUPERADMIN accounts are never deleted.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_digest: PasswordDigest,
    pub first_name: String,
    pub last_name: Option<String>,
    pub role: Role,
    pub company_id: Option<CompanyId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &UserId {
        &self.id
    }
}

impl User {
    pub fn subject(&self) -> Subject {
        Subject {
            id: self.id,
            role: self.role,
            company_id: self.company_id,
        }
    }

    /// Authorization target describing this account.
    pub fn resource(&self) -> Resource {
        Resource::user(self.id, self.company_id, self.role)
    }

    /// Safe projection without credentials. `company` is the resolved
    /// membership, `None` for SUPERADMIN and detached accounts.
    pub fn view(&self, company: Option<CompanyRef>) -> UserView {
        UserView {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role,
            company_id: self.company_id,
            company,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// User as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub role: Role,
    pub company_id: Option<CompanyId>,
    pub company: Option<CompanyRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Company reference embedded in a `UserView`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyRef {
    pub id: CompanyId,
    pub name: String,
}

impl From<CompanySummary> for CompanyRef {
    fn from(value: CompanySummary) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Company
// ─────────────────────────────────────────────────────────────────────────────

/// Company (tenant). Owns zero or more users through `User::company_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub active: bool,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Company {
    type Id = CompanyId;

    fn id(&self) -> &CompanyId {
        &self.id
    }
}

impl Company {
    pub fn summary(&self) -> CompanySummary {
        CompanySummary {
            id: self.id,
            name: self.name.clone(),
            active: self.active,
        }
    }

    pub fn resource(&self) -> Resource {
        Resource::company(self.id)
    }
}
