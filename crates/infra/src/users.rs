//! Users resource service.
//!
//! This service is authorization-agnostic: callers decide *whether* an
//! operation is allowed (see `orgadmin_auth::authorize`), this layer enforces
//! the data invariants that hold no matter who is asking.

use std::sync::{Arc, MutexGuard};

use chrono::{DateTime, Utc};

use orgadmin_auth::{
    validate_affiliation, CompanyLookup, CredentialVerifier, LookupError, Role, Secret, Subject, SubjectLookup,
};
use orgadmin_core::{CompanyId, DomainError, DomainResult, UserId};

use crate::model::{CompanyRef, User, UserView};
use crate::store::{EntityStore, WriteLock};

const NAME_MAX_LEN: usize = 50;
const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;

// ─────────────────────────────────────────────────────────────────────────────
// Inputs
// ─────────────────────────────────────────────────────────────────────────────

/// Admin-issued account creation (explicit role and company).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: Secret,
    pub first_name: String,
    pub last_name: Option<String>,
    pub role: Role,
    pub company_id: Option<CompanyId>,
}

/// Self-service registration. The role is always USER.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: Secret,
    pub first_name: String,
    pub last_name: Option<String>,
    pub company_id: CompanyId,
}

/// Profile fields any account may change on itself.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Reassignment {
    pub role: Role,
    pub company_id: Option<CompanyId>,
}

#[derive(Debug, Clone, Default)]
pub struct UserSearch {
    /// Case-insensitive match against first name, last name and email.
    pub text: Option<String>,
    pub company_id: Option<CompanyId>,
    pub role: Option<Role>,
    /// 1-based; defaults to 1.
    pub page: Option<usize>,
    /// Defaults to 10, capped at 100.
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct UserPage {
    pub users: Vec<UserView>,
    pub total: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Service
// ─────────────────────────────────────────────────────────────────────────────

pub struct UserService {
    users: Arc<dyn EntityStore<User>>,
    companies: Arc<dyn CompanyLookup>,
    credentials: Arc<dyn CredentialVerifier>,
    // Shared with `CompanyService`, so a membership check and the write that
    // relies on it cannot straddle a company deletion.
    write: WriteLock,
}

impl UserService {
    pub fn new(
        users: Arc<dyn EntityStore<User>>,
        companies: Arc<dyn CompanyLookup>,
        credentials: Arc<dyn CredentialVerifier>,
        write: WriteLock,
    ) -> Self {
        Self {
            users,
            companies,
            credentials,
            write,
        }
    }

    /// Seed a SUPERADMIN account unless one with `email` already exists.
    ///
    /// Returns the created account, or `None` when nothing was done.
    pub fn ensure_superadmin(&self, email: &str, password: Secret, now: DateTime<Utc>) -> DomainResult<Option<User>> {
        let email = normalize_email(email)?;
        if self.find_by_email(&email)?.is_some() {
            return Ok(None);
        }

        let user = self.create(
            NewUser {
                email,
                password,
                first_name: "Super".to_string(),
                last_name: Some("Admin".to_string()),
                role: Role::SuperAdmin,
                company_id: None,
            },
            now,
        )?;
        Ok(Some(user))
    }

    pub fn register(&self, input: Registration, now: DateTime<Utc>) -> DomainResult<User> {
        self.create(
            NewUser {
                email: input.email,
                password: input.password,
                first_name: input.first_name,
                last_name: input.last_name,
                role: Role::User,
                company_id: Some(input.company_id),
            },
            now,
        )
    }

    pub fn create(&self, input: NewUser, now: DateTime<Utc>) -> DomainResult<User> {
        let email = normalize_email(&input.email)?;
        let first_name = validate_first_name(&input.first_name)?;
        let last_name = validate_last_name(input.last_name)?;
        input.password.validate_length()?;
        validate_affiliation(input.role, input.company_id)?;

        let password_digest = self.credentials.hash(&input.password)?;

        let _guard = self.lock()?;
        if let Some(company_id) = input.company_id {
            self.ensure_company_assignable(company_id)?;
        }
        self.ensure_email_free(&email, None)?;

        let user = User {
            id: UserId::new(),
            email,
            password_digest,
            first_name,
            last_name,
            role: input.role,
            company_id: input.company_id,
            created_at: now,
            updated_at: now,
        };
        self.users.upsert(user.clone())?;

        tracing::info!(user_id = %user.id, role = %user.role, "user created");
        Ok(user)
    }

    pub fn find(&self, id: UserId) -> DomainResult<Option<User>> {
        self.users.get(&id)
    }

    pub fn get(&self, id: UserId) -> DomainResult<User> {
        self.find(id)?.ok_or(DomainError::not_found("user"))
    }

    pub fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let email = email.trim().to_lowercase();
        Ok(self.users.list()?.into_iter().find(|u| u.email == email))
    }

    /// All users, newest first.
    pub fn list_all(&self) -> DomainResult<Vec<User>> {
        let mut users = self.users.list()?;
        newest_first(&mut users);
        Ok(users)
    }

    /// Members of one company, newest first.
    pub fn list_by_company(&self, company_id: CompanyId) -> DomainResult<Vec<User>> {
        let mut users: Vec<User> = self
            .users
            .list()?
            .into_iter()
            .filter(|u| u.company_id == Some(company_id))
            .collect();
        newest_first(&mut users);
        Ok(users)
    }

    pub fn search(&self, query: &UserSearch) -> DomainResult<UserPage> {
        let needle = query
            .text
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());

        let mut matches: Vec<User> = self
            .users
            .list()?
            .into_iter()
            .filter(|u| query.company_id.is_none_or(|c| u.company_id == Some(c)))
            .filter(|u| query.role.is_none_or(|r| u.role == r))
            .filter(|u| match &needle {
                Some(n) => {
                    u.first_name.to_lowercase().contains(n)
                        || u.last_name.as_deref().is_some_and(|l| l.to_lowercase().contains(n))
                        || u.email.contains(n)
                }
                None => true,
            })
            .collect();
        newest_first(&mut matches);

        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let page = query.page.unwrap_or(1).max(1);
        let total = matches.len();

        let users = matches
            .iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .map(|u| self.view(u))
            .collect();

        Ok(UserPage {
            users,
            total,
            total_pages: total.div_ceil(limit),
            current_page: page,
        })
    }

    /// Apply a profile change and an optional role/company reassignment.
    ///
    /// Every field is validated before anything is written; a rejected
    /// request leaves the account untouched.
    pub fn update(
        &self,
        id: UserId,
        profile: ProfileUpdate,
        reassignment: Option<Reassignment>,
        now: DateTime<Utc>,
    ) -> DomainResult<User> {
        if let Some(change) = reassignment {
            validate_affiliation(change.role, change.company_id)?;
        }

        let _guard = self.lock()?;
        let mut user = self.get(id)?;

        if let Some(email) = profile.email {
            let email = normalize_email(&email)?;
            if email != user.email {
                self.ensure_email_free(&email, Some(id))?;
                user.email = email;
            }
        }
        if let Some(first_name) = profile.first_name {
            user.first_name = validate_first_name(&first_name)?;
        }
        if profile.last_name.is_some() {
            user.last_name = validate_last_name(profile.last_name)?;
        }

        if let Some(change) = reassignment {
            if user.role == Role::SuperAdmin && change.role != Role::SuperAdmin {
                return Err(DomainError::invariant("SUPERADMIN users cannot be demoted"));
            }
            if let Some(company_id) = change.company_id
                && user.company_id != Some(company_id)
            {
                self.ensure_company_assignable(company_id)?;
            }

            if user.role != change.role || user.company_id != change.company_id {
                tracing::info!(
                    user_id = %id,
                    from_role = %user.role,
                    to_role = %change.role,
                    "user reassigned"
                );
            }
            user.role = change.role;
            user.company_id = change.company_id;
        }
        user.updated_at = now;

        self.users.upsert(user.clone())?;
        Ok(user)
    }

    /// Replace the password after verifying the current one.
    pub fn update_password(&self, id: UserId, current: &Secret, new: Secret, now: DateTime<Utc>) -> DomainResult<()> {
        new.validate_length()?;
        let user = self.get(id)?;
        if !self.credentials.verify(current, &user.password_digest) {
            return Err(DomainError::validation("current password is incorrect"));
        }
        let digest = self.credentials.hash(&new)?;

        let _guard = self.lock()?;
        let mut user = self.get(id)?;
        user.password_digest = digest;
        user.updated_at = now;
        self.users.upsert(user)?;

        tracing::info!(user_id = %id, "password updated");
        Ok(())
    }

    /// Delete an account. SUPERADMIN accounts are never deletable.
    pub fn delete(&self, id: UserId) -> DomainResult<User> {
        let _guard = self.lock()?;
        let user = self.get(id)?;
        if user.role == Role::SuperAdmin {
            return Err(DomainError::invariant("SUPERADMIN users cannot be deleted"));
        }
        self.users.remove(&id)?;

        tracing::info!(user_id = %id, "user deleted");
        Ok(user)
    }

    /// Check credentials. Unknown email and wrong password are indistinguishable.
    pub fn authenticate(&self, email: &str, password: &Secret) -> DomainResult<User> {
        let Some(user) = self.find_by_email(email)? else {
            return Err(DomainError::InvalidCredentials);
        };
        if !self.credentials.verify(password, &user.password_digest) {
            tracing::debug!(user_id = %user.id, "password mismatch");
            return Err(DomainError::InvalidCredentials);
        }
        Ok(user)
    }

    /// Client projection with the company name resolved.
    pub fn view(&self, user: &User) -> UserView {
        let company = user.company_id.and_then(|id| match self.companies.get_company(id) {
            Ok(summary) => summary.map(CompanyRef::from),
            Err(e) => {
                tracing::warn!(user_id = %user.id, company_id = %id, error = %e, "company lookup failed");
                None
            }
        });
        user.view(company)
    }

    fn lock(&self) -> DomainResult<MutexGuard<'_, ()>> {
        self.write.acquire()
    }

    fn ensure_email_free(&self, email: &str, except: Option<UserId>) -> DomainResult<()> {
        let taken = self
            .users
            .list()?
            .iter()
            .any(|u| Some(u.id) != except && u.email == email);
        if taken {
            return Err(DomainError::conflict("email already registered"));
        }
        Ok(())
    }

    fn ensure_company_assignable(&self, company_id: CompanyId) -> DomainResult<()> {
        let company = self
            .companies
            .get_company(company_id)
            .map_err(|e| DomainError::storage(e.to_string()))?
            .ok_or_else(|| DomainError::validation("invalid company id"))?;
        if !company.active {
            return Err(DomainError::validation("company is inactive"));
        }
        Ok(())
    }
}

impl SubjectLookup for UserService {
    fn get_subject(&self, id: UserId) -> Result<Option<Subject>, LookupError> {
        self.find(id)
            .map(|u| u.map(|u| u.subject()))
            .map_err(|e| LookupError(e.to_string()))
    }
}

fn newest_first(users: &mut [User]) {
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.as_uuid().cmp(a.id.as_uuid())));
}

fn normalize_email(email: &str) -> DomainResult<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if !valid {
        return Err(DomainError::validation("please enter a valid email"));
    }
    Ok(email)
}

fn validate_first_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > NAME_MAX_LEN {
        return Err(DomainError::validation(format!(
            "first name must be between 1 and {NAME_MAX_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn validate_last_name(name: Option<String>) -> DomainResult<Option<String>> {
    let name = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    if name.as_ref().is_some_and(|n| n.chars().count() > NAME_MAX_LEN) {
        return Err(DomainError::validation(format!(
            "last name must be less than {NAME_MAX_LEN} characters"
        )));
    }
    Ok(name)
}
