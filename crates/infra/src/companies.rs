//! Companies resource service.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use orgadmin_auth::{CompanyLookup, CompanySummary, LookupError};
use orgadmin_core::{CompanyId, DomainError, DomainResult};

use crate::model::{Company, User};
use crate::store::{EntityStore, WriteLock};

const NAME_MAX_LEN: usize = 255;

#[derive(Debug, Clone, Default)]
pub struct NewCompany {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub active: Option<bool>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

pub struct CompanyService {
    companies: Arc<dyn EntityStore<Company>>,
    users: Arc<dyn EntityStore<User>>,
    // Shared with `UserService`: member detachment must not interleave with user writes.
    write: WriteLock,
}

impl CompanyService {
    pub fn new(
        companies: Arc<dyn EntityStore<Company>>,
        users: Arc<dyn EntityStore<User>>,
        write: WriteLock,
    ) -> Self {
        Self {
            companies,
            users,
            write,
        }
    }

    pub fn create(&self, input: NewCompany, now: DateTime<Utc>) -> DomainResult<Company> {
        let name = validate_name(&input.name)?;
        let _guard = self.write.acquire()?;
        self.ensure_name_free(&name, None)?;

        let company = Company {
            id: CompanyId::new(),
            name,
            active: true,
            description: non_empty(input.description),
            address: non_empty(input.address),
            phone_number: non_empty(input.phone_number),
            created_at: now,
            updated_at: now,
        };
        self.companies.upsert(company.clone())?;

        tracing::info!(company_id = %company.id, "company created");
        Ok(company)
    }

    pub fn find(&self, id: CompanyId) -> DomainResult<Option<Company>> {
        self.companies.get(&id)
    }

    pub fn get(&self, id: CompanyId) -> DomainResult<Company> {
        self.find(id)?.ok_or(DomainError::not_found("company"))
    }

    /// All companies, ordered by name.
    pub fn list(&self) -> DomainResult<Vec<Company>> {
        let mut companies = self.companies.list()?;
        companies.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(companies)
    }

    pub fn update(&self, id: CompanyId, update: CompanyUpdate, now: DateTime<Utc>) -> DomainResult<Company> {
        let _guard = self.write.acquire()?;
        let mut company = self.get(id)?;

        if let Some(name) = update.name {
            let name = validate_name(&name)?;
            self.ensure_name_free(&name, Some(id))?;
            company.name = name;
        }
        if let Some(active) = update.active {
            if company.active != active {
                tracing::info!(company_id = %id, active, "company activation changed");
            }
            company.active = active;
        }
        if update.description.is_some() {
            company.description = non_empty(update.description);
        }
        if update.address.is_some() {
            company.address = non_empty(update.address);
        }
        if update.phone_number.is_some() {
            company.phone_number = non_empty(update.phone_number);
        }
        company.updated_at = now;

        self.companies.upsert(company.clone())?;
        Ok(company)
    }

    /// Delete a company, detaching (not deleting) its members.
    ///
    /// Returns how many users were detached.
    pub fn delete(&self, id: CompanyId, now: DateTime<Utc>) -> DomainResult<usize> {
        let _guard = self.write.acquire()?;
        self.get(id)?;

        let mut detached = 0;
        for mut user in self.users.list()? {
            if user.company_id == Some(id) {
                user.company_id = None;
                user.updated_at = now;
                self.users.upsert(user)?;
                detached += 1;
            }
        }

        self.companies.remove(&id)?;
        tracing::info!(company_id = %id, detached, "company deleted");
        Ok(detached)
    }

    fn ensure_name_free(&self, name: &str, except: Option<CompanyId>) -> DomainResult<()> {
        let taken = self
            .companies
            .list()?
            .iter()
            .any(|c| Some(c.id) != except && c.name.eq_ignore_ascii_case(name));
        if taken {
            return Err(DomainError::conflict(format!("company name '{name}' is already taken")));
        }
        Ok(())
    }
}

impl CompanyLookup for CompanyService {
    fn get_company(&self, id: CompanyId) -> Result<Option<CompanySummary>, LookupError> {
        self.find(id)
            .map(|c| c.map(|c| c.summary()))
            .map_err(|e| LookupError(e.to_string()))
    }
}

fn validate_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("company name cannot be empty"));
    }
    if name.chars().count() > NAME_MAX_LEN {
        return Err(DomainError::validation(format!(
            "company name must be at most {NAME_MAX_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use orgadmin_auth::{PasswordDigest, Role};
    use orgadmin_core::UserId;

    use super::*;
    use crate::store::InMemoryStore;

    fn service() -> (CompanyService, Arc<InMemoryStore<User>>) {
        let users = Arc::new(InMemoryStore::<User>::new());
        let svc = CompanyService::new(Arc::new(InMemoryStore::<Company>::new()), users.clone(), WriteLock::new());
        (svc, users)
    }

    fn named(name: &str) -> NewCompany {
        NewCompany {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn create_trims_and_rejects_duplicates() {
        let (svc, _) = service();
        let now = Utc::now();
        let acme = svc.create(named("  Acme  "), now).unwrap();
        assert_eq!(acme.name, "Acme");
        assert!(acme.active);

        let err = svc.create(named("ACME"), now).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let err = svc.create(named("   "), now).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn update_soft_disables_and_renames() {
        let (svc, _) = service();
        let now = Utc::now();
        let acme = svc.create(named("Acme"), now).unwrap();
        svc.create(named("Globex"), now).unwrap();

        let err = svc
            .update(acme.id, CompanyUpdate { name: Some("globex".into()), ..Default::default() }, now)
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let later = now + Duration::minutes(5);
        let updated = svc
            .update(
                acme.id,
                CompanyUpdate {
                    active: Some(false),
                    address: Some("1 Main St".into()),
                    ..Default::default()
                },
                later,
            )
            .unwrap();
        assert!(!updated.active);
        assert_eq!(updated.address.as_deref(), Some("1 Main St"));
        assert_eq!(updated.updated_at, later);
        assert_eq!(svc.get_company(acme.id).unwrap(), Some(CompanySummary { id: acme.id, name: "Acme".into(), active: false }));
    }

    #[test]
    fn delete_detaches_members() {
        let (svc, users) = service();
        let now = Utc::now();
        let acme = svc.create(named("Acme"), now).unwrap();
        let member = User {
            id: UserId::new(),
            email: "member@acme.test".into(),
            password_digest: PasswordDigest::new("x"),
            first_name: "Mem".into(),
            last_name: None,
            role: Role::User,
            company_id: Some(acme.id),
            created_at: now,
            updated_at: now,
        };
        users.upsert(member.clone()).unwrap();

        assert_eq!(svc.delete(acme.id, now).unwrap(), 1);
        assert!(svc.find(acme.id).unwrap().is_none());

        let after = users.get(&member.id).unwrap().unwrap();
        assert_eq!(after.company_id, None);

        assert!(matches!(svc.delete(acme.id, now), Err(DomainError::NotFound("company"))));
    }

    #[test]
    fn list_is_sorted_by_name() {
        let (svc, _) = service();
        let now = Utc::now();
        svc.create(named("zeta"), now).unwrap();
        svc.create(named("Alpha"), now).unwrap();
        let names: Vec<_> = svc.list().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Alpha", "zeta"]);
    }
}
