use serde::{Deserialize, Serialize};

use orgadmin_core::{CompanyId, DomainError, DomainResult, UserId};

use crate::Role;

/// The authenticated identity making a request.
///
/// Built once per request (from live account data by the identity resolver)
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
    pub company_id: Option<CompanyId>,
}

impl Principal {
    pub fn new(id: UserId, role: Role, company_id: Option<CompanyId>) -> Self {
        Self {
            id,
            role,
            company_id,
        }
    }

    pub fn is_superadmin(&self) -> bool {
        self.role == Role::SuperAdmin
    }
}

/// Role/company invariant enforced on every account write.
///
/// SUPERADMIN accounts never carry a company; every other role must.
pub fn validate_affiliation(role: Role, company_id: Option<CompanyId>) -> DomainResult<()> {
    match (role.requires_company(), company_id) {
        (false, Some(_)) => Err(DomainError::validation(
            "SUPERADMIN users cannot be associated with a company",
        )),
        (true, None) => Err(DomainError::validation(
            "non-SUPERADMIN users must be associated with a company",
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superadmin_with_company_is_rejected() {
        let err = validate_affiliation(Role::SuperAdmin, Some(CompanyId::new())).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn user_without_company_is_rejected() {
        assert!(validate_affiliation(Role::User, None).is_err());
        assert!(validate_affiliation(Role::Admin, None).is_err());
    }

    #[test]
    fn valid_combinations_pass() {
        assert!(validate_affiliation(Role::SuperAdmin, None).is_ok());
        assert!(validate_affiliation(Role::Admin, Some(CompanyId::new())).is_ok());
        assert!(!Principal::new(UserId::new(), Role::User, Some(CompanyId::new())).is_superadmin());
        assert!(Principal::new(UserId::new(), Role::SuperAdmin, None).is_superadmin());
    }
}
