use orgadmin_auth::{Principal, Role};
use orgadmin_core::{CompanyId, UserId};

/// Principal context for a request (live identity, role and company).
///
/// Inserted by the auth middleware; immutable for the rest of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn user_id(&self) -> UserId {
        self.principal.id
    }

    pub fn role(&self) -> Role {
        self.principal.role
    }

    pub fn company_id(&self) -> Option<CompanyId> {
        self.principal.company_id
    }
}
