//! Lookup contracts the auth layer consumes from the resource services.
//!
//! Only the minimal shape (id, role, company) crosses this boundary; storage
//! mechanics stay on the other side.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use orgadmin_core::{CompanyId, UserId};

use crate::{Principal, Role};

/// Live role/company state of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: UserId,
    pub role: Role,
    pub company_id: Option<CompanyId>,
}

impl From<Subject> for Principal {
    fn from(value: Subject) -> Self {
        Principal::new(value.id, value.role, value.company_id)
    }
}

/// Minimal company shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySummary {
    pub id: CompanyId,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("lookup failed: {0}")]
pub struct LookupError(pub String);

pub trait SubjectLookup: Send + Sync {
    fn get_subject(&self, id: UserId) -> Result<Option<Subject>, LookupError>;
}

pub trait CompanyLookup: Send + Sync {
    fn get_company(&self, id: CompanyId) -> Result<Option<CompanySummary>, LookupError>;
}

impl<S> SubjectLookup for Arc<S>
where
    S: SubjectLookup + ?Sized,
{
    fn get_subject(&self, id: UserId) -> Result<Option<Subject>, LookupError> {
        (**self).get_subject(id)
    }
}

impl<S> CompanyLookup for Arc<S>
where
    S: CompanyLookup + ?Sized,
{
    fn get_company(&self, id: CompanyId) -> Result<Option<CompanySummary>, LookupError> {
        (**self).get_company(id)
    }
}
