//! API-side authorization guard.
//!
//! Handlers call [`require`] before touching the resource services, so the
//! services themselves stay authorization-agnostic.

use orgadmin_auth::{authorize, authorize_reassignment, Action, Resource};

use crate::app::errors::ApiError;
use crate::context::PrincipalContext;

pub fn require(principal: &PrincipalContext, action: Action, resource: &Resource) -> Result<(), ApiError> {
    authorize(principal.principal(), action, resource)
        .into_result()
        .map_err(|reason| {
            tracing::info!(
                user_id = %principal.user_id(),
                action = action.as_str(),
                reason = reason.code(),
                "authorization denied"
            );
            ApiError::Forbidden(reason)
        })
}

/// Guard a role/company change against both the current and the proposed state.
pub fn require_reassignment(
    principal: &PrincipalContext,
    current: &Resource,
    proposed: &Resource,
) -> Result<(), ApiError> {
    authorize_reassignment(principal.principal(), current, proposed)
        .into_result()
        .map_err(|reason| {
            tracing::info!(
                user_id = %principal.user_id(),
                action = "change-role-or-company",
                reason = reason.code(),
                "authorization denied"
            );
            ApiError::Forbidden(reason)
        })
}
