//! Authorization engine: a pure decision function over (principal, action, resource).
//!
//! - No IO
//! - No panics
//! - No hidden state: identical inputs always yield identical decisions
//!
//! Evaluation order (first match wins):
//! 1. deleting a SUPERADMIN target is denied for everyone (lifecycle invariant)
//! 2. SUPERADMIN principals are allowed
//! 3. the action's policy: role gate, company scope, or self/ADMIN target rules
//! 4. otherwise `INSUFFICIENT_PERMISSIONS`

use serde::{Deserialize, Serialize};
use thiserror::Error;

use orgadmin_core::{CompanyId, UserId};

use crate::{Principal, Role};

/// What the principal is trying to do.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    ListAllUsers,
    SearchUsers,
    ListCompanyUsers,
    ViewUser,
    CreateUser,
    CreateAdmin,
    ModifyUser,
    ChangePassword,
    ChangeRoleOrCompany,
    DeleteUser,
    ListCompanies,
    ViewCompany,
    CreateCompany,
    UpdateCompany,
    DeleteCompany,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ListAllUsers => "list-all-users",
            Action::SearchUsers => "search-users",
            Action::ListCompanyUsers => "list-company-users",
            Action::ViewUser => "view",
            Action::CreateUser => "create-user",
            Action::CreateAdmin => "create-admin",
            Action::ModifyUser => "modify",
            Action::ChangePassword => "change-password",
            Action::ChangeRoleOrCompany => "change-role-or-company",
            Action::DeleteUser => "delete",
            Action::ListCompanies => "list-companies",
            Action::ViewCompany => "view-company",
            Action::CreateCompany => "create-company",
            Action::UpdateCompany => "update-company",
            Action::DeleteCompany => "delete-company",
        }
    }

    fn policy(&self) -> Policy {
        use Role::{Admin, User};

        match self {
            Action::ListAllUsers => Policy::RoleGated(&[Admin]),
            Action::SearchUsers => Policy::RoleGated(&[Admin, User]),
            Action::CreateAdmin
            | Action::DeleteUser
            | Action::ListCompanies
            | Action::CreateCompany
            | Action::UpdateCompany
            | Action::DeleteCompany => Policy::RoleGated(&[]),
            Action::ListCompanyUsers | Action::CreateUser => Policy::CompanyScoped(&[Admin]),
            Action::ViewCompany => Policy::CompanyScoped(&[Admin, User]),
            Action::ViewUser => Policy::TargetUser(TargetRule::View),
            Action::ModifyUser | Action::ChangePassword => Policy::TargetUser(TargetRule::Modify),
            Action::ChangeRoleOrCompany => Policy::TargetUser(TargetRule::Reassign),
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SUPERADMIN is implicitly allowed everywhere, so it never appears in these sets.
#[derive(Debug, Copy, Clone)]
enum Policy {
    RoleGated(&'static [Role]),
    CompanyScoped(&'static [Role]),
    TargetUser(TargetRule),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum TargetRule {
    View,
    Modify,
    Reassign,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    User,
    Company,
}

/// Target of an action and its ownership attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub kind: ResourceKind,
    pub owner_company_id: Option<CompanyId>,
    pub target_subject_id: Option<UserId>,
    pub target_role: Option<Role>,
}

impl Resource {
    /// An existing user account.
    pub fn user(id: UserId, company_id: Option<CompanyId>, role: Role) -> Self {
        Self {
            kind: ResourceKind::User,
            owner_company_id: company_id,
            target_subject_id: Some(id),
            target_role: Some(role),
        }
    }

    /// A user account that does not exist yet (creation, or a proposed state).
    pub fn prospective_user(company_id: Option<CompanyId>, role: Role) -> Self {
        Self {
            kind: ResourceKind::User,
            owner_company_id: company_id,
            target_subject_id: None,
            target_role: Some(role),
        }
    }

    /// The set of users belonging to one company.
    pub fn company_users(company_id: CompanyId) -> Self {
        Self {
            kind: ResourceKind::User,
            owner_company_id: Some(company_id),
            target_subject_id: None,
            target_role: None,
        }
    }

    pub fn company(id: CompanyId) -> Self {
        Self {
            kind: ResourceKind::Company,
            owner_company_id: Some(id),
            target_subject_id: None,
            target_role: None,
        }
    }

    /// An unscoped collection (all users, all companies).
    pub fn collection(kind: ResourceKind) -> Self {
        Self {
            kind,
            owner_company_id: None,
            target_subject_id: None,
            target_role: None,
        }
    }
}

/// Why an action was denied. Each variant has a stable `code()`.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenyReason {
    #[error("you do not have permission to perform this action")]
    InsufficientRole,

    #[error("you are not associated with a company")]
    NoCompanyAssociation,

    #[error("you do not have permission to access this company")]
    CompanyAccessDenied,

    #[error("the target user belongs to a different company")]
    CompanyMismatch,

    #[error("admins cannot modify other admins")]
    AdminModificationDenied,

    #[error("insufficient permissions")]
    InsufficientPermissions,

    #[error("SUPERADMIN users cannot be deleted")]
    SuperadminUndeletable,
}

impl DenyReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::InsufficientRole => "INSUFFICIENT_ROLE",
            DenyReason::NoCompanyAssociation => "NO_COMPANY_ASSOCIATION",
            DenyReason::CompanyAccessDenied => "COMPANY_ACCESS_DENIED",
            DenyReason::CompanyMismatch => "COMPANY_MISMATCH",
            DenyReason::AdminModificationDenied => "ADMIN_MODIFICATION_DENIED",
            DenyReason::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            DenyReason::SuperadminUndeletable => "SUPERADMIN_UNDELETABLE",
        }
    }

    /// Denials caused by a data invariant rather than the caller's rights.
    pub fn is_invariant(&self) -> bool {
        matches!(self, DenyReason::SuperadminUndeletable)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(reason),
        }
    }

    fn and_then(self, next: impl FnOnce() -> Decision) -> Decision {
        match self {
            Decision::Allow => next(),
            deny => deny,
        }
    }
}

/// Decide whether `principal` may perform `action` on `resource`.
pub fn authorize(principal: &Principal, action: Action, resource: &Resource) -> Decision {
    if action == Action::DeleteUser && resource.target_role == Some(Role::SuperAdmin) {
        return Decision::Deny(DenyReason::SuperadminUndeletable);
    }

    if principal.is_superadmin() {
        return Decision::Allow;
    }

    match effective_action(action, resource).policy() {
        Policy::RoleGated(roles) => role_gate(principal, roles),
        Policy::CompanyScoped(roles) => {
            role_gate(principal, roles).and_then(|| company_scope(principal, resource))
        }
        Policy::TargetUser(rule) => target_user(principal, rule, resource),
    }
}

/// Authorize a role/company change against both the current and the proposed
/// state, so an ADMIN can neither pull a user out of their company nor grant
/// ADMIN/SUPERADMIN.
pub fn authorize_reassignment(principal: &Principal, current: &Resource, proposed: &Resource) -> Decision {
    authorize(principal, Action::ChangeRoleOrCompany, current).and_then(|| {
        let proposed = Resource {
            target_subject_id: current.target_subject_id,
            ..proposed.clone()
        };
        authorize(principal, Action::ChangeRoleOrCompany, &proposed)
    })
}

/// Creating an account with an administrative role is the SUPERADMIN-only
/// "create admin" action, whatever route it arrives through.
fn effective_action(action: Action, resource: &Resource) -> Action {
    match (action, resource.target_role) {
        (Action::CreateUser, Some(Role::Admin | Role::SuperAdmin)) => Action::CreateAdmin,
        _ => action,
    }
}

fn role_gate(principal: &Principal, allowed: &[Role]) -> Decision {
    if allowed.contains(&principal.role) {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::InsufficientRole)
    }
}

fn company_scope(principal: &Principal, resource: &Resource) -> Decision {
    let Some(own) = principal.company_id else {
        return Decision::Deny(DenyReason::NoCompanyAssociation);
    };

    match resource.owner_company_id {
        Some(owner) if owner == own => Decision::Allow,
        _ => Decision::Deny(DenyReason::CompanyAccessDenied),
    }
}

fn target_user(principal: &Principal, rule: TargetRule, resource: &Resource) -> Decision {
    let is_self = resource.target_subject_id == Some(principal.id);
    if is_self && rule != TargetRule::Reassign {
        return Decision::Allow;
    }

    if principal.role != Role::Admin {
        return Decision::Deny(DenyReason::InsufficientPermissions);
    }

    let Some(own) = principal.company_id else {
        return Decision::Deny(DenyReason::NoCompanyAssociation);
    };
    if resource.owner_company_id != Some(own) {
        return Decision::Deny(DenyReason::CompanyMismatch);
    }

    match (rule, resource.target_role) {
        (TargetRule::View, _) => Decision::Allow,
        (_, Some(Role::User)) => Decision::Allow,
        (_, Some(Role::Admin | Role::SuperAdmin)) => Decision::Deny(DenyReason::AdminModificationDenied),
        (_, None) => Decision::Deny(DenyReason::InsufficientPermissions),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const ALL_ACTIONS: [Action; 15] = [
        Action::ListAllUsers,
        Action::SearchUsers,
        Action::ListCompanyUsers,
        Action::ViewUser,
        Action::CreateUser,
        Action::CreateAdmin,
        Action::ModifyUser,
        Action::ChangePassword,
        Action::ChangeRoleOrCompany,
        Action::DeleteUser,
        Action::ListCompanies,
        Action::ViewCompany,
        Action::CreateCompany,
        Action::UpdateCompany,
        Action::DeleteCompany,
    ];

    fn principal(role: Role, company: Option<CompanyId>) -> Principal {
        Principal::new(UserId::new(), role, company)
    }

    #[test]
    fn admin_cannot_modify_user_in_other_company() {
        let c1 = CompanyId::new();
        let c2 = CompanyId::new();
        let admin = principal(Role::Admin, Some(c1));
        let target = Resource {
            kind: ResourceKind::User,
            owner_company_id: Some(c2),
            target_subject_id: Some(UserId::new()),
            target_role: None,
        };

        assert_eq!(
            authorize(&admin, Action::ModifyUser, &target),
            Decision::Deny(DenyReason::CompanyMismatch)
        );
    }

    #[test]
    fn user_can_view_self_without_company_on_resource() {
        let user = principal(Role::User, Some(CompanyId::new()));
        let me = Resource {
            kind: ResourceKind::User,
            owner_company_id: None,
            target_subject_id: Some(user.id),
            target_role: None,
        };
        assert_eq!(authorize(&user, Action::ViewUser, &me), Decision::Allow);
    }

    #[test]
    fn superadmin_cannot_delete_superadmin() {
        let sa = principal(Role::SuperAdmin, None);
        let other = Resource::user(UserId::new(), None, Role::SuperAdmin);

        let decision = authorize(&sa, Action::DeleteUser, &other);
        assert_eq!(decision, Decision::Deny(DenyReason::SuperadminUndeletable));
        let reason = decision.into_result().unwrap_err();
        assert!(reason.is_invariant());
        assert_ne!(reason.code(), DenyReason::InsufficientRole.code());
    }

    #[test]
    fn user_cannot_list_all_users() {
        let user = principal(Role::User, Some(CompanyId::new()));
        assert_eq!(
            authorize(&user, Action::ListAllUsers, &Resource::collection(ResourceKind::User)),
            Decision::Deny(DenyReason::InsufficientRole)
        );
    }

    #[test]
    fn admin_cannot_modify_another_admin_in_same_company() {
        let c = CompanyId::new();
        let admin = principal(Role::Admin, Some(c));
        let peer = Resource::user(UserId::new(), Some(c), Role::Admin);
        assert_eq!(
            authorize(&admin, Action::ModifyUser, &peer),
            Decision::Deny(DenyReason::AdminModificationDenied)
        );
        // Viewing a peer admin is fine.
        assert_eq!(authorize(&admin, Action::ViewUser, &peer), Decision::Allow);
    }

    #[test]
    fn company_scoped_listing() {
        let c1 = CompanyId::new();
        let admin = principal(Role::Admin, Some(c1));
        assert_eq!(
            authorize(&admin, Action::ListCompanyUsers, &Resource::company_users(c1)),
            Decision::Allow
        );
        assert_eq!(
            authorize(&admin, Action::ListCompanyUsers, &Resource::company_users(CompanyId::new())),
            Decision::Deny(DenyReason::CompanyAccessDenied)
        );

        let orphan = principal(Role::Admin, None);
        assert_eq!(
            authorize(&orphan, Action::ListCompanyUsers, &Resource::company_users(c1)),
            Decision::Deny(DenyReason::NoCompanyAssociation)
        );

        let user = principal(Role::User, Some(c1));
        assert_eq!(
            authorize(&user, Action::ListCompanyUsers, &Resource::company_users(c1)),
            Decision::Deny(DenyReason::InsufficientRole)
        );
    }

    #[test]
    fn members_can_view_their_company_only() {
        let c1 = CompanyId::new();
        let user = principal(Role::User, Some(c1));
        assert_eq!(authorize(&user, Action::ViewCompany, &Resource::company(c1)), Decision::Allow);
        assert_eq!(
            authorize(&user, Action::ViewCompany, &Resource::company(CompanyId::new())),
            Decision::Deny(DenyReason::CompanyAccessDenied)
        );
    }

    #[test]
    fn admin_creates_users_but_not_admins() {
        let c = CompanyId::new();
        let admin = principal(Role::Admin, Some(c));

        assert_eq!(
            authorize(&admin, Action::CreateUser, &Resource::prospective_user(Some(c), Role::User)),
            Decision::Allow
        );
        assert_eq!(
            authorize(&admin, Action::CreateUser, &Resource::prospective_user(Some(c), Role::Admin)),
            Decision::Deny(DenyReason::InsufficientRole)
        );
        assert_eq!(
            authorize(
                &admin,
                Action::CreateUser,
                &Resource::prospective_user(Some(CompanyId::new()), Role::User)
            ),
            Decision::Deny(DenyReason::CompanyAccessDenied)
        );
    }

    #[test]
    fn self_service_cannot_touch_role_or_company() {
        let c = CompanyId::new();
        let user = principal(Role::User, Some(c));
        let me = Resource::user(user.id, Some(c), Role::User);

        assert_eq!(authorize(&user, Action::ModifyUser, &me), Decision::Allow);
        assert_eq!(authorize(&user, Action::ChangePassword, &me), Decision::Allow);
        assert_eq!(
            authorize(&user, Action::ChangeRoleOrCompany, &me),
            Decision::Deny(DenyReason::InsufficientPermissions)
        );

        let admin = principal(Role::Admin, Some(c));
        let admin_self = Resource::user(admin.id, Some(c), Role::Admin);
        assert_eq!(
            authorize(&admin, Action::ChangeRoleOrCompany, &admin_self),
            Decision::Deny(DenyReason::AdminModificationDenied)
        );
    }

    #[test]
    fn reassignment_checks_proposed_state() {
        let c1 = CompanyId::new();
        let admin = principal(Role::Admin, Some(c1));
        let target = Resource::user(UserId::new(), Some(c1), Role::User);

        let promote = Resource::prospective_user(Some(c1), Role::Admin);
        assert_eq!(
            authorize_reassignment(&admin, &target, &promote),
            Decision::Deny(DenyReason::AdminModificationDenied)
        );

        let poach = Resource::prospective_user(Some(CompanyId::new()), Role::User);
        assert_eq!(
            authorize_reassignment(&admin, &target, &poach),
            Decision::Deny(DenyReason::CompanyMismatch)
        );

        let to_superadmin = Resource::prospective_user(None, Role::SuperAdmin);
        assert_eq!(
            authorize_reassignment(&admin, &target, &to_superadmin),
            Decision::Deny(DenyReason::CompanyMismatch)
        );

        let noop = Resource::prospective_user(Some(c1), Role::User);
        assert_eq!(authorize_reassignment(&admin, &target, &noop), Decision::Allow);
    }

    #[test]
    fn plain_user_cannot_view_others() {
        let c = CompanyId::new();
        let user = principal(Role::User, Some(c));
        let colleague = Resource::user(UserId::new(), Some(c), Role::User);
        assert_eq!(
            authorize(&user, Action::ViewUser, &colleague),
            Decision::Deny(DenyReason::InsufficientPermissions)
        );
    }

    #[test]
    fn superadmin_only_actions() {
        let admin = principal(Role::Admin, Some(CompanyId::new()));
        for action in [
            Action::CreateCompany,
            Action::UpdateCompany,
            Action::DeleteCompany,
            Action::ListCompanies,
            Action::CreateAdmin,
            Action::DeleteUser,
        ] {
            assert_eq!(
                authorize(&admin, action, &Resource::collection(ResourceKind::Company)),
                Decision::Deny(DenyReason::InsufficientRole),
                "{action}"
            );
        }
    }

    fn arb_role() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    fn arb_action() -> impl Strategy<Value = Action> {
        prop::sample::select(ALL_ACTIONS.to_vec())
    }

    fn arb_company(pool: [CompanyId; 2]) -> impl Strategy<Value = Option<CompanyId>> {
        prop_oneof![Just(None), Just(Some(pool[0])), Just(Some(pool[1]))]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        #[test]
        fn users_never_list_all_users(company in arb_company([CompanyId::new(), CompanyId::new()]), role in arb_role()) {
            let user = principal(Role::User, company);
            let resource = Resource::prospective_user(company, role);
            prop_assert_eq!(
                authorize(&user, Action::ListAllUsers, &resource),
                Decision::Deny(DenyReason::InsufficientRole)
            );
        }

        #[test]
        fn superadmin_allowed_except_deleting_superadmin(
            action in arb_action(),
            target_role in proptest::option::of(arb_role()),
            owner in arb_company([CompanyId::new(), CompanyId::new()]),
        ) {
            let sa = principal(Role::SuperAdmin, None);
            let resource = Resource {
                kind: ResourceKind::User,
                owner_company_id: owner,
                target_subject_id: Some(UserId::new()),
                target_role,
            };
            let decision = authorize(&sa, action, &resource);
            if action == Action::DeleteUser && target_role == Some(Role::SuperAdmin) {
                prop_assert_eq!(decision, Decision::Deny(DenyReason::SuperadminUndeletable));
            } else {
                prop_assert_eq!(decision, Decision::Allow);
            }
        }

        #[test]
        fn deleting_superadmin_is_denied_for_every_role(role in arb_role()) {
            let p = principal(role, if role.requires_company() { Some(CompanyId::new()) } else { None });
            let target = Resource::user(UserId::new(), None, Role::SuperAdmin);
            prop_assert_eq!(
                authorize(&p, Action::DeleteUser, &target),
                Decision::Deny(DenyReason::SuperadminUndeletable)
            );
        }

        #[test]
        fn admin_modify_iff_same_company_and_not_admin(
            pick_admin in 0usize..2,
            pick_target in proptest::option::of(0usize..2),
            target_role in arb_role(),
        ) {
            let pool = [CompanyId::new(), CompanyId::new()];
            let admin = principal(Role::Admin, Some(pool[pick_admin]));
            let owner = pick_target.map(|i| pool[i]);
            let target = Resource::user(UserId::new(), owner, target_role);

            let expected = owner == admin.company_id && target_role != Role::Admin;
            // A SUPERADMIN target never shares a company with an ADMIN in valid data.
            prop_assume!(!(target_role == Role::SuperAdmin && owner.is_some()));
            prop_assert_eq!(authorize(&admin, Action::ModifyUser, &target).is_allowed(), expected);
        }

        #[test]
        fn decisions_are_repeatable(
            action in arb_action(),
            role in arb_role(),
            target_role in proptest::option::of(arb_role()),
        ) {
            let c = CompanyId::new();
            let p = principal(role, Some(c));
            let resource = Resource {
                kind: ResourceKind::User,
                owner_company_id: Some(c),
                target_subject_id: Some(UserId::new()),
                target_role,
            };
            let first = authorize(&p, action, &resource);
            for _ in 0..3 {
                prop_assert_eq!(authorize(&p, action, &resource), first);
            }
        }
    }
}
