use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;

use orgadmin_auth::{Action, DenyReason, Resource, ResourceKind, Role, Secret};
use orgadmin_core::{CompanyId, UserId};
use orgadmin_infra::{NewUser, ProfileUpdate, Reassignment, User, UserSearch};

use crate::app::dto::{self, ChangePasswordRequest, CreateUserRequest, SearchParams, UpdateUserRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz::{require, require_reassignment};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/search", get(search_users))
        .route("/company/:company_id", get(list_company_users))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/:id/password", put(change_password))
}

/// All users for a SUPERADMIN; an ADMIN sees their own company.
pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ApiError> {
    require(&principal, Action::ListAllUsers, &Resource::collection(ResourceKind::User))?;

    let users = if principal.principal().is_superadmin() {
        services.users.list_all()?
    } else {
        services.users.list_by_company(own_company(&principal)?)?
    };
    Ok(items(&services, &users))
}

pub async fn search_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    require(&principal, Action::SearchUsers, &Resource::collection(ResourceKind::User))?;

    // Outside SUPERADMIN, search never crosses the caller's company.
    let company_id = if principal.principal().is_superadmin() {
        dto::parse_optional_id::<CompanyId>(params.company_id.as_deref())?
    } else {
        Some(own_company(&principal)?)
    };
    let role = params.role.as_deref().map(dto::parse_role).transpose()?;

    let page = services.users.search(&UserSearch {
        text: params.q,
        company_id,
        role,
        page: params.page,
        limit: params.limit,
    })?;
    Ok((StatusCode::OK, Json(page)).into_response())
}

pub async fn list_company_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(company_id): Path<String>,
) -> Result<Response, ApiError> {
    let company_id: CompanyId = dto::parse_id(&company_id)?;
    require(&principal, Action::ListCompanyUsers, &Resource::company_users(company_id))?;

    let users = services.users.list_by_company(company_id)?;
    Ok(items(&services, &users))
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let user = load(&services, &id)?;
    require(&principal, Action::ViewUser, &user.resource())?;

    Ok((StatusCode::OK, Json(services.users.view(&user))).into_response())
}

/// Admin-issued creation. Administrative roles escalate to the
/// SUPERADMIN-only "create admin" rule inside the engine.
pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<CreateUserRequest>,
) -> Result<Response, ApiError> {
    let role = match body.role.as_deref() {
        Some(raw) => dto::parse_role(raw)?,
        None => Role::User,
    };
    // ADMINs create inside their own company when none is given.
    let company_id = match dto::parse_optional_id::<CompanyId>(body.company_id.as_deref())? {
        Some(id) => Some(id),
        None if role.requires_company() => principal.company_id(),
        None => None,
    };
    require(&principal, Action::CreateUser, &Resource::prospective_user(company_id, role))?;

    let user = services.users.create(
        NewUser {
            email: body.email,
            password: Secret::new(body.password),
            first_name: body.first_name,
            last_name: body.last_name,
            role,
            company_id,
        },
        Utc::now(),
    )?;
    Ok((StatusCode::CREATED, Json(services.users.view(&user))).into_response())
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Response, ApiError> {
    let user = load(&services, &id)?;
    let now = Utc::now();

    if !body.has_profile_changes() && !body.has_reassignment() {
        return Err(ApiError::bad_request("no fields to update"));
    }

    // Check every part of the request before writing any of it.
    let reassignment = if body.has_reassignment() {
        let change = proposed_assignment(&user, &body)?;
        require_reassignment(
            &principal,
            &user.resource(),
            &Resource::prospective_user(change.company_id, change.role),
        )?;
        Some(change)
    } else {
        None
    };
    if body.has_profile_changes() {
        require(&principal, Action::ModifyUser, &user.resource())?;
    }

    let updated = services.users.update(
        user.id,
        ProfileUpdate {
            email: body.email,
            first_name: body.first_name,
            last_name: body.last_name,
        },
        reassignment,
        now,
    )?;

    Ok((StatusCode::OK, Json(services.users.view(&updated))).into_response())
}

pub async fn change_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Response, ApiError> {
    let user = load(&services, &id)?;
    require(&principal, Action::ChangePassword, &user.resource())?;

    services.users.update_password(
        user.id,
        &Secret::new(body.current_password),
        Secret::new(body.new_password),
        Utc::now(),
    )?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let user = load(&services, &id)?;
    require(&principal, Action::DeleteUser, &user.resource())?;

    services.users.delete(user.id)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

fn load(services: &AppServices, raw_id: &str) -> Result<User, ApiError> {
    let id: UserId = dto::parse_id(raw_id)?;
    Ok(services.users.get(id)?)
}

fn own_company(principal: &PrincipalContext) -> Result<CompanyId, ApiError> {
    principal
        .company_id()
        .ok_or(ApiError::Forbidden(DenyReason::NoCompanyAssociation))
}

/// Role/company after applying the request. Promoting to SUPERADMIN drops the
/// company unless one is given explicitly.
fn proposed_assignment(user: &User, body: &UpdateUserRequest) -> Result<Reassignment, ApiError> {
    let role = match body.role.as_deref() {
        Some(raw) => dto::parse_role(raw)?,
        None => user.role,
    };
    let company_id = match dto::parse_optional_id::<CompanyId>(body.company_id.as_deref())? {
        Some(id) => Some(id),
        None if !role.requires_company() => None,
        None => user.company_id,
    };
    Ok(Reassignment { role, company_id })
}

fn items(services: &AppServices, users: &[User]) -> Response {
    let items = users.iter().map(|u| services.users.view(u)).collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}
