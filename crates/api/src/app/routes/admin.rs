//! SUPERADMIN provisioning shortcuts.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;

use orgadmin_auth::{Action, Resource, Role, Secret};
use orgadmin_core::CompanyId;
use orgadmin_infra::NewUser;

use crate::app::dto::{self, CreateAdminRequest, CreateCompanyRequest};
use crate::app::errors::ApiError;
use crate::app::routes::companies;
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/create-company", post(create_company))
        .route("/create-admin", post(create_admin))
}

pub async fn create_company(
    services: Extension<Arc<AppServices>>,
    principal: Extension<PrincipalContext>,
    body: Json<CreateCompanyRequest>,
) -> Result<Response, ApiError> {
    companies::create_company(services, principal, body).await
}

pub async fn create_admin(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<CreateAdminRequest>,
) -> Result<Response, ApiError> {
    let company_id: CompanyId = dto::parse_id(&body.company_id)?;
    require(
        &principal,
        Action::CreateAdmin,
        &Resource::prospective_user(Some(company_id), Role::Admin),
    )?;

    let admin = services.users.create(
        NewUser {
            email: body.email,
            password: Secret::new(body.password),
            first_name: body.first_name,
            last_name: body.last_name,
            role: Role::Admin,
            company_id: Some(company_id),
        },
        Utc::now(),
    )?;
    Ok((StatusCode::CREATED, Json(services.users.view(&admin))).into_response())
}
