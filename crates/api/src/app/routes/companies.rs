use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;

use orgadmin_auth::{Action, Resource, ResourceKind};
use orgadmin_core::CompanyId;
use orgadmin_infra::{CompanyUpdate, NewCompany};

use crate::app::dto::{self, CreateCompanyRequest, UpdateCompanyRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_companies).post(create_company))
        .route("/:id", get(get_company).put(update_company).delete(delete_company))
}

pub async fn list_companies(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ApiError> {
    require(&principal, Action::ListCompanies, &Resource::collection(ResourceKind::Company))?;

    let items = services.companies.list()?;
    Ok((StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response())
}

pub async fn get_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: CompanyId = dto::parse_id(&id)?;
    require(&principal, Action::ViewCompany, &Resource::company(id))?;

    let company = services.companies.get(id)?;
    Ok((StatusCode::OK, Json(company)).into_response())
}

pub async fn create_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<CreateCompanyRequest>,
) -> Result<Response, ApiError> {
    require(&principal, Action::CreateCompany, &Resource::collection(ResourceKind::Company))?;

    let company = services.companies.create(
        NewCompany {
            name: body.name,
            description: body.description,
            address: body.address,
            phone_number: body.phone_number,
        },
        Utc::now(),
    )?;
    Ok((StatusCode::CREATED, Json(company)).into_response())
}

pub async fn update_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<UpdateCompanyRequest>,
) -> Result<Response, ApiError> {
    let id: CompanyId = dto::parse_id(&id)?;
    require(&principal, Action::UpdateCompany, &Resource::company(id))?;

    let company = services.companies.update(
        id,
        CompanyUpdate {
            name: body.name,
            active: body.active,
            description: body.description,
            address: body.address,
            phone_number: body.phone_number,
        },
        Utc::now(),
    )?;
    Ok((StatusCode::OK, Json(company)).into_response())
}

/// Deletes the company and detaches its members.
pub async fn delete_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: CompanyId = dto::parse_id(&id)?;
    require(&principal, Action::DeleteCompany, &Resource::company(id))?;

    let detached = services.companies.delete(id, Utc::now())?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "id": id.to_string(), "detached_users": detached })),
    )
        .into_response())
}
