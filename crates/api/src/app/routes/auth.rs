//! Public authentication endpoints: register, login, refresh.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;

use orgadmin_auth::{Principal, Secret};
use orgadmin_infra::{Registration, User};

use crate::app::dto::{self, LoginRequest, RefreshRequest, RegisterRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    let now = Utc::now();
    let user = services.users.register(
        Registration {
            email: body.email,
            password: Secret::new(body.password),
            first_name: body.first_name,
            last_name: body.last_name,
            company_id: dto::parse_id(&body.company_id)?,
        },
        now,
    )?;

    Ok((StatusCode::CREATED, session(&services, &user)?).into_response())
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let user = services.users.authenticate(&body.email, &Secret::new(body.password))?;
    tracing::info!(user_id = %user.id, "login succeeded");

    Ok((StatusCode::OK, session(&services, &user)?).into_response())
}

/// Exchange a refresh token for a fresh access token carrying live claims.
pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RefreshRequest>,
) -> Result<Response, ApiError> {
    let now = Utc::now();
    let principal = services.resolver.resolve_refresh(&body.refresh_token, now)?;
    let access_token = services.tokens.issue_access_token(&principal, now)?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "access_token": access_token,
            "token_type": "Bearer",
            "expires_in": services.tokens.config().access_ttl.num_seconds(),
        })),
    )
        .into_response())
}

fn session(services: &AppServices, user: &User) -> Result<Json<serde_json::Value>, ApiError> {
    let principal = Principal::new(user.id, user.role, user.company_id);
    let tokens = services.tokens.issue_pair(&principal, Utc::now())?;

    Ok(Json(serde_json::json!({
        "user": services.users.view(user),
        "tokens": tokens,
    })))
}
