use axum::{
    extract::State,
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use orgadmin_auth::IdentityResolver;

use crate::app::errors::ApiError;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub resolver: IdentityResolver,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    // A non-UTF8 header counts as no token.
    let header = req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok());

    let principal = match state.resolver.resolve(header, Utc::now()) {
        Ok(p) => p,
        Err(e) => {
            tracing::debug!(reason = e.code(), path = %req.uri().path(), "request not authenticated");
            return ApiError::Unauthenticated(e).into_response();
        }
    };

    req.extensions_mut().insert(PrincipalContext::new(principal));
    next.run(req).await
}
