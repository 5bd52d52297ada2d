use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// The live principal the request resolved to.
pub async fn whoami(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "id": principal.user_id().to_string(),
        "role": principal.role().as_str(),
        "company_id": principal.company_id().map(|c| c.to_string()),
    }))
}
