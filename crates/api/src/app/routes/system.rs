use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(ctx): Extension<PrincipalContext>) -> impl IntoResponse {
    let principal = ctx.principal();
    Json(serde_json::json!({
        "principal_id": principal.id.to_string(),
        "role": principal.role.as_str(),
        "tenant_id": principal.tenant_id.map(|t| t.to_string()),
        "expires_at": ctx.expires_at(),
    }))
}
