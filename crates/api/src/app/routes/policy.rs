//! Policy introspection endpoints.
//!
//! Helps answer "why was this request denied?" without reading the rule table.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use campus_auth::role_definitions;

use crate::app::dto::ExplainRequest;
use crate::context::PrincipalContext;

/// GET /policy/rules - the role → action table grouped by role
pub async fn rules(Extension(_ctx): Extension<PrincipalContext>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "roles": role_definitions() })),
    )
}

/// POST /policy/explain - evaluate an action for the caller without performing it
pub async fn explain(
    Extension(ctx): Extension<PrincipalContext>,
    Json(body): Json<ExplainRequest>,
) -> impl IntoResponse {
    let explanation = campus_auth::explain(ctx.principal(), body.action, &body.resource);
    (StatusCode::OK, Json(explanation))
}
