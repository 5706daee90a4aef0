//! Audit log endpoints.
//!
//! Every handler is scoped by the caller's principal. Denied reads are
//! themselves recorded as `DENIED_READ_AUDIT_LOG` events.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::warn;

use campus_audit::AuditError;
use campus_auth::{Action, Decision, Principal, ResourceDescriptor, ResourceType};
use campus_core::AuditEventId;

use crate::app::HttpLimits;
use crate::app::dto::{self, AuditLogQuery, StatisticsQuery};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// GET /audit-logs
pub async fn list_audit_logs(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(limits): Extension<HttpLimits>,
    Extension(ctx): Extension<PrincipalContext>,
    Query(query): Query<AuditLogQuery>,
) -> Response {
    let principal = ctx.principal();
    let result = async {
        let filters = query.filters()?;
        let page = query.page_request(limits.max_page_limit)?;
        services.aggregator.list(principal, &filters, page).await
    }
    .await;

    respond(&services, principal, result).await
}

/// GET /audit-logs/:id
pub async fn get_audit_log(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    let id: AuditEventId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::validation_error("id".to_string(), "uuid".to_string()),
    };

    let principal = ctx.principal();
    let result = services.aggregator.get_one(id, principal).await;
    respond(&services, principal, result).await
}

/// GET /audit-logs/users/:user_id/summary
pub async fn user_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(user_id): Path<String>,
) -> Response {
    let principal = ctx.principal();
    let result = async {
        let user_id = dto::parse_user_id(&user_id)?;
        services.aggregator.user_summary(user_id, principal).await
    }
    .await;

    respond(&services, principal, result).await
}

/// GET /audit-logs/statistics
pub async fn statistics(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Query(query): Query<StatisticsQuery>,
) -> Response {
    let principal = ctx.principal();
    let result = async {
        let (start, end) = query.range()?;
        services.aggregator.global_statistics(principal, start, end).await
    }
    .await;

    respond(&services, principal, result).await
}

async fn respond<T: Serialize>(
    services: &AppServices,
    principal: &Principal,
    result: Result<T, AuditError>,
) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => {
            if let AuditError::AuthorizationDenied(reason) = &err {
                record_denial(services, principal, Decision::Deny(*reason)).await;
            }
            errors::audit_error_to_response(err)
        }
    }
}

async fn record_denial(services: &AppServices, principal: &Principal, decision: Decision) {
    let descriptor =
        ResourceDescriptor::new(ResourceType::AuditLog).with_tenant(principal.tenant_id);
    if let Err(err) = services
        .recorder
        .record_decision(principal, Action::ReadAuditLog, &descriptor, decision)
        .await
    {
        warn!(error = %err, principal_id = %principal.id, "failed to record audit read denial");
    }
}
