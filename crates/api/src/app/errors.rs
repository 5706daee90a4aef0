use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use campus_audit::AuditError;

pub fn audit_error_to_response(err: AuditError) -> axum::response::Response {
    match err {
        AuditError::AuthorizationDenied(reason) => (
            StatusCode::FORBIDDEN,
            axum::Json(json!({
                "error": "access_denied",
                "reason": reason.as_str(),
                "message": reason.to_string(),
            })),
        )
            .into_response(),
        AuditError::NotFound { resource_type, id } => json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("{resource_type} '{id}' not found"),
        ),
        AuditError::Validation { field, rule } => validation_error(field, rule),
        AuditError::ConflictDuplicate { field } => json_error(
            StatusCode::CONFLICT,
            "conflict",
            format!("duplicate value for '{field}'"),
        ),
        AuditError::TransientStorage(e) => {
            tracing::warn!(error = %e, "audit storage unavailable");
            json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "storage_unavailable",
                "audit storage is temporarily unavailable",
            )
        }
    }
}

pub fn validation_error(field: String, rule: String) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({
            "error": "validation_error",
            "field": field,
            "rule": rule,
            "message": format!("{field} failed {rule}"),
        })),
    )
        .into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
