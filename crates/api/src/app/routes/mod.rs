use axum::{
    Router,
    routing::{get, post},
};

pub mod audit;
pub mod policy;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/audit-logs", get(audit::list_audit_logs))
        .route("/audit-logs/statistics", get(audit::statistics))
        .route("/audit-logs/users/:user_id/summary", get(audit::user_summary))
        .route("/audit-logs/:id", get(audit::get_audit_log))
        .route("/policy/rules", get(policy::rules))
        .route("/policy/explain", post(policy::explain))
}
