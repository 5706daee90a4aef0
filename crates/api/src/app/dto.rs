//! Query-string DTOs and their mapping to domain filters.
//!
//! Every field arrives as a string so that malformed values produce the same
//! `validation_error` body as domain validation, not a framework rejection.

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use campus_audit::AuditError;
use campus_auth::{Action, ResourceDescriptor, ScopeFilters};
use campus_core::{PageRequest, UserId};

/// `GET /audit-logs`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogQuery {
    pub user_id: Option<String>,
    pub action: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub resource_id: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl AuditLogQuery {
    pub fn filters(&self) -> Result<ScopeFilters, AuditError> {
        Ok(ScopeFilters {
            user_id: parse_opt(&self.user_id, "userId", "uuid", |s| s.parse::<UserId>().ok())?,
            action: present(&self.action).map(str::to_string),
            start_date: parse_date(&self.start_date, "startDate")?,
            end_date: parse_date(&self.end_date, "endDate")?,
            resource_id: parse_opt(&self.resource_id, "resourceId", "uuid", |s| {
                Uuid::parse_str(s).ok()
            })?,
        })
    }

    /// Page request with `limit` clamped to `max_limit`.
    pub fn page_request(&self, max_limit: u32) -> Result<PageRequest, AuditError> {
        let page = parse_opt(&self.page, "page", "integer", |s| s.parse::<u32>().ok())?;
        let limit = parse_opt(&self.limit, "limit", "integer", |s| s.parse::<u32>().ok())?;
        Ok(PageRequest::new(page, limit)?.capped(max_limit))
    }
}

/// `GET /audit-logs/statistics`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl StatisticsQuery {
    pub fn range(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), AuditError> {
        Ok((
            parse_date(&self.start_date, "startDate")?,
            parse_date(&self.end_date, "endDate")?,
        ))
    }
}

/// `POST /policy/explain`
#[derive(Debug, Deserialize)]
pub struct ExplainRequest {
    pub action: Action,
    pub resource: ResourceDescriptor,
}

pub fn parse_user_id(raw: &str) -> Result<UserId, AuditError> {
    raw.parse::<UserId>().map_err(|_| invalid("userId", "uuid"))
}

fn present(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_opt<T>(
    raw: &Option<String>,
    field: &str,
    rule: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, AuditError> {
    match present(raw) {
        None => Ok(None),
        Some(s) => parse(s).map(Some).ok_or_else(|| invalid(field, rule)),
    }
}

fn parse_date(raw: &Option<String>, field: &str) -> Result<Option<NaiveDate>, AuditError> {
    parse_opt(raw, field, "date:YYYY-MM-DD", |s| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
    })
}

fn invalid(field: &str, rule: &str) -> AuditError {
    AuditError::Validation {
        field: field.to_string(),
        rule: rule.to_string(),
    }
}
