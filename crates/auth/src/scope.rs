//! Scoped query builder.
//!
//! Turns a policy decision plus caller-supplied filters into a storage-agnostic
//! [`Predicate`]: a conjunction of `(field, operator, value)` clauses. The
//! mandatory scope clauses come first; caller filters are ANDed after them and
//! can only narrow the result set.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use campus_core::{DomainError, TenantId, UserId};

use crate::authorize::{DenialReason, evaluate};
use crate::policy::Scope;
use crate::{Action, Principal, ResourceDescriptor, ResourceType, UserDirectory};

/// Logical field of a scoped record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// School the record belongs to (for audit events: the actor's school).
    TenantId,
    OwnerId,
    SubjectUserId,
    /// User a record is about (for audit events: the actor).
    UserId,
    Action,
    CreatedAt,
    ResourceId,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    ContainsIgnoreCase,
    Gte,
    Lte,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Tenant(TenantId),
    User(UserId),
    Text(String),
    Timestamp(DateTime<Utc>),
    Id(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub field: Field,
    pub op: Operator,
    pub value: Value,
}

impl Clause {
    pub fn eq(field: Field, value: Value) -> Self {
        Self {
            field,
            op: Operator::Eq,
            value,
        }
    }

    /// Evaluate against the record's value for `self.field`.
    ///
    /// A missing value or a type mismatch never matches.
    pub fn matches(&self, actual: Option<&Value>) -> bool {
        let Some(actual) = actual else {
            return false;
        };

        match (self.op, actual, &self.value) {
            (Operator::Eq, a, v) => a == v,
            (Operator::ContainsIgnoreCase, Value::Text(a), Value::Text(needle)) => {
                a.to_lowercase().contains(&needle.to_lowercase())
            }
            (Operator::Gte, Value::Timestamp(a), Value::Timestamp(v)) => a >= v,
            (Operator::Lte, Value::Timestamp(a), Value::Timestamp(v)) => a <= v,
            _ => false,
        }
    }
}

/// A record whose fields can be checked against a predicate.
pub trait FieldSource {
    fn field_value(&self, field: Field) -> Option<Value>;
}

/// Conjunction of clauses. An empty predicate matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn and(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    fn push(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    pub fn matches<R: FieldSource + ?Sized>(&self, record: &R) -> bool {
        self.clauses
            .iter()
            .all(|c| c.matches(record.field_value(c.field).as_ref()))
    }
}

/// Caller-supplied list filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeFilters {
    pub user_id: Option<UserId>,
    /// Case-insensitive substring of the action token.
    pub action: Option<String>,
    /// Inclusive; from the start of this calendar day (UTC).
    pub start_date: Option<NaiveDate>,
    /// Inclusive; through the last millisecond of this calendar day (UTC).
    pub end_date: Option<NaiveDate>,
    pub resource_id: Option<Uuid>,
}

impl ScopeFilters {
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn between(start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Self {
        Self {
            start_date,
            end_date,
            ..Default::default()
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("access denied: {0}")]
    Denied(DenialReason),

    #[error("validation failed: {field} ({rule})")]
    Validation { field: String, rule: String },
}

impl From<DenialReason> for ScopeError {
    fn from(value: DenialReason) -> Self {
        Self::Denied(value)
    }
}

impl From<DomainError> for ScopeError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation { field, rule } => Self::Validation { field, rule },
            other => Self::Validation {
                field: "filter".to_string(),
                rule: other.to_string(),
            },
        }
    }
}

/// First instant of `date` (00:00:00.000 UTC).
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Last instant of `date` (23:59:59.999 UTC), so that `endDate = D` includes all of D.
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let last = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    date.and_time(last).and_utc()
}

/// Build the predicate a listing of `resource_type` must use for `principal`.
///
/// Authorizes the resource type's read action against the principal's own
/// implied scope, then narrows it with `filters`. A `user_id` filter from a
/// tenant-bound principal is re-verified against the directory; a user outside
/// the principal's school (or unknown) is refused with
/// [`DenialReason::TenantMismatch`] rather than silently dropped.
pub fn build_predicate<D>(
    principal: &Principal,
    resource_type: ResourceType,
    filters: &ScopeFilters,
    directory: &D,
) -> Result<Predicate, ScopeError>
where
    D: UserDirectory + ?Sized,
{
    let action = Action::read(resource_type);
    let implied = ResourceDescriptor::new(resource_type)
        .with_tenant(principal.tenant_id)
        .owned_by(principal.id)
        .for_subject(principal.id);

    let scope = evaluate(principal, action, &implied).inspect_err(|reason| {
        tracing::debug!(
            principal_id = %principal.id,
            role = %principal.role,
            resource_type = %resource_type,
            reason = reason.as_str(),
            "scope denied"
        );
    })?;

    let mut predicate = Predicate::all();

    if scope.is_tenant_bound() {
        let tenant_id = principal.tenant_id.ok_or(DenialReason::TenantRequired)?;
        predicate.push(Clause::eq(Field::TenantId, Value::Tenant(tenant_id)));
    }
    match scope {
        Scope::Owner => predicate.push(Clause::eq(Field::OwnerId, Value::User(principal.id))),
        Scope::Enrolled => {
            predicate.push(Clause::eq(Field::SubjectUserId, Value::User(principal.id)))
        }
        Scope::Global | Scope::Tenant => {}
    }

    if let Some(user_id) = filters.user_id {
        if scope.is_tenant_bound() {
            let same_school = directory
                .find(user_id)
                .is_some_and(|u| u.tenant_id.is_some() && u.tenant_id == principal.tenant_id);
            if !same_school {
                return Err(ScopeError::Denied(DenialReason::TenantMismatch));
            }
        }
        predicate.push(Clause::eq(Field::UserId, Value::User(user_id)));
    }

    if let Some(needle) = filters.action.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        predicate.push(Clause {
            field: Field::Action,
            op: Operator::ContainsIgnoreCase,
            value: Value::Text(needle.to_string()),
        });
    }

    if let (Some(start), Some(end)) = (filters.start_date, filters.end_date) {
        if start > end {
            return Err(ScopeError::Validation {
                field: "startDate".to_string(),
                rule: "before_or_equal:endDate".to_string(),
            });
        }
    }
    if let Some(start) = filters.start_date {
        predicate.push(Clause {
            field: Field::CreatedAt,
            op: Operator::Gte,
            value: Value::Timestamp(start_of_day(start)),
        });
    }
    if let Some(end) = filters.end_date {
        predicate.push(Clause {
            field: Field::CreatedAt,
            op: Operator::Lte,
            value: Value::Timestamp(end_of_day(end)),
        });
    }

    if let Some(resource_id) = filters.resource_id {
        predicate.push(Clause::eq(Field::ResourceId, Value::Id(resource_id)));
    }

    Ok(predicate)
}
