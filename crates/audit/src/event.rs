use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use campus_auth::{Field, FieldSource, Role, Value};
use campus_core::{AuditEventId, TenantId, UserId};

/// One completed action by one actor. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub id: AuditEventId,
    pub actor_id: UserId,
    /// Free-form token, conventionally `VERB_NOUN`.
    pub action: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Option<JsonValue>,
}

/// Directory facts about an event's actor, joined in at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorProfile {
    pub tenant_id: Option<TenantId>,
    pub role: Role,
}

/// An event together with its actor's current profile (`None` when the actor
/// is no longer in the directory).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedEvent {
    pub event: AuditEvent,
    pub actor: Option<ActorProfile>,
}

impl FieldSource for ScopedEvent {
    fn field_value(&self, field: Field) -> Option<Value> {
        match field {
            Field::TenantId => self.actor.and_then(|a| a.tenant_id).map(Value::Tenant),
            Field::UserId => Some(Value::User(self.event.actor_id)),
            Field::Action => Some(Value::Text(self.event.action.clone())),
            Field::CreatedAt => Some(Value::Timestamp(self.event.created_at)),
            Field::ResourceId => Some(Value::Id(*self.event.id.as_uuid())),
            // Audit events have no owner or enrollment link.
            Field::OwnerId | Field::SubjectUserId => None,
        }
    }
}
