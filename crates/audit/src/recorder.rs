use std::sync::Arc;

use serde_json::{Value as JsonValue, json};
use tracing::{debug, info, instrument, warn};

use campus_auth::{Action, Decision, Principal, ResourceDescriptor};
use campus_core::{AuditEventId, Clock, UserId};

use crate::error::AuditError;
use crate::event::AuditEvent;
use crate::store::AuditStore;

/// Appends audit events. Every successful call creates exactly one new event.
pub struct AuditRecorder<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S> AuditRecorder<S>
where
    S: AuditStore,
{
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Record that `actor_id` performed `action`.
    ///
    /// The id and timestamp are assigned here. `action` is stored exactly as
    /// given: a blank or whitespace-padded token is a validation error. The
    /// event is visible to queries once this returns `Ok`.
    #[instrument(skip(self, metadata), fields(actor_id = %actor_id))]
    pub async fn record(
        &self,
        actor_id: UserId,
        action: &str,
        metadata: Option<JsonValue>,
    ) -> Result<AuditEvent, AuditError> {
        if action.trim().is_empty() {
            return Err(invalid_action("required"));
        }
        if action.trim() != action {
            return Err(invalid_action("no_surrounding_whitespace"));
        }

        let event = AuditEvent {
            id: AuditEventId::new(),
            actor_id,
            action: action.to_string(),
            created_at: self.clock.now(),
            metadata,
        };

        if let Err(err) = self.store.append(event.clone()).await {
            warn!(error = %err, action = %event.action, "audit append failed");
            return Err(err.into());
        }

        debug!(event_id = %event.id, action = %event.action, "audit event recorded");
        Ok(event)
    }

    /// Record the outcome of an authorization decision.
    ///
    /// Allowed actions record their `VERB_NOUN` token; denials record
    /// `DENIED_VERB_NOUN` with the reason in metadata.
    pub async fn record_decision(
        &self,
        principal: &Principal,
        action: Action,
        descriptor: &ResourceDescriptor,
        decision: Decision,
    ) -> Result<AuditEvent, AuditError> {
        let resource_type = descriptor.resource_type.as_str();
        match decision {
            Decision::Allow => {
                self.record(
                    principal.id,
                    action.audit_token(),
                    Some(json!({ "resourceType": resource_type })),
                )
                .await
            }
            Decision::Deny(reason) => {
                info!(
                    principal_id = %principal.id,
                    action = %action,
                    reason = reason.as_str(),
                    "authorization denied"
                );
                self.record(
                    principal.id,
                    &format!("DENIED_{}", action.audit_token()),
                    Some(json!({ "reason": reason.as_str(), "resourceType": resource_type })),
                )
                .await
            }
        }
    }
}

fn invalid_action(rule: &str) -> AuditError {
    AuditError::Validation {
        field: "action".to_string(),
        rule: rule.to_string(),
    }
}
