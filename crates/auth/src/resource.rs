use serde::{Deserialize, Serialize};

use campus_core::{TenantId, UserId};

use crate::Role;

/// Kind of record an action targets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    AuditLog,
    User,
    Homework,
    Subject,
    Vehicle,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::AuditLog => "audit_log",
            ResourceType::User => "user",
            ResourceType::Homework => "homework",
            ResourceType::Subject => "subject",
            ResourceType::Vehicle => "vehicle",
        }
    }
}

impl core::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tenant/ownership metadata of the thing being acted on.
///
/// Built by the calling module from its own storage read. For user-lifecycle
/// actions `owner_id` is the target user and `target_role` its current role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub resource_type: ResourceType,
    pub tenant_id: Option<TenantId>,
    pub owner_id: Option<UserId>,
    /// User the resource is linked to through enrollment (class/section).
    pub subject_user_id: Option<UserId>,
    pub target_role: Option<Role>,
    /// Role being granted by a create or role change.
    pub requested_role: Option<Role>,
}

impl ResourceDescriptor {
    pub fn new(resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            tenant_id: None,
            owner_id: None,
            subject_user_id: None,
            target_role: None,
            requested_role: None,
        }
    }

    pub fn in_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn with_tenant(mut self, tenant_id: Option<TenantId>) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn owned_by(mut self, owner_id: UserId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn for_subject(mut self, user_id: UserId) -> Self {
        self.subject_user_id = Some(user_id);
        self
    }

    pub fn with_target_role(mut self, role: Role) -> Self {
        self.target_role = Some(role);
        self
    }

    pub fn requesting_role(mut self, role: Role) -> Self {
        self.requested_role = Some(role);
        self
    }

    /// Descriptor of an existing user record targeted by a lifecycle action.
    pub fn user(user_id: UserId, tenant_id: Option<TenantId>, role: Role) -> Self {
        Self::new(ResourceType::User)
            .with_tenant(tenant_id)
            .owned_by(user_id)
            .with_target_role(role)
    }
}
