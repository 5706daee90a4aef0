//! User directory read model consulted by the core.
//!
//! The directory answers "which school and role does this user have"; it is
//! how audit events (which only carry an actor id) are tenant-scoped.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use campus_core::{TenantId, UserId};

use crate::{ResourceDescriptor, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub tenant_id: Option<TenantId>,
    pub role: Role,
    pub email: String,
    pub active: bool,
}

impl UserRecord {
    pub fn new(
        id: UserId,
        tenant_id: Option<TenantId>,
        role: Role,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            role,
            email: email.into(),
            active: true,
        }
    }

    /// Descriptor of this record as the target of a user action.
    pub fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::user(self.id, self.tenant_id, self.role)
    }
}

/// Synchronous lookup into the directory read model.
pub trait UserDirectory: Send + Sync {
    fn find(&self, user_id: UserId) -> Option<UserRecord>;
}

impl<D> UserDirectory for Arc<D>
where
    D: UserDirectory + ?Sized,
{
    fn find(&self, user_id: UserId) -> Option<UserRecord> {
        (**self).find(user_id)
    }
}
