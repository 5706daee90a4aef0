use serde::{Deserialize, Serialize};

use campus_core::{TenantId, UserId};

use crate::Role;

/// The authenticated caller of an operation.
///
/// Built once per request from validated claims and passed explicitly to every
/// authorization and query-building call. Never persisted by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
    /// Owning school. `None` is only meaningful for SUPER_ADMIN; any other role
    /// without a tenant is denied everything.
    pub tenant_id: Option<TenantId>,
}

impl Principal {
    pub fn new(id: UserId, role: Role, tenant_id: Option<TenantId>) -> Self {
        Self { id, role, tenant_id }
    }

    pub fn super_admin(id: UserId) -> Self {
        Self::new(id, Role::SuperAdmin, None)
    }

    /// A principal acting inside one school.
    pub fn member(id: UserId, role: Role, tenant_id: TenantId) -> Self {
        Self::new(id, role, Some(tenant_id))
    }

    pub fn is_super_admin(&self) -> bool {
        self.role.is_super_admin()
    }
}
