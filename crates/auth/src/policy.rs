//! The role → action rule table.
//!
//! This is the single source of truth for who may do what. The policy engine
//! ([`crate::authorize`]) and the scoped query builder ([`crate::scope`]) both
//! consult it; no module carries its own role checks.

use serde::Serialize;

use crate::{Action, Role};

/// How far a granted action reaches.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Any tenant (SUPER_ADMIN only).
    Global,
    /// Resources of the principal's own school.
    Tenant,
    /// Own school, and only resources the principal owns.
    Owner,
    /// Own school, and only resources linked to the principal's enrollment.
    Enrolled,
}

impl Scope {
    pub fn is_tenant_bound(&self) -> bool {
        !matches!(self, Scope::Global)
    }
}

/// One row of the rule table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub role: Role,
    pub action: Action,
    pub scope: Scope,
}

const fn rule(role: Role, action: Action, scope: Scope) -> Rule {
    Rule {
        role,
        action,
        scope,
    }
}

use Action::*;
use Role::*;
use Scope::*;

pub static RULES: &[Rule] = &[
    // SUPER_ADMIN
    rule(SuperAdmin, ReadAuditLog, Global),
    rule(SuperAdmin, CreateUser, Global),
    rule(SuperAdmin, ReadUser, Global),
    rule(SuperAdmin, UpdateUser, Global),
    rule(SuperAdmin, ActivateUser, Global),
    rule(SuperAdmin, DeactivateUser, Global),
    rule(SuperAdmin, ChangeUserRole, Global),
    // SCHOOL_ADMIN
    rule(SchoolAdmin, ReadAuditLog, Tenant),
    rule(SchoolAdmin, CreateUser, Tenant),
    rule(SchoolAdmin, ReadUser, Tenant),
    rule(SchoolAdmin, UpdateUser, Tenant),
    rule(SchoolAdmin, ActivateUser, Tenant),
    rule(SchoolAdmin, DeactivateUser, Tenant),
    rule(SchoolAdmin, ChangeUserRole, Tenant),
    rule(SchoolAdmin, CreateSubject, Tenant),
    rule(SchoolAdmin, ReadSubject, Tenant),
    rule(SchoolAdmin, UpdateSubject, Tenant),
    rule(SchoolAdmin, DeleteSubject, Tenant),
    rule(SchoolAdmin, CreateVehicle, Tenant),
    rule(SchoolAdmin, ReadVehicle, Tenant),
    rule(SchoolAdmin, UpdateVehicle, Tenant),
    rule(SchoolAdmin, DeleteVehicle, Tenant),
    // TEACHER
    rule(Teacher, CreateHomework, Owner),
    rule(Teacher, ReadHomework, Owner),
    rule(Teacher, UpdateHomework, Owner),
    rule(Teacher, DeleteHomework, Owner),
    rule(Teacher, ReadSubject, Owner),
    // STUDENT
    rule(Student, ReadHomework, Enrolled),
];

/// Look up the rule granting `action` to `role`, if any.
pub fn rule_for(role: Role, action: Action) -> Option<&'static Rule> {
    RULES.iter().find(|r| r.role == role && r.action == action)
}

/// All rules granted to one role, in table order.
pub fn rules_for_role(role: Role) -> impl Iterator<Item = &'static Rule> {
    RULES.iter().filter(move |r| r.role == role)
}

/// Role definition with its granted actions (for admin display).
#[derive(Debug, Clone, Serialize)]
pub struct RoleDefinition {
    pub role: Role,
    pub description: &'static str,
    pub grants: Vec<Grant>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Grant {
    pub action: Action,
    pub resource_type: &'static str,
    pub scope: Scope,
}

/// Render the rule table grouped by role.
pub fn role_definitions() -> Vec<RoleDefinition> {
    Role::ALL
        .into_iter()
        .map(|role| RoleDefinition {
            role,
            description: role_description(role),
            grants: rules_for_role(role)
                .map(|r| Grant {
                    action: r.action,
                    resource_type: r.action.resource_type().as_str(),
                    scope: r.scope,
                })
                .collect(),
        })
        .collect()
}

fn role_description(role: Role) -> &'static str {
    match role {
        SuperAdmin => "Platform operator; manages every school",
        SchoolAdmin => "Administers one school: staff, subjects, transport, audit",
        Teacher => "Manages own homework and reads own subject assignments",
        Student => "Reads homework of own class",
    }
}
