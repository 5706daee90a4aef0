use serde::Serialize;
use thiserror::Error;

use campus_core::{TenantId, UserId};

use crate::policy::{self, Scope};
use crate::{Action, Principal, ResourceDescriptor, ResourceType, Role};

/// Why an authorization request was refused. Closed set.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    #[error("principal has no school assigned")]
    TenantRequired,

    #[error("role is not permitted to perform this action")]
    RoleNotPermitted,

    #[error("resource belongs to a different school")]
    TenantMismatch,

    #[error("resource is not owned by the principal")]
    NotOwner,

    #[error("principal cannot perform this action on itself")]
    SelfActionForbidden,

    #[error("target is a protected super administrator")]
    ProtectedPrincipal,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::TenantRequired => "tenant_required",
            DenialReason::RoleNotPermitted => "role_not_permitted",
            DenialReason::TenantMismatch => "tenant_mismatch",
            DenialReason::NotOwner => "not_owner",
            DenialReason::SelfActionForbidden => "self_action_forbidden",
            DenialReason::ProtectedPrincipal => "protected_principal",
        }
    }
}

/// Outcome of a policy evaluation. No partial allow.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny(DenialReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn denial(&self) -> Option<DenialReason> {
        match self {
            Decision::Allow => None,
            Decision::Deny(reason) => Some(*reason),
        }
    }

    pub fn into_result(self) -> Result<(), DenialReason> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(reason),
        }
    }
}

impl From<Result<Scope, DenialReason>> for Decision {
    fn from(value: Result<Scope, DenialReason>) -> Self {
        match value {
            Ok(_) => Decision::Allow,
            Err(reason) => Decision::Deny(reason),
        }
    }
}

/// Decide whether `principal` may perform `action` on `descriptor`.
///
/// - No IO
/// - No panics
/// - Fails closed: a non-SUPER_ADMIN principal without a school is denied everything
pub fn authorize(
    principal: &Principal,
    action: Action,
    descriptor: &ResourceDescriptor,
) -> Decision {
    evaluate(principal, action, descriptor).into()
}

/// Evaluate the checks in their fixed order and return the scope of the
/// matched rule on success.
///
/// Order: tenant presence, role eligibility, tenant match, ownership,
/// self-protection. The first failing check wins.
pub(crate) fn evaluate(
    principal: &Principal,
    action: Action,
    descriptor: &ResourceDescriptor,
) -> Result<Scope, DenialReason> {
    if principal.role.requires_tenant() && principal.tenant_id.is_none() {
        return Err(DenialReason::TenantRequired);
    }

    let rule = policy::rule_for(principal.role, action).ok_or(DenialReason::RoleNotPermitted)?;

    if rule.scope.is_tenant_bound() {
        let tenant_id = principal.tenant_id.ok_or(DenialReason::TenantRequired)?;
        if descriptor.tenant_id != Some(tenant_id) {
            return Err(DenialReason::TenantMismatch);
        }
    }

    match rule.scope {
        Scope::Owner if descriptor.owner_id != Some(principal.id) => {
            return Err(DenialReason::NotOwner);
        }
        Scope::Enrolled if descriptor.subject_user_id != Some(principal.id) => {
            return Err(DenialReason::NotOwner);
        }
        _ => {}
    }

    check_self_protection(principal, action, descriptor)?;

    Ok(rule.scope)
}

fn check_self_protection(
    principal: &Principal,
    action: Action,
    descriptor: &ResourceDescriptor,
) -> Result<(), DenialReason> {
    if action.is_lifecycle_mutation() && descriptor.owner_id == Some(principal.id) {
        return Err(DenialReason::SelfActionForbidden);
    }

    let target_is_super = descriptor.target_role == Some(Role::SuperAdmin);
    let grants_super = descriptor.requested_role == Some(Role::SuperAdmin);

    match action {
        // Nobody, including another SUPER_ADMIN, takes a SUPER_ADMIN out of service.
        Action::DeactivateUser if target_is_super => Err(DenialReason::ProtectedPrincipal),
        // A SUPER_ADMIN record may only be re-roled by a SUPER_ADMIN, and never demoted.
        Action::ChangeUserRole if target_is_super => {
            if principal.is_super_admin() && grants_super {
                Ok(())
            } else {
                Err(DenialReason::ProtectedPrincipal)
            }
        }
        Action::CreateUser | Action::ChangeUserRole
            if grants_super && !principal.is_super_admin() =>
        {
            Err(DenialReason::ProtectedPrincipal)
        }
        Action::UpdateUser | Action::ActivateUser
            if target_is_super && !principal.is_super_admin() =>
        {
            Err(DenialReason::ProtectedPrincipal)
        }
        _ => Ok(()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an authorization decision.
///
/// Carries the human-readable message rendered in access-denied responses.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub action: Action,
    pub resource_type: ResourceType,
    pub decision: Decision,
    /// Scope of the matched rule, when access was granted.
    pub scope: Option<Scope>,
    pub message: String,
    pub principal: PrincipalState,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrincipalState {
    pub principal_id: UserId,
    pub role: Role,
    pub tenant_id: Option<TenantId>,
}

/// Explain why an authorization decision was made (or would be made).
pub fn explain(
    principal: &Principal,
    action: Action,
    descriptor: &ResourceDescriptor,
) -> AuthorizationExplanation {
    let outcome = evaluate(principal, action, descriptor);

    let message = match outcome {
        Ok(Scope::Global) => format!("{} may {} in any school", principal.role, action),
        Ok(scope) => format!(
            "{} may {} within {} scope",
            principal.role,
            action,
            match scope {
                Scope::Owner => "ownership",
                Scope::Enrolled => "enrollment",
                _ => "school",
            }
        ),
        Err(reason) => denial_message(principal, action, descriptor, reason),
    };

    AuthorizationExplanation {
        action,
        resource_type: descriptor.resource_type,
        decision: Decision::from(outcome),
        scope: outcome.ok(),
        message,
        principal: PrincipalState {
            principal_id: principal.id,
            role: principal.role,
            tenant_id: principal.tenant_id,
        },
    }
}

/// Human-readable denial text for `reason`.
pub fn denial_message(
    principal: &Principal,
    action: Action,
    descriptor: &ResourceDescriptor,
    reason: DenialReason,
) -> String {
    match reason {
        DenialReason::TenantRequired => format!(
            "{} accounts must belong to a school before they can {}",
            principal.role, action
        ),
        DenialReason::RoleNotPermitted => {
            format!("{} is not allowed to {}", principal.role, action)
        }
        DenialReason::TenantMismatch => {
            format!("This {} belongs to a different school", descriptor.resource_type)
        }
        DenialReason::NotOwner => format!(
            "You can only {} your own {} records",
            action,
            descriptor.resource_type
        ),
        DenialReason::SelfActionForbidden => {
            "You cannot deactivate or change the role of your own account".to_string()
        }
        DenialReason::ProtectedPrincipal => {
            "Super administrator accounts are protected from this change".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn school() -> TenantId {
        TenantId::new()
    }

    #[test]
    fn missing_tenant_fails_closed_before_role_check() {
        let p = Principal::new(UserId::new(), Role::Student, None);
        // Students cannot read audit logs either, but the tenant check comes first.
        let d = ResourceDescriptor::new(ResourceType::AuditLog);
        assert_eq!(
            authorize(&p, Action::ReadAuditLog, &d),
            Decision::Deny(DenialReason::TenantRequired)
        );
    }

    #[test]
    fn student_cannot_call_teacher_actions() {
        let t = school();
        let p = Principal::member(UserId::new(), Role::Student, t);
        let d = ResourceDescriptor::new(ResourceType::Homework)
            .in_tenant(t)
            .owned_by(p.id);
        assert_eq!(
            authorize(&p, Action::CreateHomework, &d),
            Decision::Deny(DenialReason::RoleNotPermitted)
        );
    }

    #[test]
    fn school_admin_is_bound_to_own_school() {
        let p = Principal::member(UserId::new(), Role::SchoolAdmin, school());
        let other = ResourceDescriptor::new(ResourceType::Subject).in_tenant(school());
        assert_eq!(
            authorize(&p, Action::UpdateSubject, &other),
            Decision::Deny(DenialReason::TenantMismatch)
        );

        let own = ResourceDescriptor::new(ResourceType::Subject).with_tenant(p.tenant_id);
        assert!(authorize(&p, Action::UpdateSubject, &own).is_allowed());
    }

    #[test]
    fn resource_without_tenant_is_a_mismatch_for_tenant_scoped_roles() {
        let p = Principal::member(UserId::new(), Role::SchoolAdmin, school());
        let d = ResourceDescriptor::new(ResourceType::Vehicle);
        assert_eq!(
            authorize(&p, Action::ReadVehicle, &d),
            Decision::Deny(DenialReason::TenantMismatch)
        );
    }

    #[test]
    fn teacher_cannot_touch_another_teachers_homework() {
        let t = school();
        let p = Principal::member(UserId::new(), Role::Teacher, t);
        let d = ResourceDescriptor::new(ResourceType::Homework)
            .in_tenant(t)
            .owned_by(UserId::new());

        for action in [
            Action::ReadHomework,
            Action::UpdateHomework,
            Action::DeleteHomework,
        ] {
            assert_eq!(
                authorize(&p, action, &d),
                Decision::Deny(DenialReason::NotOwner)
            );
        }

        let mine = d.owned_by(p.id);
        assert!(authorize(&p, Action::UpdateHomework, &mine).is_allowed());
    }

    #[test]
    fn student_reads_only_homework_of_own_class() {
        let t = school();
        let p = Principal::member(UserId::new(), Role::Student, t);
        let teacher = UserId::new();

        let other_class = ResourceDescriptor::new(ResourceType::Homework)
            .in_tenant(t)
            .owned_by(teacher)
            .for_subject(UserId::new());
        assert_eq!(
            authorize(&p, Action::ReadHomework, &other_class),
            Decision::Deny(DenialReason::NotOwner)
        );

        let own_class = other_class.for_subject(p.id);
        assert!(authorize(&p, Action::ReadHomework, &own_class).is_allowed());
    }

    #[test]
    fn super_admin_skips_tenant_and_ownership() {
        let p = Principal::super_admin(UserId::new());
        let d = ResourceDescriptor::user(UserId::new(), Some(school()), Role::Teacher);
        assert!(authorize(&p, Action::DeactivateUser, &d).is_allowed());
        let audit = ResourceDescriptor::new(ResourceType::AuditLog);
        assert!(authorize(&p, Action::ReadAuditLog, &audit).is_allowed());
    }

    #[test]
    fn super_admin_has_no_homework_rights() {
        let p = Principal::super_admin(UserId::new());
        let d = ResourceDescriptor::new(ResourceType::Homework).owned_by(p.id);
        assert_eq!(
            authorize(&p, Action::ReadHomework, &d),
            Decision::Deny(DenialReason::RoleNotPermitted)
        );
    }

    #[test]
    fn nobody_deactivates_themselves() {
        let t = school();
        let admin = Principal::member(UserId::new(), Role::SchoolAdmin, t);
        let d = ResourceDescriptor::user(admin.id, Some(t), Role::SchoolAdmin);
        assert_eq!(
            authorize(&admin, Action::DeactivateUser, &d),
            Decision::Deny(DenialReason::SelfActionForbidden)
        );
        assert_eq!(
            authorize(&admin, Action::ChangeUserRole, &d.requesting_role(Role::Teacher)),
            Decision::Deny(DenialReason::SelfActionForbidden)
        );

        let root = Principal::super_admin(UserId::new());
        let d = ResourceDescriptor::user(root.id, None, Role::SuperAdmin);
        assert_eq!(
            authorize(&root, Action::DeactivateUser, &d),
            Decision::Deny(DenialReason::SelfActionForbidden)
        );
    }

    #[test]
    fn super_admin_records_cannot_be_deactivated_or_demoted() {
        let root = Principal::super_admin(UserId::new());
        let other_root = ResourceDescriptor::user(UserId::new(), None, Role::SuperAdmin);

        assert_eq!(
            authorize(&root, Action::DeactivateUser, &other_root),
            Decision::Deny(DenialReason::ProtectedPrincipal)
        );
        assert_eq!(
            authorize(
                &root,
                Action::ChangeUserRole,
                &other_root.requesting_role(Role::SchoolAdmin)
            ),
            Decision::Deny(DenialReason::ProtectedPrincipal)
        );
    }

    #[test]
    fn school_admin_cannot_touch_super_admin_in_own_school() {
        let t = school();
        let admin = Principal::member(UserId::new(), Role::SchoolAdmin, t);
        let root_record = ResourceDescriptor::user(UserId::new(), Some(t), Role::SuperAdmin);

        for action in [
            Action::DeactivateUser,
            Action::ChangeUserRole,
            Action::UpdateUser,
        ] {
            assert_eq!(
                authorize(&admin, action, &root_record),
                Decision::Deny(DenialReason::ProtectedPrincipal),
                "{action}"
            );
        }
    }

    #[test]
    fn only_super_admin_creates_or_promotes_super_admins() {
        let t = school();
        let admin = Principal::member(UserId::new(), Role::SchoolAdmin, t);
        let new_root = ResourceDescriptor::new(ResourceType::User)
            .in_tenant(t)
            .requesting_role(Role::SuperAdmin);
        assert_eq!(
            authorize(&admin, Action::CreateUser, &new_root),
            Decision::Deny(DenialReason::ProtectedPrincipal)
        );

        let promote = ResourceDescriptor::user(UserId::new(), Some(t), Role::Teacher)
            .requesting_role(Role::SuperAdmin);
        assert_eq!(
            authorize(&admin, Action::ChangeUserRole, &promote),
            Decision::Deny(DenialReason::ProtectedPrincipal)
        );

        let root = Principal::super_admin(UserId::new());
        assert!(authorize(&root, Action::CreateUser, &new_root).is_allowed());
    }

    #[test]
    fn school_admin_may_demote_a_teacher() {
        let t = school();
        let admin = Principal::member(UserId::new(), Role::SchoolAdmin, t);
        let d = ResourceDescriptor::user(UserId::new(), Some(t), Role::Teacher)
            .requesting_role(Role::Student);
        assert!(authorize(&admin, Action::ChangeUserRole, &d).is_allowed());
    }

    #[test]
    fn explanation_carries_human_readable_reason() {
        let t = school();
        let p = Principal::member(UserId::new(), Role::Teacher, t);
        let d = ResourceDescriptor::new(ResourceType::Homework)
            .in_tenant(t)
            .owned_by(UserId::new());

        let e = explain(&p, Action::DeleteHomework, &d);
        assert_eq!(e.decision, Decision::Deny(DenialReason::NotOwner));
        assert!(e.scope.is_none());
        assert!(e.message.contains("your own homework"));

        let e = explain(&p, Action::DeleteHomework, &d.owned_by(p.id));
        assert_eq!(e.decision, Decision::Allow);
        assert_eq!(e.scope, Some(Scope::Owner));
    }

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    fn action_strategy() -> impl Strategy<Value = Action> {
        prop::sample::select(policy::RULES.iter().map(|r| r.action).collect::<Vec<_>>())
    }

    proptest! {
        /// Property: without a school, every non-SUPER_ADMIN call is TenantRequired.
        #[test]
        fn fail_closed_without_tenant(
            role in role_strategy().prop_filter("tenant-bound roles", |r| !r.is_super_admin()),
            action in action_strategy(),
            with_tenant in any::<bool>(),
        ) {
            let p = Principal::new(UserId::new(), role, None);
            let mut d = ResourceDescriptor::new(action.resource_type())
                .owned_by(p.id)
                .for_subject(p.id);
            if with_tenant {
                d = d.in_tenant(TenantId::new());
            }
            prop_assert_eq!(
                authorize(&p, action, &d),
                Decision::Deny(DenialReason::TenantRequired)
            );
        }

        /// Property: a lifecycle action targeting oneself is never allowed.
        #[test]
        fn self_deactivation_never_allowed(role in role_strategy()) {
            let t = TenantId::new();
            let tenant = if role.is_super_admin() { None } else { Some(t) };
            let p = Principal::new(UserId::new(), role, tenant);
            let d = ResourceDescriptor::user(p.id, p.tenant_id, role);
            prop_assert!(!authorize(&p, Action::DeactivateUser, &d).is_allowed());
        }
    }
}
