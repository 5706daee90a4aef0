use serde::{Deserialize, Serialize};

use crate::ResourceType;

/// Every action the policy engine knows about.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    ReadAuditLog,

    CreateUser,
    ReadUser,
    UpdateUser,
    ActivateUser,
    DeactivateUser,
    ChangeUserRole,

    CreateHomework,
    ReadHomework,
    UpdateHomework,
    DeleteHomework,

    CreateSubject,
    ReadSubject,
    UpdateSubject,
    DeleteSubject,

    CreateVehicle,
    ReadVehicle,
    UpdateVehicle,
    DeleteVehicle,
}

impl Action {
    pub fn resource_type(&self) -> ResourceType {
        use Action::*;
        match self {
            ReadAuditLog => ResourceType::AuditLog,
            CreateUser | ReadUser | UpdateUser | ActivateUser | DeactivateUser
            | ChangeUserRole => ResourceType::User,
            CreateHomework | ReadHomework | UpdateHomework | DeleteHomework => {
                ResourceType::Homework
            }
            CreateSubject | ReadSubject | UpdateSubject | DeleteSubject => ResourceType::Subject,
            CreateVehicle | ReadVehicle | UpdateVehicle | DeleteVehicle => ResourceType::Vehicle,
        }
    }

    /// The read action of a resource type (used for listings).
    pub fn read(resource_type: ResourceType) -> Action {
        match resource_type {
            ResourceType::AuditLog => Action::ReadAuditLog,
            ResourceType::User => Action::ReadUser,
            ResourceType::Homework => Action::ReadHomework,
            ResourceType::Subject => Action::ReadSubject,
            ResourceType::Vehicle => Action::ReadVehicle,
        }
    }

    /// Actions that take a user out of service or change what it may do.
    pub fn is_lifecycle_mutation(&self) -> bool {
        matches!(self, Action::DeactivateUser | Action::ChangeUserRole)
    }

    /// `VERB_NOUN` token recorded in the audit trail.
    pub fn audit_token(&self) -> &'static str {
        use Action::*;
        match self {
            ReadAuditLog => "READ_AUDIT_LOG",
            CreateUser => "CREATE_USER",
            ReadUser => "READ_USER",
            UpdateUser => "UPDATE_USER",
            ActivateUser => "ACTIVATE_USER",
            DeactivateUser => "DEACTIVATE_USER",
            ChangeUserRole => "CHANGE_USER_ROLE",
            CreateHomework => "CREATE_HOMEWORK",
            ReadHomework => "READ_HOMEWORK",
            UpdateHomework => "UPDATE_HOMEWORK",
            DeleteHomework => "DELETE_HOMEWORK",
            CreateSubject => "CREATE_SUBJECT",
            ReadSubject => "READ_SUBJECT",
            UpdateSubject => "UPDATE_SUBJECT",
            DeleteSubject => "DELETE_SUBJECT",
            CreateVehicle => "CREATE_VEHICLE",
            ReadVehicle => "READ_VEHICLE",
            UpdateVehicle => "UPDATE_VEHICLE",
            DeleteVehicle => "DELETE_VEHICLE",
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.audit_token())
    }
}
