//! `campus-auth`: pure authorization boundary (zero-trust, fail closed).
//!
//! This crate is intentionally decoupled from HTTP and storage: the policy
//! engine and the scoped query builder never perform IO.

pub mod action;
pub mod authorize;
pub mod claims;
pub mod directory;
pub mod jwt;
pub mod policy;
pub mod principal;
pub mod resource;
pub mod roles;
pub mod scope;

pub use action::Action;
pub use authorize::{
    AuthorizationExplanation, Decision, DenialReason, authorize, denial_message, explain,
};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use directory::{UserDirectory, UserRecord};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
pub use policy::{Grant, RoleDefinition, Rule, Scope, role_definitions};
pub use principal::Principal;
pub use resource::{ResourceDescriptor, ResourceType};
pub use roles::Role;
pub use scope::{
    Clause, Field, FieldSource, Operator, Predicate, ScopeError, ScopeFilters, Value,
    build_predicate,
};
