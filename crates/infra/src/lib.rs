//! Infrastructure layer: audit event storage and the user directory read model.

pub mod audit_store;
pub mod directory;
