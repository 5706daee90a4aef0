//! User directory implementations.
//!
//! The in-memory directory backs [`crate::audit_store::InMemoryAuditStore`],
//! which answers both actor joins and user lookups from it. The Postgres store
//! reads the `users` table directly instead.

pub mod in_memory;

pub use in_memory::{DirectoryError, InMemoryUserDirectory};
