//! Audit event stores.
//!
//! Both implementations join each event with its actor's directory record at
//! read time, so tenant scoping follows the actor's current school.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryAuditStore;
pub use postgres::PostgresAuditStore;
