//! `campus-core`: shared building blocks for the campus workspace.
//!
//! This crate contains **pure** primitives (no infrastructure concerns):
//! identifiers, the domain error model, pagination and the clock seam.

pub mod clock;
pub mod error;
pub mod id;
pub mod pagination;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use id::{AuditEventId, TenantId, UserId};
pub use pagination::{Page, PageMeta, PageRequest, PageWindow, paginate};
