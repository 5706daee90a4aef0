//! `campus-audit`: append-only audit trail and its analytics.
//!
//! - [`AuditRecorder`] appends immutable [`AuditEvent`]s (there is no update or delete).
//! - [`AuditAggregator`] answers scoped listings, lookups, per-user summaries
//!   and global statistics, recomputed from the event set on every call.
//!
//! Storage is behind the [`AuditStore`] trait; implementations live in `campus-infra`.

pub mod aggregator;
pub mod error;
pub mod event;
pub mod recorder;
pub mod stats;
pub mod store;

pub use aggregator::AuditAggregator;
pub use error::AuditError;
pub use event::{ActorProfile, AuditEvent, ScopedEvent};
pub use recorder::AuditRecorder;
pub use stats::{
    ActorActivity, AuditStatistics, Breakdowns, DailyCount, UserSummary, action_prefix,
};
pub use store::{AuditStore, AuditStoreError, EventOrder, EventQuery, EventSlice};
