use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use campus_auth::{Predicate, UserRecord};
use campus_core::{AuditEventId, PageRequest, UserId};

use crate::event::{AuditEvent, ScopedEvent};

/// Audit store operation error.
///
/// These are infrastructure failures; callers surface them as
/// [`crate::AuditError::TransientStorage`] and decide on retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditStoreError {
    #[error("audit store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid audit record: {0}")]
    InvalidRecord(String),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum EventOrder {
    /// `createdAt` descending, id descending on ties (listings).
    #[default]
    NewestFirst,
    /// `createdAt` ascending, id ascending on ties (aggregation scans).
    OldestFirst,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub predicate: Predicate,
    pub order: EventOrder,
    /// `None` scans every matching event.
    pub page: Option<PageRequest>,
}

impl EventQuery {
    pub fn page(predicate: Predicate, page: PageRequest) -> Self {
        Self {
            predicate,
            order: EventOrder::NewestFirst,
            page: Some(page),
        }
    }

    pub fn scan(predicate: Predicate) -> Self {
        Self {
            predicate,
            order: EventOrder::OldestFirst,
            page: None,
        }
    }
}

/// Matching events (one page of them, if requested) and the total match count.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventSlice {
    pub events: Vec<ScopedEvent>,
    pub total: u64,
}

/// Append-only audit event store.
///
/// Implementations must:
/// - never update or delete a stored event
/// - join each event with its actor's directory profile on read
/// - answer [`AuditStore::find_user`] from the same source that join reads
/// - evaluate every clause of the predicate (an unsupported field matches nothing)
/// - perform one logical read or write per call, holding no lock across an await
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, event: AuditEvent) -> Result<(), AuditStoreError>;

    async fn query(&self, query: &EventQuery) -> Result<EventSlice, AuditStoreError>;

    async fn get(&self, id: AuditEventId) -> Result<Option<ScopedEvent>, AuditStoreError>;

    /// Directory record of `user_id` as the actor join currently sees it.
    async fn find_user(&self, user_id: UserId) -> Result<Option<UserRecord>, AuditStoreError>;
}

#[async_trait]
impl<S> AuditStore for Arc<S>
where
    S: AuditStore + ?Sized,
{
    async fn append(&self, event: AuditEvent) -> Result<(), AuditStoreError> {
        (**self).append(event).await
    }

    async fn query(&self, query: &EventQuery) -> Result<EventSlice, AuditStoreError> {
        (**self).query(query).await
    }

    async fn get(&self, id: AuditEventId) -> Result<Option<ScopedEvent>, AuditStoreError> {
        (**self).get(id).await
    }

    async fn find_user(&self, user_id: UserId) -> Result<Option<UserRecord>, AuditStoreError> {
        (**self).find_user(user_id).await
    }
}
