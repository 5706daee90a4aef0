use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;

use campus_audit::{
    ActorProfile, AuditEvent, AuditStore, AuditStoreError, EventOrder, EventQuery, EventSlice,
    ScopedEvent,
};
use campus_auth::{UserDirectory, UserRecord};
use campus_core::{AuditEventId, UserId};

/// In-memory append-only audit store.
///
/// Intended for tests/dev. Queries are a linear scan under a read lock that is
/// released before the call returns.
#[derive(Debug)]
pub struct InMemoryAuditStore<D> {
    events: RwLock<Vec<AuditEvent>>,
    ids: RwLock<HashSet<AuditEventId>>,
    directory: D,
}

impl<D> InMemoryAuditStore<D>
where
    D: UserDirectory,
{
    pub fn new(directory: D) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            ids: RwLock::new(HashSet::new()),
            directory,
        }
    }

    pub fn len(&self) -> usize {
        self.events.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn join(&self, event: &AuditEvent) -> ScopedEvent {
        let actor = self.directory.find(event.actor_id).map(|user| ActorProfile {
            tenant_id: user.tenant_id,
            role: user.role,
        });
        ScopedEvent {
            event: event.clone(),
            actor,
        }
    }
}

fn poisoned() -> AuditStoreError {
    AuditStoreError::Unavailable("lock poisoned".to_string())
}

#[async_trait]
impl<D> AuditStore for InMemoryAuditStore<D>
where
    D: UserDirectory,
{
    async fn append(&self, event: AuditEvent) -> Result<(), AuditStoreError> {
        let mut ids = self.ids.write().map_err(|_| poisoned())?;
        if !ids.insert(event.id) {
            return Err(AuditStoreError::InvalidRecord(format!(
                "audit event {} already exists",
                event.id
            )));
        }
        let mut events = self.events.write().map_err(|_| poisoned())?;
        events.push(event);
        Ok(())
    }

    async fn query(&self, query: &EventQuery) -> Result<EventSlice, AuditStoreError> {
        let mut matched: Vec<ScopedEvent> = {
            let events = self.events.read().map_err(|_| poisoned())?;
            events
                .iter()
                .map(|e| self.join(e))
                .filter(|scoped| query.predicate.matches(scoped))
                .collect()
        };

        match query.order {
            EventOrder::NewestFirst => matched.sort_by(|a, b| {
                (b.event.created_at, b.event.id).cmp(&(a.event.created_at, a.event.id))
            }),
            EventOrder::OldestFirst => matched.sort_by(|a, b| {
                (a.event.created_at, a.event.id).cmp(&(b.event.created_at, b.event.id))
            }),
        }

        let total = matched.len() as u64;
        let events = match query.page {
            Some(page) => {
                let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
                matched
                    .into_iter()
                    .skip(skip)
                    .take(page.limit() as usize)
                    .collect()
            }
            None => matched,
        };

        Ok(EventSlice { events, total })
    }

    async fn get(&self, id: AuditEventId) -> Result<Option<ScopedEvent>, AuditStoreError> {
        let events = self.events.read().map_err(|_| poisoned())?;
        Ok(events.iter().find(|e| e.id == id).map(|e| self.join(e)))
    }

    async fn find_user(&self, user_id: UserId) -> Result<Option<UserRecord>, AuditStoreError> {
        Ok(self.directory.find(user_id))
    }
}
