use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument};

use campus_auth::{
    Action, DenialReason, Predicate, Principal, ResourceDescriptor, ResourceType, ScopeError,
    ScopeFilters, UserDirectory, UserRecord, authorize, build_predicate,
};
use campus_core::{AuditEventId, Clock, Page, PageRequest, UserId};

use crate::error::AuditError;
use crate::event::AuditEvent;
use crate::stats::{AuditStatistics, UserSummary};
use crate::store::{AuditStore, EventQuery};

/// Read side of the audit trail. Every call is scoped to the principal.
///
/// User lookups go through the store, so a `userId` filter is checked against
/// the same directory data the store joins events with.
pub struct AuditAggregator<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S> AuditAggregator<S>
where
    S: AuditStore,
{
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// One page of the events the principal may see, newest first.
    #[instrument(
        skip(self, principal, filters),
        fields(
            principal_id = %principal.id,
            role = %principal.role,
            page = page.page(),
            limit = page.limit(),
            user_filter = ?filters.user_id,
        ),
        err
    )]
    pub async fn list(
        &self,
        principal: &Principal,
        filters: &ScopeFilters,
        page: PageRequest,
    ) -> Result<Page<AuditEvent>, AuditError> {
        let named = match filters.user_id {
            Some(user_id) => self.store.find_user(user_id).await?,
            None => None,
        };
        let predicate = self.scoped(principal, filters, named)?;
        let slice = self.store.query(&EventQuery::page(predicate, page)).await?;

        Ok(Page::new(
            slice.events.into_iter().map(|e| e.event).collect(),
            page,
            slice.total,
        ))
    }

    /// A single event the principal may see.
    #[instrument(
        skip(self, principal),
        fields(principal_id = %principal.id, role = %principal.role),
        err
    )]
    pub async fn get_one(
        &self,
        id: AuditEventId,
        principal: &Principal,
    ) -> Result<AuditEvent, AuditError> {
        // Role and tenant presence are checked before existence is revealed.
        self.scoped(principal, &ScopeFilters::default(), None)?;

        let scoped = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| AuditError::not_found("audit_log", id))?;

        // Actors missing from the directory have no school; only global scope sees them.
        let actor_tenant = scoped.actor.and_then(|a| a.tenant_id);
        let descriptor = ResourceDescriptor::new(ResourceType::AuditLog).with_tenant(actor_tenant);
        self.authorized(principal, &descriptor)?;

        Ok(scoped.event)
    }

    /// Activity summary of one user.
    #[instrument(
        skip(self, principal),
        fields(principal_id = %principal.id, role = %principal.role),
        err
    )]
    pub async fn user_summary(
        &self,
        user_id: UserId,
        principal: &Principal,
    ) -> Result<UserSummary, AuditError> {
        self.scoped(principal, &ScopeFilters::default(), None)?;

        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AuditError::not_found("user", user_id))?;
        let descriptor =
            ResourceDescriptor::new(ResourceType::AuditLog).with_tenant(user.tenant_id);
        self.authorized(principal, &descriptor)?;

        let predicate = self.scoped(principal, &ScopeFilters::for_user(user_id), Some(user))?;
        let slice = self.store.query(&EventQuery::scan(predicate)).await?;

        Ok(UserSummary::from_events(
            user_id,
            slice.events.iter().map(|e| &e.event),
            self.clock.now(),
        ))
    }

    /// Statistics over every event the principal may see within the date range.
    #[instrument(
        skip(self, principal),
        fields(principal_id = %principal.id, role = %principal.role),
        err
    )]
    pub async fn global_statistics(
        &self,
        principal: &Principal,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<AuditStatistics, AuditError> {
        let predicate =
            self.scoped(principal, &ScopeFilters::between(start_date, end_date), None)?;
        let slice = self.store.query(&EventQuery::scan(predicate)).await?;

        Ok(AuditStatistics::from_scan(&slice.events))
    }

    /// `named` is the store's record of the user in `filters.user_id`, if any.
    fn scoped(
        &self,
        principal: &Principal,
        filters: &ScopeFilters,
        named: Option<UserRecord>,
    ) -> Result<Predicate, AuditError> {
        let directory = NamedUser(named);
        build_predicate(principal, ResourceType::AuditLog, filters, &directory).map_err(|err| {
            if let ScopeError::Denied(reason) = &err {
                log_denial(principal, *reason);
            }
            err.into()
        })
    }

    fn authorized(
        &self,
        principal: &Principal,
        descriptor: &ResourceDescriptor,
    ) -> Result<(), AuditError> {
        authorize(principal, Action::ReadAuditLog, descriptor)
            .into_result()
            .map_err(|reason| {
                log_denial(principal, reason);
                AuditError::AuthorizationDenied(reason)
            })
    }
}

/// Directory view holding the one user a request names.
struct NamedUser(Option<UserRecord>);

impl UserDirectory for NamedUser {
    fn find(&self, user_id: UserId) -> Option<UserRecord> {
        self.0.as_ref().filter(|u| u.id == user_id).cloned()
    }
}

fn log_denial(principal: &Principal, reason: DenialReason) {
    info!(
        principal_id = %principal.id,
        role = %principal.role,
        reason = reason.as_str(),
        "audit read denied"
    );
}
