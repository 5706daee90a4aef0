//! Service wiring: store, directory, recorder and aggregator.

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use campus_audit::{AuditAggregator, AuditRecorder, AuditStore, AuditStoreError};
use campus_core::{Clock, SystemClock};
use campus_infra::audit_store::{InMemoryAuditStore, PostgresAuditStore};
use campus_infra::directory::InMemoryUserDirectory;

use crate::config::ApiConfig;

pub type SharedStore = Arc<dyn AuditStore>;
pub type SharedDirectory = Arc<InMemoryUserDirectory>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to connect to postgres: {0}")]
    Connect(#[from] sqlx::Error),

    #[error(transparent)]
    Store(#[from] AuditStoreError),
}

pub struct AppServices {
    pub store: SharedStore,
    pub recorder: AuditRecorder<SharedStore>,
    pub aggregator: AuditAggregator<SharedStore>,
}

impl AppServices {
    /// Wire against the store selected by `config.database_url`.
    pub async fn from_config(config: &ApiConfig) -> Result<Self, ServiceError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        match config.database_url.as_deref() {
            Some(url) => Self::postgres(url, clock).await,
            None => {
                info!("DATABASE_URL not set; using in-memory audit store");
                Ok(Self::in_memory(Arc::new(InMemoryUserDirectory::new()), clock))
            }
        }
    }

    /// In-memory store whose actors and user lookups come from `directory`.
    pub fn in_memory(directory: SharedDirectory, clock: Arc<dyn Clock>) -> Self {
        Self::assemble(Arc::new(InMemoryAuditStore::new(directory)), clock)
    }

    /// Postgres store; actors and user lookups are read from the `users` table.
    pub async fn postgres(database_url: &str, clock: Arc<dyn Clock>) -> Result<Self, ServiceError> {
        let pool = PgPool::connect(database_url).await?;
        let store = PostgresAuditStore::new(pool);
        store.ensure_schema().await?;
        info!("connected to postgres audit store");

        Ok(Self::assemble(Arc::new(store), clock))
    }

    fn assemble(store: SharedStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            recorder: AuditRecorder::new(store.clone(), clock.clone()),
            aggregator: AuditAggregator::new(store.clone(), clock),
            store,
        }
    }
}
