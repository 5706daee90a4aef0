//! Postgres-backed audit store.
//!
//! Events live in `audit_events`; the actor's school and role come from a
//! `LEFT JOIN` onto `users`, so an actor missing from `users` yields an event
//! with no actor profile (and therefore no tenant). `find_user` reads the same
//! table, so user filters and the join never disagree.
//!
//! ## Predicate translation
//!
//! Each predicate clause becomes one `AND`ed SQL condition with bound
//! parameters. Clauses on fields audit events do not carry (`owner_id`,
//! `subject_user_id`) or with a value of the wrong type become `FALSE`.
//!
//! ## Error mapping
//!
//! | SQLx error | AuditStoreError |
//! |------------|-----------------|
//! | Database `23505` (unique violation) | `InvalidRecord` |
//! | Database (other) | `Unavailable` |
//! | PoolClosed / Io / Tls / PoolTimedOut | `Unavailable` |
//! | Decode / ColumnNotFound | `InvalidRecord` |

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row};
use tracing::{Span, instrument};
use uuid::Uuid;

use campus_audit::{
    ActorProfile, AuditEvent, AuditStore, AuditStoreError, EventOrder, EventQuery, EventSlice,
    ScopedEvent,
};
use campus_auth::{Clause, Field, Operator, Predicate, Role, UserRecord, Value};
use campus_core::{AuditEventId, TenantId, UserId};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id          UUID PRIMARY KEY,
        tenant_id   UUID NULL,
        role        TEXT NOT NULL,
        email       TEXT NOT NULL,
        active      BOOLEAN NOT NULL DEFAULT TRUE
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS users_email_key ON users (lower(email))",
    r#"
    CREATE TABLE IF NOT EXISTS audit_events (
        id          UUID PRIMARY KEY,
        actor_id    UUID NOT NULL,
        action      TEXT NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL,
        metadata    JSONB NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS audit_events_created_at_idx
        ON audit_events (created_at DESC, id DESC)
    "#,
    "CREATE INDEX IF NOT EXISTS audit_events_actor_id_idx ON audit_events (actor_id)",
];

const SELECT_SCOPED: &str = r#"
    SELECT
        a.id,
        a.actor_id,
        a.action,
        a.created_at,
        a.metadata,
        u.tenant_id AS actor_tenant_id,
        u.role AS actor_role
    FROM audit_events a
    LEFT JOIN users u ON u.id = a.actor_id
"#;

const COUNT_SCOPED: &str = r#"
    SELECT COUNT(*) AS total
    FROM audit_events a
    LEFT JOIN users u ON u.id = a.actor_id
"#;

/// Postgres-backed append-only audit store.
///
/// `Send + Sync`; all operations go through the SQLx connection pool.
#[derive(Debug, Clone)]
pub struct PostgresAuditStore {
    pool: Arc<PgPool>,
}

impl PostgresAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the `users` and `audit_events` tables and their indexes if absent.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), AuditStoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl AuditStore for PostgresAuditStore {
    #[instrument(
        skip(self, event),
        fields(operation = "append", event_id = %event.id, action = %event.action),
        err
    )]
    async fn append(&self, event: AuditEvent) -> Result<(), AuditStoreError> {
        sqlx::query(
            r#"
            INSERT INTO audit_events (id, actor_id, action, created_at, metadata)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(event.actor_id.as_uuid())
        .bind(&event.action)
        .bind(event.created_at)
        .bind(&event.metadata)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("append", e))?;
        Ok(())
    }

    #[instrument(
        skip(self, query),
        fields(operation = "query", clauses = query.predicate.clauses().len(), row_count, total),
        err
    )]
    async fn query(&self, query: &EventQuery) -> Result<EventSlice, AuditStoreError> {
        let mut count = QueryBuilder::<Postgres>::new(COUNT_SCOPED);
        push_predicate(&mut count, &query.predicate);
        let total: i64 = count
            .build()
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_events", e))?
            .try_get("total")
            .map_err(|e| map_sqlx_error("count_events", e))?;

        let mut select = select_events(query);
        let rows = select
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("query_events", e))?;

        let events = rows
            .iter()
            .map(scoped_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let span = Span::current();
        span.record("row_count", events.len());
        span.record("total", total);

        Ok(EventSlice {
            events,
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    #[instrument(skip(self), fields(operation = "get", event_id = %id), err)]
    async fn get(&self, id: AuditEventId) -> Result<Option<ScopedEvent>, AuditStoreError> {
        let mut select = QueryBuilder::<Postgres>::new(SELECT_SCOPED);
        select.push(" WHERE a.id = ").push_bind(*id.as_uuid());

        let row = select
            .build()
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_event", e))?;

        row.as_ref().map(scoped_from_row).transpose()
    }

    #[instrument(skip(self), fields(operation = "find_user", user_id = %user_id), err)]
    async fn find_user(&self, user_id: UserId) -> Result<Option<UserRecord>, AuditStoreError> {
        let row = sqlx::query("SELECT id, tenant_id, role, email, active FROM users WHERE id = $1")
            .bind(*user_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user", e))?;

        row.as_ref()
            .map(|row| {
                UserRow::from_row(row)
                    .map_err(|e| map_sqlx_error("find_user", e))
                    .and_then(UserRecord::try_from)
            })
            .transpose()
    }
}

fn select_events(query: &EventQuery) -> QueryBuilder<'static, Postgres> {
    let mut select = QueryBuilder::<Postgres>::new(SELECT_SCOPED);
    push_predicate(&mut select, &query.predicate);
    select.push(match query.order {
        EventOrder::NewestFirst => " ORDER BY a.created_at DESC, a.id DESC",
        EventOrder::OldestFirst => " ORDER BY a.created_at ASC, a.id ASC",
    });
    if let Some(page) = query.page {
        select
            .push(" LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
    }
    select
}

fn push_predicate(builder: &mut QueryBuilder<'static, Postgres>, predicate: &Predicate) {
    builder.push(" WHERE TRUE");
    for clause in predicate.clauses() {
        builder.push(" AND ");
        push_clause(builder, clause);
    }
}

fn push_clause(builder: &mut QueryBuilder<'static, Postgres>, clause: &Clause) {
    let column = match (clause.field, &clause.value) {
        (Field::TenantId, Value::Tenant(_)) => "u.tenant_id",
        (Field::UserId, Value::User(_)) => "a.actor_id",
        (Field::Action, Value::Text(_)) => "a.action",
        (Field::CreatedAt, Value::Timestamp(_)) => "a.created_at",
        (Field::ResourceId, Value::Id(_)) => "a.id",
        _ => {
            builder.push("FALSE");
            return;
        }
    };

    match (clause.op, &clause.value) {
        (Operator::ContainsIgnoreCase, Value::Text(needle)) => {
            builder
                .push(column)
                .push(" ILIKE ")
                .push_bind(format!("%{}%", escape_like(needle)));
        }
        (Operator::ContainsIgnoreCase, _) => {
            builder.push("FALSE");
        }
        (op, value) => {
            builder.push(column).push(match op {
                Operator::Gte => " >= ",
                Operator::Lte => " <= ",
                _ => " = ",
            });
            push_value(builder, value);
        }
    }
}

fn push_value(builder: &mut QueryBuilder<'static, Postgres>, value: &Value) {
    match value {
        Value::Tenant(t) => builder.push_bind(*t.as_uuid()),
        Value::User(u) => builder.push_bind(*u.as_uuid()),
        Value::Text(s) => builder.push_bind(s.clone()),
        Value::Timestamp(ts) => builder.push_bind(*ts),
        Value::Id(id) => builder.push_bind(*id),
    };
}

/// Escape `LIKE` metacharacters so the needle matches literally.
fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> AuditStoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => AuditStoreError::InvalidRecord(msg),
                _ => AuditStoreError::Unavailable(msg),
            }
        }
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => {
            AuditStoreError::InvalidRecord(format!("{} in {}", err, operation))
        }
        _ => AuditStoreError::Unavailable(format!("sqlx error in {}: {}", operation, err)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct ScopedEventRow {
    id: Uuid,
    actor_id: Uuid,
    action: String,
    created_at: DateTime<Utc>,
    metadata: Option<serde_json::Value>,
    actor_tenant_id: Option<Uuid>,
    actor_role: Option<String>,
}

impl<'r> FromRow<'r, PgRow> for ScopedEventRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ScopedEventRow {
            id: row.try_get("id")?,
            actor_id: row.try_get("actor_id")?,
            action: row.try_get("action")?,
            created_at: row.try_get("created_at")?,
            metadata: row.try_get("metadata")?,
            actor_tenant_id: row.try_get("actor_tenant_id")?,
            actor_role: row.try_get("actor_role")?,
        })
    }
}

impl TryFrom<ScopedEventRow> for ScopedEvent {
    type Error = AuditStoreError;

    fn try_from(row: ScopedEventRow) -> Result<Self, Self::Error> {
        let actor = row
            .actor_role
            .as_deref()
            .map(|role| {
                Ok::<_, AuditStoreError>(ActorProfile {
                    tenant_id: row.actor_tenant_id.map(TenantId::from_uuid),
                    role: parse_role(role)?,
                })
            })
            .transpose()?;

        Ok(ScopedEvent {
            event: AuditEvent {
                id: AuditEventId::from_uuid(row.id),
                actor_id: UserId::from_uuid(row.actor_id),
                action: row.action,
                created_at: row.created_at,
                metadata: row.metadata,
            },
            actor,
        })
    }
}

fn scoped_from_row(row: &PgRow) -> Result<ScopedEvent, AuditStoreError> {
    ScopedEventRow::from_row(row)
        .map_err(|e| map_sqlx_error("decode_event", e))
        .and_then(ScopedEvent::try_from)
}

#[derive(Debug)]
struct UserRow {
    id: Uuid,
    tenant_id: Option<Uuid>,
    role: String,
    email: String,
    active: bool,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            role: row.try_get("role")?,
            email: row.try_get("email")?,
            active: row.try_get("active")?,
        })
    }
}

impl TryFrom<UserRow> for UserRecord {
    type Error = AuditStoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(UserRecord {
            id: UserId::from_uuid(row.id),
            tenant_id: row.tenant_id.map(TenantId::from_uuid),
            role: parse_role(&row.role)?,
            email: row.email,
            active: row.active,
        })
    }
}

fn parse_role(raw: &str) -> Result<Role, AuditStoreError> {
    Role::from_str(raw).map_err(|_| AuditStoreError::InvalidRecord(format!("unknown role '{raw}'")))
}
